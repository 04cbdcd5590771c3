use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};
use serde_yaml::{Mapping, Value};
use crate::error::Error;




pub static DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub static VERSION: &str = env!("CARGO_PKG_VERSION");




/**
 * Either of the supported mesh geometries
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridType {
    Cylindrical,
    Cartesian,
}




/**
 * The Runge-Kutta order used when stepping the non-linear wake equation
 */
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum RungeKuttaOrder {
    #[serde(rename = "rk1")]
    RK1,
    #[serde(rename = "rk2")]
    RK2,
    #[serde(rename = "rk3")]
    RK3,
}




/**
 * User-facing model configuration. This is the mapping of configuration keys
 * to values that the setup routine resolves into `Parameters`. Every item
 * has a default, so a configuration need only name what it changes.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelParams {

    /// Mass of the central star, in solar masses
    pub m_star: f64,

    /// Mass of the planet, in Jupiter masses
    pub m_planet: f64,

    /// Orbital radius of the planet, in au
    pub r_planet: f64,

    /// Azimuth of the planet, in radians
    pub phi_planet: f64,

    /// Inner edge of the disk domain, in au
    pub r_inner: f64,

    /// Outer edge of the disk domain, in au
    pub r_outer: f64,

    /// Disk aspect ratio H/r at the planet
    pub hr: f64,

    /// Sound speed power-law index, c ~ r^-q
    pub q: f64,

    /// Surface density power-law index, Sigma ~ r^-p
    pub p: f64,

    /// Adiabatic index of the gas
    pub gamma: f64,

    /// Whether the disk rotates clockwise, as seen from above
    pub cw_rotation: bool,

    pub grid_type: GridType,

    pub n_x: usize,

    pub n_y: usize,

    pub n_r: usize,

    pub n_phi: usize,

    /// Half-width of the annulus handed from the linear to the non-linear
    /// solution, in units of the wake length scale l = 2/3 H_p
    pub x_match: f64,

    /// Number of radii sampled across the annulus
    pub n_r_annulus: usize,

    /// Number of azimuths sampled around the annulus. This is also the
    /// resolution of the non-linear solver in the wake coordinate eta.
    pub n_phi_annulus: usize,

    /// Number of radial stations at which the non-linear solution is stored,
    /// on each side of the planet
    pub n_stations: usize,

    /// Courant number of the non-linear solver
    pub cfl: f64,

    /// Generalized minmod parameter for piecewise-linear reconstruction,
    /// between 1 (most diffusive) and 2 (least diffusive)
    pub plm: f64,

    pub rk_order: RungeKuttaOrder,

    /// Maximum number of solver substeps between two radial stations before
    /// the propagation is declared to have diverged
    pub max_substeps: usize,

    pub make_midplane_plots: bool,

    pub save_total: bool,

    pub save_perturbations: bool,
}




// ============================================================================
impl Default for ModelParams {
    fn default() -> Self {
        Self {
            m_star: 1.0,
            m_planet: 1.0,
            r_planet: 1.0,
            phi_planet: 0.0,
            r_inner: 0.4,
            r_outer: 2.5,
            hr: 0.1,
            q: 0.25,
            p: 1.0,
            gamma: 1.0,
            cw_rotation: false,
            grid_type: GridType::Cylindrical,
            n_x: 256,
            n_y: 256,
            n_r: 128,
            n_phi: 128,
            x_match: 2.0,
            n_r_annulus: 33,
            n_phi_annulus: 1024,
            n_stations: 200,
            cfl: 0.5,
            plm: 1.5,
            rk_order: RungeKuttaOrder::RK2,
            max_substeps: 100_000,
            make_midplane_plots: false,
            save_total: false,
            save_perturbations: false,
        }
    }
}




// ============================================================================
impl ModelParams {

    /**
     * Parse a configuration from a YAML document. Missing keys take their
     * default values; unknown keys are an error.
     */
    pub fn from_yaml_str(document: &str) -> Result<Self, Error> {
        serde_yaml::from_str(document).map_err(invalid)
    }

    /**
     * Build a configuration from a mapping of configuration keys to values.
     */
    pub fn from_mapping(mapping: BTreeMap<String, Value>) -> Result<Self, Error> {
        let mapping: Mapping = mapping
            .into_iter()
            .map(|(key, value)| (Value::String(key), value))
            .collect();
        serde_yaml::from_value(Value::Mapping(mapping)).map_err(invalid)
    }

    /**
     * Replace a single item from a string of the form `key=value`, where the
     * value is parsed as YAML.
     */
    pub fn patch_from_key_val(&mut self, key_val: &str) -> Result<(), Error> {
        let (key, val) = match key_val.split_once('=') {
            Some((key, val)) => (key.trim(), val.trim()),
            None => return Err(Error::Configuration(format!("expected key=value, got '{}'", key_val))),
        };
        let mut document = match serde_yaml::to_value(&*self).map_err(invalid)? {
            Value::Mapping(mapping) => mapping,
            _ => unreachable!(),
        };
        let key = Value::String(key.to_string());

        if !document.contains_key(&key) {
            return Err(Error::Configuration(format!("unknown configuration key '{}'", key_val)))
        }
        document.insert(key, serde_yaml::from_str(val).map_err(invalid)?);
        *self = serde_yaml::from_value(Value::Mapping(document)).map_err(invalid)?;
        Ok(())
    }

    /**
     * Return an error naming the first enabled option that would produce a
     * plot or file. Velocity-only runs never write artifacts.
     */
    pub fn require_no_file_output(&self) -> Result<(), Error> {
        let flags = [
            ("make_midplane_plots", self.make_midplane_plots),
            ("save_total", self.save_total),
            ("save_perturbations", self.save_perturbations),
        ];
        match flags.iter().find(|(_, enabled)| *enabled) {
            Some((name, _)) => Err(Error::Configuration(format!("{} must be false when only velocity perturbations are returned", name))),
            None => Ok(()),
        }
    }
}

fn invalid(error: serde_yaml::Error) -> Error {
    Error::Configuration(error.to_string())
}
