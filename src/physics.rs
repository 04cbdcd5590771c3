use crate::app::{GridType, ModelParams, RungeKuttaOrder};
use crate::disks::{PowerLawDisk, Rotation};
use crate::error::SetupError;




/// Jupiter's mass in solar masses
pub const JUPITER_MASS: f64 = 9.547_919e-4;

/// Heliocentric gravitational constant, in m^3 s^-2
pub const GM_SUN: f64 = 1.327_124_400_18e20;

/// Astronomical unit, in m
pub const AU: f64 = 1.495_978_707e11;




/**
 * Resolution of the output mesh
 */
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GridSpec {
    Cylindrical { n_r: usize, n_phi: usize },
    Cartesian { n_x: usize, n_y: usize },
}

impl GridSpec {
    pub fn shape(&self) -> (usize, usize) {
        match *self {
            GridSpec::Cylindrical { n_r, n_phi } => (n_r, n_phi),
            GridSpec::Cartesian { n_x, n_y } => (n_x, n_y),
        }
    }
}




/**
 * Fully resolved model parameters. Lengths are in au and velocities in km/s
 * unless a method says it returns code units, in which lengths are in units
 * of the planet's orbital radius.
 */
#[derive(Clone, Debug)]
pub struct Parameters {

    /// Stellar mass, in solar masses
    pub m_star: f64,

    /// Planet mass, in solar masses
    pub m_planet: f64,

    pub r_planet: f64,

    pub r_inner: f64,

    pub r_outer: f64,

    pub disk: PowerLawDisk,

    pub grid: GridSpec,

    /// Annulus half-width in units of the wake length
    pub x_match: f64,

    pub n_r_annulus: usize,

    pub n_phi_annulus: usize,

    pub n_stations: usize,

    pub cfl: f64,

    pub plm: f64,

    pub rk_order: RungeKuttaOrder,

    pub max_substeps: usize,

    /// Thermal mass 2/3 (H_p/r_p)^3 M_star, in solar masses
    pub m_thermal: f64,

    /// Planet mass in units of the thermal mass
    pub beta: f64,

    /// Keplerian speed at the planet, in km/s
    pub velocity_unit: f64,
}




// ============================================================================
impl Parameters {

    /**
     * The wake length scale l = 2/3 H_p, in code units.
     */
    pub fn wake_length(&self) -> f64 {
        2.0 / 3.0 * self.disk.hr
    }

    /**
     * Inner and outer radius of the annulus holding the linear solution, in
     * code units.
     */
    pub fn annulus_bounds(&self) -> (f64, f64) {
        let half_width = self.x_match * self.wake_length();
        (1.0 - half_width, 1.0 + half_width)
    }

    /**
     * Inner and outer edge of the disk domain, in code units.
     */
    pub fn domain_bounds(&self) -> (f64, f64) {
        (self.r_inner / self.r_planet, self.r_outer / self.r_planet)
    }
}




/**
 * Resolve user model parameters into `Parameters`. Inconsistent geometry or
 * numerical controls are reported as `SetupError::Invalid`; derived
 * quantities that are not finite are reported as `SetupError::Arithmetic`.
 */
pub fn run_setup(model: &ModelParams) -> Result<Parameters, SetupError> {
    validate(model)?;

    let m_planet = model.m_planet * JUPITER_MASS;
    let m_thermal = 2.0 / 3.0 * model.hr.powi(3) * model.m_star;
    let beta = m_planet / m_thermal;
    let velocity_unit = (GM_SUN * model.m_star / (model.r_planet * AU)).sqrt() * 1e-3;

    positive("m_thermal", m_thermal)?;
    positive("velocity_unit", velocity_unit)?;

    if !beta.is_finite() {
        return Err(SetupError::Arithmetic("beta".to_string()))
    }

    let grid = match model.grid_type {
        GridType::Cylindrical => GridSpec::Cylindrical { n_r: model.n_r, n_phi: model.n_phi },
        GridType::Cartesian => GridSpec::Cartesian { n_x: model.n_x, n_y: model.n_y },
    };
    let rotation = if model.cw_rotation {
        Rotation::Clockwise
    } else {
        Rotation::Anticlockwise
    };
    let disk = PowerLawDisk {
        hr: model.hr,
        q: model.q,
        p: model.p,
        gamma: model.gamma,
        rotation,
        phi_planet: model.phi_planet,
    };

    log::debug!("planet mass is {:.4} thermal masses, v_K(r_p) = {:.4} km/s", beta, velocity_unit);

    Ok(Parameters {
        m_star: model.m_star,
        m_planet,
        r_planet: model.r_planet,
        r_inner: model.r_inner,
        r_outer: model.r_outer,
        disk,
        grid,
        x_match: model.x_match,
        n_r_annulus: model.n_r_annulus,
        n_phi_annulus: model.n_phi_annulus,
        n_stations: model.n_stations,
        cfl: model.cfl,
        plm: model.plm,
        rk_order: model.rk_order,
        max_substeps: model.max_substeps,
        m_thermal,
        beta,
        velocity_unit,
    })
}

fn validate(model: &ModelParams) -> Result<(), SetupError> {
    let require = |condition: bool, message: &str| {
        if condition {
            Ok(())
        } else {
            Err(SetupError::Invalid(message.to_string()))
        }
    };
    let reals = [
        ("m_star", model.m_star),
        ("m_planet", model.m_planet),
        ("r_planet", model.r_planet),
        ("phi_planet", model.phi_planet),
        ("r_inner", model.r_inner),
        ("r_outer", model.r_outer),
        ("hr", model.hr),
        ("q", model.q),
        ("p", model.p),
        ("gamma", model.gamma),
        ("x_match", model.x_match),
        ("cfl", model.cfl),
        ("plm", model.plm),
    ];
    for (name, value) in reals.iter() {
        require(value.is_finite(), &format!("{} must be finite, got {}", name, value))?;
    }
    require(model.m_star >= 0.0, "m_star must be non-negative")?;
    require(model.m_planet >= 0.0, "m_planet must be non-negative")?;
    require(model.r_inner > 0.0, "r_inner must be positive")?;
    require(model.r_inner < model.r_planet && model.r_planet < model.r_outer, "require r_inner < r_planet < r_outer")?;
    require(model.hr > 0.0, "hr must be positive")?;
    require(model.gamma >= 1.0, "gamma must be at least 1")?;
    require((model.q - 0.5).abs() > 1e-8, "q = 0.5 is a singular wake shape")?;
    require(model.x_match > 0.0, "x_match must be positive")?;
    require(model.n_r_annulus >= 2, "n_r_annulus must be at least 2")?;
    require(model.n_phi_annulus >= 8, "n_phi_annulus must be at least 8")?;
    require(model.n_stations >= 1, "n_stations must be at least 1")?;
    require(model.cfl > 0.0 && model.cfl <= 1.0, "cfl must be in (0, 1]")?;
    require(model.plm >= 1.0 && model.plm <= 2.0, "plm must be in [1, 2]")?;
    require(model.max_substeps >= 1, "max_substeps must be at least 1")?;

    match model.grid_type {
        GridType::Cylindrical => require(model.n_r >= 2 && model.n_phi >= 2, "n_r and n_phi must be at least 2")?,
        GridType::Cartesian => require(model.n_x >= 2 && model.n_y >= 2, "n_x and n_y must be at least 2")?,
    }

    let half_width = model.x_match * 2.0 / 3.0 * model.hr * model.r_planet;
    require(model.r_planet - half_width > model.r_inner, "annulus extends inside r_inner")?;
    require(model.r_planet + half_width < model.r_outer, "annulus extends outside r_outer")?;
    Ok(())
}

fn positive(name: &str, value: f64) -> Result<(), SetupError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SetupError::Arithmetic(name.to_string()))
    }
}
