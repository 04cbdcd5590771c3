use std::f64::consts::PI;
use ndarray::{Array, Array1, Array2, ArrayView1, Axis};
use ndarray_ops::interpolate2;
use crate::disks::{Perturbation, PowerLawDisk, wrap_angle};
use crate::error::{Error, Result};
use crate::physics::Parameters;
use crate::traits::LinearFieldSource;




/// Peak relative density of the analytic linear wake, per thermal mass, at
/// unit distance from the planet in wake lengths. This and the profile width
/// are an empirical fit, not derived: they give a single-peaked wake of the
/// amplitude and eta width seen in shearing-sheet linear solutions. Use a
/// `TabulatedWake` where the exact linear solution matters.
const LINEAR_WAKE_AMPLITUDE: f64 = 0.4;

/// Width of the analytic wake profile in the eta coordinate
const WAKE_PROFILE_WIDTH: f64 = 1.5;

/// Tolerance, in code units, on radii which are expected to coincide
pub(crate) const RADIUS_TOLERANCE: f64 = 1e-9;




/**
 * Closed-form approximation to the linear wake of a low-mass planet. The
 * density perturbation is a skewed pulse centered on the wake crest, whose
 * amplitude grows as |x|^1/2 away from the planet (conservation of wave
 * action flux) and vanishes at the planet itself. Velocities follow from the
 * density through the wave relations of the disk.
 */
#[derive(Clone, Debug)]
pub struct AnalyticWake {
    disk: PowerLawDisk,
    beta: f64,
    wake_length: f64,
}




/**
 * A linear wake tabulated on a local box around the planet, per unit planet
 * mass in thermal masses, as produced by a shearing-sheet linear simulation.
 * The first table axis is x = (r - r_p) / l, the second is y = r_p (phi -
 * phi_p) / l; both must be uniformly spaced and increasing. Azimuths beyond
 * the box carry no perturbation; radii beyond the box have no data.
 */
#[derive(Clone, Debug)]
pub struct TabulatedWake {
    x: Array1<f64>,
    y: Array1<f64>,
    table: Array2<Perturbation>,
    beta: f64,
    wake_length: f64,
    phi_planet: f64,
    rotation: f64,
}




/**
 * The linear solution restricted to an annulus around the planet's orbit,
 * sampled on a polar lattice over all azimuths. Radii are in code units.
 */
#[derive(Clone, Debug)]
pub struct LinearPerturbations {
    radii: Array1<f64>,
    phi: Array1<f64>,
    values: Array2<Perturbation>,
}




// ============================================================================
impl AnalyticWake {

    pub fn new(params: &Parameters) -> Self {
        Self {
            disk: params.disk.clone(),
            beta: params.beta,
            wake_length: params.wake_length(),
        }
    }

    fn profile(eta: f64) -> f64 {
        let s = eta / WAKE_PROFILE_WIDTH;
        (1.0 - s) * (-0.5 * s * s).exp()
    }
}

impl LinearFieldSource for AnalyticWake {

    fn sample(&self, r: f64, phi: f64) -> Option<Perturbation> {
        let x = (r - 1.0) / self.wake_length;
        let envelope = x.abs().sqrt() * (1.0 - (-x * x).exp());
        let density = self.beta * LINEAR_WAKE_AMPLITUDE * envelope * Self::profile(self.disk.eta(r, phi));
        let chi = self.disk.chi_from_density(r, density);
        Some(self.disk.perturbation_from_chi(r, chi))
    }

    fn name(&self) -> &str {
        "analytic linear wake"
    }
}




// ============================================================================
impl TabulatedWake {

    pub fn new(x: Array1<f64>, y: Array1<f64>, table: Array2<Perturbation>, params: &Parameters) -> Result<Self> {
        if table.dim() != (x.len(), y.len()) {
            return Err(Error::SolutionUnavailable(format!(
                "table of shape {:?} does not match axes of length ({}, {})", table.dim(), x.len(), y.len())))
        }
        for (axis, name) in [(&x, "x"), (&y, "y")].iter() {
            if !is_uniform(axis) {
                return Err(Error::SolutionUnavailable(format!("table axis {} must be uniform and increasing", name)))
            }
        }
        Ok(Self {
            x,
            y,
            table,
            beta: params.beta,
            wake_length: params.wake_length(),
            phi_planet: params.disk.phi_planet,
            rotation: params.disk.rotation.sign(),
        })
    }

    /**
     * Tabulate another source on a local box, per unit planet mass. This is
     * how a precomputed solution is cached for repeated model evaluations.
     */
    pub fn from_source<S: LinearFieldSource + ?Sized>(source: &S, x: Array1<f64>, y: Array1<f64>, params: &Parameters) -> Result<Self> {
        if params.beta <= 0.0 {
            return Err(Error::SolutionUnavailable("cannot tabulate a wake per unit mass of a massless planet".to_string()))
        }
        let l = params.wake_length();
        let mut table = Array2::default((x.len(), y.len()));

        for ((i, j), value) in table.indexed_iter_mut() {
            let r = 1.0 + x[i] * l;
            let phi = params.disk.phi_planet + params.disk.rotation.sign() * y[j] * l;
            let sample = source.sample(r, phi).ok_or_else(|| no_data(source.name(), r, phi))?;
            *value = Perturbation {
                v_phi: sample.v_phi * params.disk.rotation.sign(),
                ..sample
            } * (1.0 / params.beta);
        }
        Self::new(x, y, table, params)
    }
}

impl LinearFieldSource for TabulatedWake {

    fn sample(&self, r: f64, phi: f64) -> Option<Perturbation> {
        let x = (r - 1.0) / self.wake_length;
        let y = self.rotation * wrap_angle(phi - self.phi_planet) / self.wake_length;
        let fi = (x - self.x[0]) / (self.x[1] - self.x[0]);
        let fj = (y - self.y[0]) / (self.y[1] - self.y[0]);
        let n = self.y.len() as f64;

        if fj < 0.0 || fj > n - 1.0 {
            return interpolate2(&self.table, fi, 0.0, false).map(|_| Perturbation::default())
        }
        let p: Perturbation = interpolate2(&self.table, fi, fj, false)?;

        Some(Perturbation {
            v_phi: p.v_phi * self.rotation,
            ..p
        } * self.beta)
    }

    fn name(&self) -> &str {
        "tabulated linear wake"
    }
}

fn is_uniform(axis: &Array1<f64>) -> bool {
    if axis.len() < 2 {
        return false
    }
    let dx = axis[1] - axis[0];
    dx > 0.0 && axis
        .windows(2)
        .into_iter()
        .all(|w| ((w[1] - w[0]) - dx).abs() <= 1e-9 * dx)
}

fn no_data(name: &str, r: f64, phi: f64) -> Error {
    Error::SolutionUnavailable(format!("{} has no data at r={:.4} r_p, phi={:.4}", name, r, phi))
}




// ============================================================================
impl LinearPerturbations {

    /**
     * Sample the linear solution from the given source on the annulus
     * r_p (1 +/- x_match l), over the full azimuthal range.
     */
    pub fn cut_annulus_segment(params: &Parameters, source: &dyn LinearFieldSource) -> Result<Self> {
        let (r0, r1) = params.annulus_bounds();
        let nr = params.n_r_annulus;
        let np = params.n_phi_annulus;
        let radii = Array::linspace(r0, r1, nr);
        let phi = Array::from_shape_fn(np, |j| -PI + 2.0 * PI * j as f64 / np as f64);
        let mut values = Array2::default((nr, np));

        for ((i, j), value) in values.indexed_iter_mut() {
            let sample = source.sample(radii[i], phi[j]).ok_or_else(|| no_data(source.name(), radii[i], phi[j]))?;

            if !(sample.density.is_finite() && sample.v_r.is_finite() && sample.v_phi.is_finite()) {
                return Err(Error::SolutionUnavailable(format!(
                    "{} is not finite at r={:.4} r_p, phi={:.4}", source.name(), radii[i], phi[j])))
            }
            *value = sample;
        }
        log::debug!("cut annulus {:.4} < r < {:.4} from the {}", r0, r1, source.name());

        Ok(Self { radii, phi, values })
    }

    pub fn radii(&self) -> &Array1<f64> {
        &self.radii
    }

    pub fn azimuths(&self) -> &Array1<f64> {
        &self.phi
    }

    pub fn values(&self) -> &Array2<Perturbation> {
        &self.values
    }

    pub fn inner_radius(&self) -> f64 {
        self.radii[0]
    }

    pub fn outer_radius(&self) -> f64 {
        self.radii[self.radii.len() - 1]
    }

    pub fn contains(&self, r: f64) -> bool {
        r >= self.inner_radius() && r <= self.outer_radius()
    }

    /**
     * The samples at the annulus radius coinciding with r, if any.
     */
    pub fn profile_at(&self, r: f64) -> Option<ArrayView1<'_, Perturbation>> {
        self.radii
            .iter()
            .position(|&ri| (ri - r).abs() < RADIUS_TOLERANCE)
            .map(|i| self.values.index_axis(Axis(0), i))
    }

    /**
     * Interpolate the linear solution at a point inside the annulus.
     */
    pub fn sample(&self, r: f64, phi: f64) -> Option<Perturbation> {
        let dr = self.radii[1] - self.radii[0];
        let dp = 2.0 * PI / self.phi.len() as f64;
        let fi = (r - self.radii[0]) / dr;
        let fj = (wrap_angle(phi) + PI) / dp;
        interpolate2(&self.values, fi, fj, true)
    }
}
