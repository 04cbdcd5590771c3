use ndarray::{Array, Array1, Array2};
use ndarray_ops::interpolate2;
use crate::disks::{Perturbation, PowerLawDisk, Rotation};
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::linear::{LinearPerturbations, RADIUS_TOLERANCE};
use crate::physics::Parameters;
use crate::scheme::{BurgersSolver, max_abs};




/// Factor by which the wake amplitude may exceed its initial maximum before
/// the propagation is considered to have diverged
const AMPLITUDE_GROWTH_LIMIT: f64 = 2.0;




/**
 * Initial condition for the wake on one side of the planet: the scaled
 * amplitude chi sampled on a uniform, periodic eta mesh at the edge of the
 * linear annulus. On a reflected side the stored eta values are the negatives
 * of the physical wake coordinate, so that the wake always propagates in the
 * direction of increasing time with the same orientation.
 */
#[derive(Clone, Debug)]
pub struct WakeSeed {

    /// Radius of the annulus edge, in code units
    pub radius: f64,

    /// Eta coordinate of the first sample
    pub eta0: f64,

    pub d_eta: f64,

    pub chi: Array1<f64>,

    pub reflected: bool,
}




/**
 * Wake initial conditions at the outer and inner edges of the annulus
 */
#[derive(Clone, Debug)]
pub struct AnnulusSeed {
    pub outer: WakeSeed,
    pub inner: WakeSeed,
}




/**
 * The wake amplitude on one side of the planet, stored at a sequence of
 * radial stations running from the annulus edge to the edge of the domain.
 */
#[derive(Clone, Debug)]
pub struct WakeSolution {
    radii: Array1<f64>,
    eta0: f64,
    d_eta: f64,
    reflected: bool,
    chi: Array2<f64>,
}




/**
 * Result of propagating the wake through the disk outside the annulus
 */
#[derive(Clone, Debug)]
pub struct NonLinearPerturbations {
    disk: PowerLawDisk,
    outer: WakeSolution,
    inner: WakeSolution,
}




/**
 * Propagates the wake away from the annulus by integrating the Burgers
 * equation for chi in the wake coordinates (t, eta).
 */
pub struct NonLinearPropagator<'a> {
    params: &'a Parameters,
    r_min: f64,
    r_max: f64,
}




// ============================================================================
impl<'a> NonLinearPropagator<'a> {

    /**
     * Create a propagator that marches the wake out to the radii spanned by
     * both the grid and the disk domain.
     */
    pub fn new(params: &'a Parameters, grid: &Grid) -> Self {
        let (d0, d1) = params.domain_bounds();
        let (g0, g1) = grid.radial_extent();
        let r_min = d0.max(g0 / params.r_planet);
        let r_max = d1.min(g1 / params.r_planet);
        Self { params, r_min, r_max }
    }

    /**
     * Convert the linear solution at both edges of the annulus into initial
     * conditions for the wake amplitude. The samples are ordered by eta,
     * which at fixed radius is uniformly spaced because it is affine in the
     * azimuth.
     */
    pub fn extract_initial_condition(&self, lin: &LinearPerturbations) -> Result<AnnulusSeed> {
        let (r0, r1) = self.params.annulus_bounds();

        Ok(AnnulusSeed {
            outer: self.seed(lin, r1, false)?,
            inner: self.seed(lin, r0, true)?,
        })
    }

    fn seed(&self, lin: &LinearPerturbations, radius: f64, inner: bool) -> Result<WakeSeed> {
        let edge = if inner { lin.inner_radius() } else { lin.outer_radius() };
        let unavailable = || Error::SolutionUnavailable(format!(
            "linear solution ends at r={:.4} r_p, not at the annulus edge r={:.4} r_p", edge, radius));

        if (edge - radius).abs() >= RADIUS_TOLERANCE {
            return Err(unavailable())
        }
        let profile = lin.profile_at(edge).ok_or_else(unavailable)?;
        let radius = edge;
        let disk = &self.params.disk;
        let reflected = inner ^ (disk.rotation == Rotation::Clockwise);
        let orientation = if reflected { -1.0 } else { 1.0 };

        let mut samples: Vec<(f64, f64)> = lin
            .azimuths()
            .iter()
            .zip(profile.iter())
            .map(|(&phi, p)| (orientation * disk.eta(radius, phi), disk.chi_from_density(radius, p.density)))
            .collect();

        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(WakeSeed {
            radius,
            eta0: samples[0].0,
            d_eta: disk.eta_scale() * 2.0 * std::f64::consts::PI / samples.len() as f64,
            chi: samples.iter().map(|s| s.1).collect(),
            reflected,
        })
    }

    /**
     * March both seeds from the annulus edges to the edges of the domain.
     */
    pub fn propagate(&self, seed: &AnnulusSeed) -> Result<NonLinearPerturbations> {
        log::info!("Propagating the outer wake from r={:.3} to r={:.3} au",
            seed.outer.radius * self.params.r_planet, self.r_max * self.params.r_planet);
        let outer = self.march(&seed.outer, self.r_max)?;

        log::info!("Propagating the inner wake from r={:.3} to r={:.3} au",
            seed.inner.radius * self.params.r_planet, self.r_min * self.params.r_planet);
        let inner = self.march(&seed.inner, self.r_min)?;

        Ok(NonLinearPerturbations {
            disk: self.params.disk.clone(),
            outer,
            inner,
        })
    }

    fn march(&self, seed: &WakeSeed, r_edge: f64) -> Result<WakeSolution> {
        let params = self.params;
        let n = params.n_stations;
        let radii = Array::linspace(seed.radius, r_edge, n + 1);
        let times: Vec<f64> = radii.iter().map(|&r| params.disk.time(r)).collect();

        let solver = BurgersSolver {
            dx: seed.d_eta,
            cfl: params.cfl,
            plm: params.plm,
            rk_order: params.rk_order,
        };
        let peak = max_abs(&seed.chi);
        let mut chi = Array2::zeros((n + 1, seed.chi.len()));
        let mut u = seed.chi.clone();

        chi.row_mut(0).assign(&u);

        for k in 1..=n {
            let mut t = times[k - 1];
            let mut substeps = 0;

            while t < times[k] {
                let remaining = times[k] - t;
                let dt = solver.max_stable_time_step(&u).map_or(remaining, |dt| dt.min(remaining));

                u = solver.advance(u, dt);
                t = if dt >= remaining { times[k] } else { t + dt };
                substeps += 1;

                let diverged = |reason: String| Error::PropagationDiverged {
                    radius: radii[k] * params.r_planet,
                    reason,
                };
                if substeps > params.max_substeps {
                    return Err(diverged(format!("more than {} substeps between stations", params.max_substeps)))
                }
                if u.iter().any(|x| !x.is_finite()) {
                    return Err(diverged("wake amplitude is not finite".to_string()))
                }
                if max_abs(&u) > AMPLITUDE_GROWTH_LIMIT * peak + f64::MIN_POSITIVE {
                    return Err(diverged(format!("wake amplitude grew from {:.3e} to {:.3e}", peak, max_abs(&u))))
                }
            }
            log::debug!("station {} at r={:.4} r_p: t={:.3} max|chi|={:.4e} ({} substeps)", k, radii[k], times[k], max_abs(&u), substeps);
            chi.row_mut(k).assign(&u);
        }

        Ok(WakeSolution {
            radii,
            eta0: seed.eta0,
            d_eta: seed.d_eta,
            reflected: seed.reflected,
            chi,
        })
    }
}




// ============================================================================
impl WakeSolution {

    pub fn radii(&self) -> &Array1<f64> {
        &self.radii
    }

    pub fn chi(&self) -> &Array2<f64> {
        &self.chi
    }

    fn chi_at(&self, disk: &PowerLawDisk, r: f64, phi: f64) -> Option<f64> {
        let orientation = if self.reflected { -1.0 } else { 1.0 };
        let fi = (r - self.radii[0]) / (self.radii[1] - self.radii[0]);
        let fj = (orientation * disk.eta(r, phi) - self.eta0) / self.d_eta;
        interpolate2(&self.chi, fi, fj, true)
    }
}




// ============================================================================
impl NonLinearPerturbations {

    pub fn outer(&self) -> &WakeSolution {
        &self.outer
    }

    pub fn inner(&self) -> &WakeSolution {
        &self.inner
    }

    /**
     * Whether r lies strictly outside the annulus, where this solution
     * rather than the linear one applies.
     */
    pub fn covers(&self, r: f64) -> bool {
        r > self.outer.radii[0] || r < self.inner.radii[0]
    }

    /**
     * Interpolate the perturbations at a point between the annulus edges
     * and the domain edges, inclusive. Returns `None` at other radii.
     */
    pub fn sample(&self, r: f64, phi: f64) -> Option<Perturbation> {
        let side = if r >= self.outer.radii[0] {
            &self.outer
        } else if r <= self.inner.radii[0] {
            &self.inner
        } else {
            return None
        };
        side.chi_at(&self.disk, r, phi).map(|chi| self.disk.perturbation_from_chi(r, chi))
    }
}




// ============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::app::ModelParams;
    use crate::linear::AnalyticWake;
    use crate::physics::run_setup;

    fn model() -> ModelParams {
        ModelParams { n_phi_annulus: 256, n_stations: 40, n_r: 24, n_phi: 32, ..ModelParams::default() }
    }

    fn setup(model: &ModelParams) -> (Parameters, Grid, LinearPerturbations) {
        let params = run_setup(model).unwrap();
        let grid = Grid::build(&params).unwrap();
        let lin = LinearPerturbations::cut_annulus_segment(&params, &AnalyticWake::new(&params)).unwrap();
        (params, grid, lin)
    }

    #[test]
    fn seed_is_uniform_in_eta() {
        let (params, grid, lin) = setup(&model());
        let seed = NonLinearPropagator::new(&params, &grid).extract_initial_condition(&lin).unwrap();

        assert_eq!(seed.outer.chi.len(), 256);
        assert!(!seed.outer.reflected);
        assert!(seed.inner.reflected);
        assert_relative_eq!(seed.outer.d_eta, 15.0 * 2.0 * std::f64::consts::PI / 256.0, max_relative = 1e-12);
        assert!(max_abs(&seed.outer.chi) > 0.0);
    }

    #[test]
    fn clockwise_disks_reflect_the_outer_wake() {
        let (params, grid, lin) = setup(&ModelParams { cw_rotation: true, ..model() });
        let seed = NonLinearPropagator::new(&params, &grid).extract_initial_condition(&lin).unwrap();
        assert!(seed.outer.reflected);
        assert!(!seed.inner.reflected);
    }

    #[test]
    fn solution_is_continuous_with_the_linear_one_at_the_annulus_edges() {
        for model in &[
            model(),
            ModelParams { cw_rotation: true, ..model() },
            ModelParams { phi_planet: 2.0, ..model() },
            ModelParams { phi_planet: -3.0, cw_rotation: true, ..model() },
        ] {
            let (params, grid, lin) = setup(model);
            let propagator = NonLinearPropagator::new(&params, &grid);
            let seed = propagator.extract_initial_condition(&lin).unwrap();
            let nonlin = propagator.propagate(&seed).unwrap();

            for &r in &[lin.inner_radius(), lin.outer_radius()] {
                let profile = lin.profile_at(r).unwrap();

                for (&phi, expected) in lin.azimuths().iter().zip(profile.iter()) {
                    let actual = nonlin.sample(r, phi).unwrap();
                    assert_relative_eq!(actual.density, expected.density, epsilon = 1e-9);
                    assert_relative_eq!(actual.v_r, expected.v_r, epsilon = 1e-9);
                    assert_relative_eq!(actual.v_phi, expected.v_phi, epsilon = 1e-9);
                }
            }
        }
    }

    #[test]
    fn solution_covers_the_domain_outside_the_annulus() {
        let (params, grid, lin) = setup(&model());
        let propagator = NonLinearPropagator::new(&params, &grid);
        let nonlin = propagator.propagate(&propagator.extract_initial_condition(&lin).unwrap()).unwrap();

        assert!(nonlin.sample(0.4, 0.3).is_some());
        assert!(nonlin.sample(2.5, 0.3).is_some());
        assert!(nonlin.sample(1.0, 0.3).is_none());
        assert!(nonlin.sample(2.6, 0.3).is_none());
        assert!(nonlin.covers(2.0) && nonlin.covers(0.5));
        assert!(!nonlin.covers(1.0) && !nonlin.covers(lin.outer_radius()));
    }

    #[test]
    fn wake_amplitude_decays_with_distance() {
        let (params, grid, lin) = setup(&model());
        let propagator = NonLinearPropagator::new(&params, &grid);
        let nonlin = propagator.propagate(&propagator.extract_initial_condition(&lin).unwrap()).unwrap();

        for side in &[nonlin.outer(), nonlin.inner()] {
            let first = max_abs(&side.chi().row(0));
            let last = max_abs(&side.chi().row(side.radii().len() - 1));
            assert!(last < first);
        }
    }

    #[test]
    fn zero_seed_gives_zero_perturbations() {
        let (params, grid, lin) = setup(&model());
        let propagator = NonLinearPropagator::new(&params, &grid);
        let mut seed = propagator.extract_initial_condition(&lin).unwrap();
        seed.outer.chi.fill(0.0);
        seed.inner.chi.fill(0.0);

        let nonlin = propagator.propagate(&seed).unwrap();
        assert!(nonlin.outer().chi().iter().all(|&x| x == 0.0));
        assert!(nonlin.inner().chi().iter().all(|&x| x == 0.0));
        assert_eq!(nonlin.sample(2.0, 1.0), Some(Perturbation::default()));
    }

    #[test]
    fn too_many_substeps_is_a_divergence() {
        let (params, grid, lin) = setup(&ModelParams { max_substeps: 1, n_stations: 2, ..model() });
        let propagator = NonLinearPropagator::new(&params, &grid);
        let seed = propagator.extract_initial_condition(&lin).unwrap();
        assert!(matches!(propagator.propagate(&seed), Err(Error::PropagationDiverged { .. })));
    }

    #[test]
    fn non_finite_seed_is_a_divergence() {
        let (params, grid, lin) = setup(&model());
        let propagator = NonLinearPropagator::new(&params, &grid);
        let mut seed = propagator.extract_initial_condition(&lin).unwrap();
        seed.outer.chi[3] = f64::NAN;
        assert!(matches!(propagator.propagate(&seed), Err(Error::PropagationDiverged { .. })));
    }

    #[test]
    fn mismatched_annulus_is_unavailable() {
        let (_, _, lin) = setup(&model());

        for &x_match in &[1.5, 2.5] {
            let params = run_setup(&ModelParams { x_match, ..model() }).unwrap();
            let grid = Grid::build(&params).unwrap();
            let result = NonLinearPropagator::new(&params, &grid).extract_initial_condition(&lin);
            assert!(matches!(result, Err(Error::SolutionUnavailable(_))));
        }
    }
}
