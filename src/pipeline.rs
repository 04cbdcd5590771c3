use rayon::prelude::*;
use crate::app::ModelParams;
use crate::error::{Error, Result};
use crate::grid::{Grid, VelocityField};
use crate::linear::{AnalyticWake, LinearPerturbations};
use crate::nonlinear::NonLinearPropagator;
use crate::physics::{Parameters, run_setup};
use crate::traits::LinearFieldSource;




/**
 * Run the full model for one configuration, taking the linear wake from the
 * analytic approximation. No files are written; configurations asking for
 * plots or saved fields are rejected before any work is done.
 */
pub fn run(model_params: &ModelParams) -> Result<VelocityField> {
    model_params.require_no_file_output()?;
    let params = run_setup(model_params)?;
    run_wakeflow(&params, &AnalyticWake::new(&params))
}

/**
 * Run the full model for one configuration, taking the linear wake from the
 * given source.
 */
pub fn run_with_source(model_params: &ModelParams, source: &dyn LinearFieldSource) -> Result<VelocityField> {
    model_params.require_no_file_output()?;
    let params = run_setup(model_params)?;
    run_wakeflow(&params, source)
}

/**
 * Run independent configurations in parallel. Results are returned in the
 * order of the configurations.
 */
pub fn run_many(models: &[ModelParams]) -> Vec<Result<VelocityField>> {
    models.par_iter().map(run).collect()
}

/**
 * Extract the linear solution in the annulus around the planet, propagate it
 * non-linearly through the rest of the disk, and combine both on the output
 * mesh.
 */
pub fn run_wakeflow(params: &Parameters, source: &dyn LinearFieldSource) -> Result<VelocityField> {
    log::info!("Extracting linear perturbations nearby planet");

    let mut grid_lin_perts = Grid::build(params)?;
    grid_lin_perts.make_empty_disk();

    let lin_perts = LinearPerturbations::cut_annulus_segment(params, source)?;
    grid_lin_perts.add_linear_perturbations(&lin_perts, 0.0)?;

    let mut grid_nonlin_perts = Grid::build(params)?;
    grid_nonlin_perts.make_empty_disk();

    log::info!("Propagating outer and inner wakes");

    let propagator = NonLinearPropagator::new(params, &grid_nonlin_perts);
    let seed = propagator.extract_initial_condition(&lin_perts)?;
    let nonlin_perts = propagator.propagate(&seed)?;
    grid_nonlin_perts.add_non_linear_perturbations(&nonlin_perts, 0.0)?;

    log::info!("Merging linear and non-linear perturbations");

    grid_lin_perts.merge(&grid_nonlin_perts)?;
    grid_lin_perts.into_velocity_field()
}




/**
 * A model that is configured once and may then be run any number of times.
 */
#[derive(Clone, Debug, Default)]
pub struct WakeModel {
    model_params: Option<ModelParams>,
}




// ============================================================================
impl WakeModel {

    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, model_params: ModelParams) -> &mut Self {
        self.model_params = Some(model_params);
        self
    }

    pub fn model_params(&self) -> Option<&ModelParams> {
        self.model_params.as_ref()
    }

    pub fn run(&self) -> Result<VelocityField> {
        run(self.model_params.as_ref().ok_or(Error::ModelNotConfigured)?)
    }
}




// ============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::GridType;
    use crate::disks::Perturbation;

    fn model() -> ModelParams {
        ModelParams { n_r: 32, n_phi: 48, n_phi_annulus: 256, n_stations: 40, ..ModelParams::default() }
    }

    fn all_finite(field: &VelocityField) -> bool {
        field.v_r.iter().chain(field.v_phi.iter()).all(|v| v.is_finite())
    }

    struct Silent;

    impl LinearFieldSource for Silent {
        fn sample(&self, _r: f64, _phi: f64) -> Option<Perturbation> {
            Some(Perturbation::default())
        }
        fn name(&self) -> &str {
            "silent wake"
        }
    }

    #[test]
    fn output_arrays_share_the_mesh_shape() {
        let field = run(&model()).unwrap();
        assert_eq!(field.shape(), (32, 48));
        assert_eq!(field.v_r.dim(), (32, 48));
        assert_eq!(field.v_phi.dim(), (32, 48));
        assert!(all_finite(&field));
    }

    #[test]
    fn jupiter_mass_planet_gives_finite_velocities_everywhere() {
        let model = ModelParams { m_planet: 1.0, hr: 0.1, n_r: 128, n_phi: 128, ..ModelParams::default() };
        let field = run(&model).unwrap();
        assert_eq!(field.shape(), (128, 128));
        assert!(all_finite(&field));
        assert!(field.v_r.iter().any(|&v| v != 0.0));
        assert!(field.v_phi.iter().any(|&v| v != 0.0));
    }

    #[test]
    fn cartesian_grid_is_zero_outside_the_disk() {
        let model = ModelParams { grid_type: GridType::Cartesian, n_x: 40, n_y: 40, ..model() };
        let field = run(&model).unwrap();
        assert_eq!(field.shape(), (40, 40));
        assert!(all_finite(&field));

        for ((i, j), &v_r) in field.v_r.indexed_iter() {
            let r = field.x[[i, j]].hypot(field.y[[i, j]]);
            if r < model.r_inner || r > model.r_outer {
                assert_eq!(v_r, 0.0);
                assert_eq!(field.v_phi[[i, j]], 0.0);
            }
        }
    }

    #[test]
    fn file_output_is_a_configuration_error() {
        for model in &[
            ModelParams { save_total: true, ..model() },
            ModelParams { save_perturbations: true, ..model() },
            ModelParams { make_midplane_plots: true, ..model() },
        ] {
            assert!(matches!(run(model), Err(Error::Configuration(_))));
        }
    }

    #[test]
    fn non_finite_parameters_are_a_configuration_error() {
        for model in &[
            ModelParams { phi_planet: f64::NAN, ..model() },
            ModelParams { gamma: f64::INFINITY, ..model() },
            ModelParams { p: f64::NAN, ..model() },
        ] {
            assert!(matches!(run(model), Err(Error::Configuration(_))));
        }
    }

    #[test]
    fn unconfigured_model_cannot_run() {
        assert!(matches!(WakeModel::new().run(), Err(Error::ModelNotConfigured)));

        let massless_star = ModelParams { m_star: 0.0, ..model() };
        assert!(matches!(run(&massless_star), Err(Error::ModelNotConfigured)));
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut wake_model = WakeModel::new();
        wake_model.configure(model());
        assert_eq!(wake_model.run().unwrap(), wake_model.run().unwrap());
    }

    #[test]
    fn silent_linear_wake_gives_zero_velocities() {
        let field = run_with_source(&model(), &Silent).unwrap();
        assert!(field.v_r.iter().all(|&v| v == 0.0));
        assert!(field.v_phi.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn massless_planet_gives_zero_velocities() {
        let field = run(&ModelParams { m_planet: 0.0, ..model() }).unwrap();
        assert!(field.v_r.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn divergent_propagation_is_reported() {
        let model = ModelParams { max_substeps: 1, n_stations: 2, ..model() };
        assert!(matches!(run(&model), Err(Error::PropagationDiverged { .. })));
    }

    #[test]
    fn parallel_runs_match_sequential_ones() {
        let models = vec![model(), ModelParams { m_planet: 2.0, ..model() }, ModelParams { save_total: true, ..model() }];
        let results = run_many(&models);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], run(&models[0]));
        assert_eq!(results[1], run(&models[1]));
        assert!(matches!(results[2], Err(Error::Configuration(_))));
    }
}
