use ndarray::{Array2, Zip};
use crate::disks::Perturbation;
use crate::error::{Error, Result};
use crate::linear::LinearPerturbations;
use crate::mesh::Mesh;
use crate::nonlinear::NonLinearPerturbations;
use crate::physics::Parameters;




/**
 * Perturbation fields on the output mesh. Velocities are in km/s.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct DiskFields {
    pub rho: Array2<f64>,
    pub v_r: Array2<f64>,
    pub v_phi: Array2<f64>,
}




/**
 * Velocity perturbations on the output mesh, along with the Cartesian
 * coordinates of each point. Lengths are in au and velocities in km/s.
 */
#[derive(Clone, Debug, PartialEq)]
pub struct VelocityField {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
    pub v_r: Array2<f64>,
    pub v_phi: Array2<f64>,
}

impl VelocityField {
    pub fn shape(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn into_tuple(self) -> (Array2<f64>, Array2<f64>, Array2<f64>, Array2<f64>) {
        (self.x, self.y, self.v_r, self.v_phi)
    }
}




/**
 * The output mesh and, once `make_empty_disk` has been called, the
 * perturbation fields accumulated on it.
 */
#[derive(Clone, Debug)]
pub struct Grid {
    mesh: Mesh,
    x: Array2<f64>,
    y: Array2<f64>,
    r: Array2<f64>,
    phi: Array2<f64>,
    r_planet: f64,
    velocity_unit: f64,
    fields: Option<DiskFields>,
}




// ============================================================================
impl Grid {

    pub fn build(params: &Parameters) -> Result<Self> {
        let mesh = Mesh::from_parameters(params)?;
        let xy = mesh.cartesian_coordinates();
        let rp = mesh.polar_coordinates();

        Ok(Self {
            x: xy.mapv(|(x, _)| x),
            y: xy.mapv(|(_, y)| y),
            r: rp.mapv(|(r, _)| r),
            phi: rp.mapv(|(_, phi)| phi),
            mesh,
            r_planet: params.r_planet,
            velocity_unit: params.velocity_unit,
            fields: None,
        })
    }

    /**
     * Initialise all perturbation fields to zero, discarding any previous
     * contents.
     */
    pub fn make_empty_disk(&mut self) {
        let shape = self.mesh.shape();
        self.fields = Some(DiskFields {
            rho: Array2::zeros(shape),
            v_r: Array2::zeros(shape),
            v_phi: Array2::zeros(shape),
        });
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn shape(&self) -> (usize, usize) {
        self.mesh.shape()
    }

    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array2<f64> {
        &self.y
    }

    pub fn fields(&self) -> Option<&DiskFields> {
        self.fields.as_ref()
    }

    /**
     * The smallest and largest distance from the star of any mesh point, in
     * au.
     */
    pub fn radial_extent(&self) -> (f64, f64) {
        self.r.fold((f64::INFINITY, 0.0_f64), |(lo, hi), &r| (lo.min(r), hi.max(r)))
    }

    /**
     * Add the linear solution at mesh points inside the annulus. The density
     * channel receives `rho_background` times the relative perturbation.
     */
    pub fn add_linear_perturbations(&mut self, lin: &LinearPerturbations, rho_background: f64) -> Result<()> {
        self.add_perturbations(rho_background, |r, phi| {
            if lin.contains(r) {
                lin.sample(r, phi)
            } else {
                None
            }
        })
    }

    /**
     * Add the non-linear solution at mesh points between the annulus and the
     * domain edges. Points outside the disk are left unchanged.
     */
    pub fn add_non_linear_perturbations(&mut self, nonlin: &NonLinearPerturbations, rho_background: f64) -> Result<()> {
        self.add_perturbations(rho_background, |r, phi| {
            if nonlin.covers(r) {
                nonlin.sample(r, phi)
            } else {
                None
            }
        })
    }

    fn add_perturbations<F>(&mut self, rho_background: f64, sample: F) -> Result<()>
        where
            F: Fn(f64, f64) -> Option<Perturbation>
    {
        let r_planet = self.r_planet;
        let velocity_unit = self.velocity_unit;
        let fields = self.fields.as_mut().ok_or_else(empty_disk_required)?;

        Zip::from(&mut fields.rho)
            .and(&mut fields.v_r)
            .and(&mut fields.v_phi)
            .and(&self.r)
            .and(&self.phi)
            .for_each(|rho, v_r, v_phi, &r, &phi| {
                if let Some(p) = sample(r / r_planet, phi) {
                    *rho += rho_background * p.density;
                    *v_r += velocity_unit * p.v_r;
                    *v_phi += velocity_unit * p.v_phi;
                }
            });
        Ok(())
    }

    /**
     * Add the fields of another grid with identical coordinates to this one.
     */
    pub fn merge(&mut self, other: &Grid) -> Result<()> {
        if self.shape() != other.shape() || self.mesh != other.mesh {
            return Err(Error::ShapeMismatch { left: self.shape(), right: other.shape() })
        }
        let theirs = other.fields.as_ref().ok_or_else(empty_disk_required)?;
        let ours = self.fields.as_mut().ok_or_else(empty_disk_required)?;

        ours.rho += &theirs.rho;
        ours.v_r += &theirs.v_r;
        ours.v_phi += &theirs.v_phi;
        Ok(())
    }

    pub fn into_velocity_field(self) -> Result<VelocityField> {
        let fields = self.fields.ok_or_else(empty_disk_required)?;

        Ok(VelocityField {
            x: self.x,
            y: self.y,
            v_r: fields.v_r,
            v_phi: fields.v_phi,
        })
    }
}

fn empty_disk_required() -> Error {
    Error::Configuration("perturbations require make_empty_disk to be called first".to_string())
}




// ============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::app::{GridType, ModelParams};
    use crate::linear::AnalyticWake;
    use crate::physics::run_setup;

    fn parameters(grid_type: GridType) -> Parameters {
        let model = ModelParams {
            grid_type,
            n_r: 24,
            n_phi: 32,
            n_x: 30,
            n_y: 30,
            n_phi_annulus: 256,
            ..ModelParams::default()
        };
        run_setup(&model).unwrap()
    }

    fn filled(params: &Parameters, value: f64) -> Grid {
        let mut grid = Grid::build(params).unwrap();
        grid.make_empty_disk();
        grid.add_perturbations(1.0, |_, _| Some(Perturbation { density: value, v_r: value, v_phi: -value })).unwrap();
        grid
    }

    #[test]
    fn new_grid_has_no_fields() {
        let params = parameters(GridType::Cylindrical);
        let mut grid = Grid::build(&params).unwrap();
        assert!(grid.fields().is_none());
        assert_eq!(grid.shape(), (24, 32));

        grid.make_empty_disk();
        assert!(grid.fields().unwrap().v_r.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn adding_before_initialisation_is_a_configuration_error() {
        let params = parameters(GridType::Cylindrical);
        let lin = LinearPerturbations::cut_annulus_segment(&params, &AnalyticWake::new(&params)).unwrap();
        let mut grid = Grid::build(&params).unwrap();
        assert!(matches!(grid.add_linear_perturbations(&lin, 0.0), Err(Error::Configuration(_))));
    }

    #[test]
    fn velocities_are_scaled_to_km_per_second() {
        let params = parameters(GridType::Cylindrical);
        let grid = filled(&params, 0.5);
        let fields = grid.fields().unwrap();
        assert_relative_eq!(fields.v_r[[3, 4]], 0.5 * params.velocity_unit, max_relative = 1e-12);
        assert_relative_eq!(fields.v_phi[[3, 4]], -0.5 * params.velocity_unit, max_relative = 1e-12);
        assert_relative_eq!(fields.rho[[3, 4]], 0.5);
    }

    #[test]
    fn linear_perturbations_are_confined_to_the_annulus() {
        let params = parameters(GridType::Cylindrical);
        let lin = LinearPerturbations::cut_annulus_segment(&params, &AnalyticWake::new(&params)).unwrap();
        let mut grid = Grid::build(&params).unwrap();
        grid.make_empty_disk();
        grid.add_linear_perturbations(&lin, 0.0).unwrap();

        let fields = grid.fields().unwrap();
        let (r0, r1) = params.annulus_bounds();

        for ((i, j), &v_r) in fields.v_r.indexed_iter() {
            let r = grid.r[[i, j]];
            if r < r0 || r > r1 {
                assert_eq!(v_r, 0.0);
            }
        }
        assert!(fields.v_r.iter().any(|&v| v != 0.0));
        assert!(fields.rho.iter().all(|&rho| rho == 0.0));
    }

    #[test]
    fn merge_adds_fields_pointwise() {
        let params = parameters(GridType::Cartesian);
        let mut a = filled(&params, 0.25);
        let b = filled(&params, 0.5);
        a.merge(&b).unwrap();

        let fields = a.fields().unwrap();
        assert!(fields.v_r.iter().all(|&v| (v - 0.75 * params.velocity_unit).abs() < 1e-12));
        assert!(fields.rho.iter().all(|&rho| (rho - 0.75).abs() < 1e-12));
    }

    #[test]
    fn merge_rejects_different_meshes() {
        let mut a = filled(&parameters(GridType::Cylindrical), 1.0);
        let b = filled(&parameters(GridType::Cartesian), 1.0);
        match a.merge(&b) {
            Err(Error::ShapeMismatch { left, right }) => {
                assert_eq!(left, (24, 32));
                assert_eq!(right, (30, 30));
            }
            other => panic!("expected a shape mismatch, got {:?}", other),
        }

        let wider = ModelParams { grid_type: GridType::Cartesian, n_x: 30, n_y: 30, r_outer: 3.0, ..ModelParams::default() };
        let mut c = filled(&parameters(GridType::Cartesian), 1.0);
        let d = filled(&run_setup(&wider).unwrap(), 1.0);
        assert!(matches!(c.merge(&d), Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn velocity_field_keeps_cartesian_coordinates() {
        let params = parameters(GridType::Cylindrical);
        let grid = filled(&params, 0.0);
        let (x, y, v_r, v_phi) = grid.into_velocity_field().unwrap().into_tuple();
        assert_eq!(x.dim(), (24, 32));
        assert_eq!(y.dim(), v_r.dim());
        assert_eq!(v_phi.dim(), (24, 32));
        assert_relative_eq!(x[[0, 0]], -0.4, max_relative = 1e-12);
        assert_relative_eq!(y[[0, 0]], 0.0, epsilon = 1e-12);
    }
}
