use std::f64::consts::PI;
use ndarray::{Array, Array1, Array2};
use ndarray_ops::cartesian_product2;
use crate::error::{Error, Result};
use crate::physics::{GridSpec, Parameters};




/**
 * The output mesh: a structured two-dimensional set of points, either a
 * polar (r, phi) lattice or a Cartesian (x, y) lattice centered on the star.
 * Lengths are in au.
 */
#[derive(Clone, Debug, PartialEq)]
pub enum Mesh {

    /// Radii uniform on [r_inner, r_outer] and azimuths uniform on [-pi, pi)
    Cylindrical {
        r: Array1<f64>,
        phi: Array1<f64>,
    },

    /// Points uniform on [-r_outer, r_outer] in both directions
    Cartesian {
        x: Array1<f64>,
        y: Array1<f64>,
    },
}




// ============================================================================
impl Mesh {

    pub fn from_parameters(params: &Parameters) -> Result<Self> {
        let (n0, n1) = params.grid.shape();

        if n0 < 2 || n1 < 2 {
            return Err(Error::Configuration(format!("mesh resolution ({}, {}) is too small", n0, n1)))
        }
        if !(params.r_inner > 0.0 && params.r_inner < params.r_outer && params.r_outer.is_finite()) {
            return Err(Error::Configuration(format!("mesh extent [{}, {}] is unusable", params.r_inner, params.r_outer)))
        }

        Ok(match params.grid {
            GridSpec::Cylindrical { n_r, n_phi } => Mesh::Cylindrical {
                r: Array::linspace(params.r_inner, params.r_outer, n_r),
                phi: Array::from_shape_fn(n_phi, |j| -PI + 2.0 * PI * j as f64 / n_phi as f64),
            },
            GridSpec::Cartesian { n_x, n_y } => Mesh::Cartesian {
                x: Array::linspace(-params.r_outer, params.r_outer, n_x),
                y: Array::linspace(-params.r_outer, params.r_outer, n_y),
            },
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        match self {
            Mesh::Cylindrical { r, phi } => (r.len(), phi.len()),
            Mesh::Cartesian { x, y } => (x.len(), y.len()),
        }
    }

    pub fn total_points(&self) -> usize {
        let (n0, n1) = self.shape();
        n0 * n1
    }

    /**
     * The (x, y) position of every mesh point.
     */
    pub fn cartesian_coordinates(&self) -> Array2<(f64, f64)> {
        match self {
            Mesh::Cylindrical { r, phi } => {
                cartesian_product2(r.clone(), phi.clone()).mapv(|(r, phi)| (r * phi.cos(), r * phi.sin()))
            }
            Mesh::Cartesian { x, y } => {
                cartesian_product2(x.clone(), y.clone())
            }
        }
    }

    /**
     * The (r, phi) position of every mesh point, with phi in [-pi, pi].
     */
    pub fn polar_coordinates(&self) -> Array2<(f64, f64)> {
        match self {
            Mesh::Cylindrical { r, phi } => {
                cartesian_product2(r.clone(), phi.clone())
            }
            Mesh::Cartesian { x, y } => {
                cartesian_product2(x.clone(), y.clone()).mapv(|(x, y)| ((x * x + y * y).sqrt(), y.atan2(x)))
            }
        }
    }
}
