use ndarray::{s, Array1, ArrayBase, Axis, Data, Ix1, Zip};
use ndarray_ops::{adjacent_diff, extend_periodic, map_stencil3};
use crate::app::RungeKuttaOrder;




/**
 * Finite volume solver for the inviscid Burgers equation u_t + (u^2 / 2)_x = 0
 * on a periodic, uniformly spaced one-dimensional mesh. This is the equation
 * obeyed by the scaled wake amplitude chi(t, eta).
 */
#[derive(Clone, Copy, Debug)]
pub struct BurgersSolver
{
    pub dx: f64,
    pub cfl: f64,
    pub plm: f64,
    pub rk_order: RungeKuttaOrder,
}




// ============================================================================
impl BurgersSolver
{
    /**
     * The largest stable time step for the given state, or `None` if the
     * state is identically zero, in which case any time step is stable.
     */
    pub fn max_stable_time_step<P>(&self, u: &ArrayBase<P, Ix1>) -> Option<f64>
        where
            P: Data<Elem=f64>
    {
        let umax = max_abs(u);

        if umax > 0.0 {
            Some(self.cfl * self.dx / umax)
        } else {
            None
        }
    }

    /**
     * Time derivative of the cell averages: minus the divergence of the
     * Godunov fluxes evaluated from piecewise-linear face states.
     */
    pub fn time_derivative<P>(&self, u: &ArrayBase<P, Ix1>) -> Array1<f64>
        where
            P: Data<Elem=f64>
    {
        let ue = extend_periodic(u, 2);
        let gx = map_stencil3(&ue, Axis(0), |&a, &b, &c| plm_gradient(self.plm, a, b, c));
        let uc = ue.slice(s![1..-1]);

        let fx = Zip::from(uc.slice(s![..-1]))
            .and(gx.slice(s![..-1]))
            .and(uc.slice(s![1..]))
            .and(gx.slice(s![1..]))
            .map_collect(|&ul, &gl, &ur, &gr| godunov_flux(ul + 0.5 * gl, ur - 0.5 * gr));

        adjacent_diff(&fx, Axis(0)) * (-1.0 / self.dx)
    }

    /**
     * Advance the state through one time step of size dt.
     */
    pub fn advance(&self, u: Array1<f64>, dt: f64) -> Array1<f64>
    {
        self.rk_order.advance(u, |u| u + &(self.time_derivative(u) * dt))
    }
}




// ============================================================================
impl RungeKuttaOrder
{
    /**
     * Apply a forward Euler update repeatedly, averaging each stage with the
     * initial state using the strong stability preserving weights of this
     * order.
     */
    pub fn advance<F>(self, u0: Array1<f64>, update: F) -> Array1<f64>
        where
            F: Fn(&Array1<f64>) -> Array1<f64>
    {
        let weights: &[f64] = match self {
            RungeKuttaOrder::RK1 => &[0.0],
            RungeKuttaOrder::RK2 => &[0.0, 1.0 / 2.0],
            RungeKuttaOrder::RK3 => &[0.0, 3.0 / 4.0, 1.0 / 3.0],
        };
        weights.iter().fold(u0.clone(), |u, &b| &u0 * b + &(update(&u) * (1.0 - b)))
    }
}




/**
 * Exact Godunov flux for the Burgers equation, given the states to the left
 * and right of a face.
 */
pub fn godunov_flux(ul: f64, ur: f64) -> f64
{
    if ul <= ur {
        if ul > 0.0 {
            0.5 * ul * ul
        } else if ur < 0.0 {
            0.5 * ur * ur
        } else {
            0.0
        }
    } else if ul + ur > 0.0 {
        0.5 * ul * ul
    } else {
        0.5 * ur * ur
    }
}

/**
 * Slope-limited difference across the middle of three zones, using the
 * generalized minmod limiter with parameter theta in [1, 2].
 */
pub fn plm_gradient(theta: f64, a: f64, b: f64, c: f64) -> f64
{
    let l = theta * (b - a);
    let m = 0.5 * (c - a);
    let r = theta * (c - b);

    if l > 0.0 && m > 0.0 && r > 0.0 {
        l.min(m).min(r)
    } else if l < 0.0 && m < 0.0 && r < 0.0 {
        l.max(m).max(r)
    } else {
        0.0
    }
}

pub fn max_abs<P>(u: &ArrayBase<P, Ix1>) -> f64
    where
        P: Data<Elem=f64>
{
    u.fold(0.0, |m: f64, x| m.max(x.abs()))
}
