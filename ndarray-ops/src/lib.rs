use std::ops::{Add, Sub, Mul};
use ndarray::*;




/// Tolerance, in units of the index spacing, within which a fractional index
/// just outside a non-periodic axis is still considered on the axis.
const INDEX_TOLERANCE: f64 = 1e-9;




// ============================================================================
pub fn cartesian_product2<T: Copy, U: Copy>(x: Array1<T>, y: Array1<U>) -> Array2<(T, U)>
{
    Array::from_shape_fn((x.len(), y.len()), |(i, j)| (x[i], y[j]))
}




// ============================================================================
pub fn map_stencil2<T, U, P, D, F>(x: &ArrayBase<P, D>, axis: Axis, f: F) -> Array<U, D>
    where
        T: Copy,
        P: Data<Elem=T>,
        D: Dimension,
        F: FnMut(&T, &T) -> U,
{
    let n = x.len_of(axis);
    let a = x.slice_axis(axis, Slice::from(0..n-1));
    let b = x.slice_axis(axis, Slice::from(1..n-0));
    Zip::from(&a).and(&b).map_collect(f)
}

pub fn map_stencil3<T, U, P, D, F>(x: &ArrayBase<P, D>, axis: Axis, f: F) -> Array<U, D>
    where
        T: Copy,
        P: Data<Elem=T>,
        D: Dimension,
        F: FnMut(&T, &T, &T) -> U,
{
    let n = x.len_of(axis);
    let a = x.slice_axis(axis, Slice::from(0..n-2));
    let b = x.slice_axis(axis, Slice::from(1..n-1));
    let c = x.slice_axis(axis, Slice::from(2..n-0));
    Zip::from(&a).and(&b).and(&c).map_collect(f)
}




// ============================================================================
pub fn adjacent_diff<T, U, P, D>(x: &ArrayBase<P, D>, axis: Axis) -> Array<U, D>
    where
        T: Copy + Sub<Output=U>,
        U: Copy,
        P: Data<Elem=T>,
        D: Dimension,
{
    map_stencil2(x, axis, |&a, &b| b - a)
}




/**
 * Return a copy of the one-dimensional array `a`, padded on both ends with
 * `ng` guard zones taken from the opposite end of the array.
 */
pub fn extend_periodic<T, P>(a: &ArrayBase<P, Ix1>, ng: usize) -> Array1<T>
    where
        T: Copy,
        P: Data<Elem=T>
{
    let n = a.len();
    assert!(n >= ng, "cannot extend {} zones with {} guard zones", n, ng);

    Array::from_shape_fn(n + 2 * ng, |i| a[(i + n - ng) % n])
}




/**
 * Bilinear interpolation of a two-dimensional array at the fractional index
 * `(fi, fj)`. The first axis is never periodic: indexes outside `[0, ni - 1]`
 * yield `None`. The second axis wraps around when `periodic_j` is set, and
 * is otherwise treated like the first.
 */
pub fn interpolate2<T, P>(a: &ArrayBase<P, Ix2>, fi: f64, fj: f64, periodic_j: bool) -> Option<T>
    where
        T: Copy + Add<Output=T> + Mul<f64, Output=T>,
        P: Data<Elem=T>,
{
    let (ni, nj) = a.dim();

    if ni == 0 || nj == 0 || !fi.is_finite() || !fj.is_finite() {
        return None
    }
    let (i0, i1, wi) = bracket(fi, ni)?;
    let (j0, j1, wj) = if periodic_j {
        bracket_periodic(fj, nj)
    } else {
        bracket(fj, nj)?
    };

    Some(
        a[[i0, j0]] * ((1.0 - wi) * (1.0 - wj)) +
        a[[i1, j0]] * (wi * (1.0 - wj)) +
        a[[i0, j1]] * ((1.0 - wi) * wj) +
        a[[i1, j1]] * (wi * wj))
}

fn bracket(f: f64, n: usize) -> Option<(usize, usize, f64)>
{
    let last = (n - 1) as f64;

    if f < -INDEX_TOLERANCE || f > last + INDEX_TOLERANCE {
        return None
    }
    if n == 1 {
        return Some((0, 0, 0.0))
    }
    let f = f.max(0.0).min(last);
    let i0 = (f.floor() as usize).min(n - 2);
    Some((i0, i0 + 1, f - i0 as f64))
}

fn bracket_periodic(f: f64, n: usize) -> (usize, usize, f64)
{
    let f = f.rem_euclid(n as f64);
    let i0 = (f.floor() as usize).min(n - 1);
    (i0, (i0 + 1) % n, f - i0 as f64)
}
