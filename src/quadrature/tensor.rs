//! Quadrature rules for the reference quadrilateral `[-1, 1]^2`, formed as tensor products of
//! 1D rules.
use crate::quadrature::univariate::gauss;
use crate::quadrature::QuadraturePair2d;
use crate::Real;
use nalgebra::Point2;

/// A Gauss quadrature rule for the reference quadrilateral with the provided number of
/// points per dimension.
pub fn quadrilateral_gauss<T: Real>(num_points_per_dim: usize) -> QuadraturePair2d<T> {
    let n = num_points_per_dim;
    let (weights1d, points1d) = gauss::<T>(n);
    let mut weights2d = Vec::with_capacity(n * n);
    let mut points2d = Vec::with_capacity(n * n);

    let rule1d_iter = || weights1d.iter().zip(&points1d);

    for (&wx, x) in rule1d_iter() {
        for (&wy, y) in rule1d_iter() {
            weights2d.push(wx * wy);
            points2d.push(Point2::new(x[0], y[0]));
        }
    }

    (weights2d, points2d)
}
