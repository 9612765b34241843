//! Quadrature rules for the one-dimensional domain `[-1, 1]`.
use crate::quadrature::QuadraturePair1d;
use crate::Real;
use log::warn;
use nalgebra::{convert, Point1};
use std::f64::consts::PI;

const MAX_NEWTON_ITERATIONS: usize = 100;

/// Recurrence relation for Legendre polynomials.
///
/// Derivatives are *not* defined at |x| == 1, so it is only suitable for evaluation in the
/// open interval (-1, 1).
#[derive(Debug, Default)]
pub(crate) struct LegendreRecurrence {
    n: usize,
    x: f64,
    // p_n(x)
    p1: f64,
    // p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    pub fn evaluate(n: usize, x: f64) -> Self {
        //  m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        let mut p3;
        for m in 1..=n {
            let m = m as f64;
            p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }

        Self { n, x, p1, p2 }
    }

    pub fn value(&self) -> f64 {
        self.p1
    }

    pub fn derivative(&self) -> f64 {
        let Self { n, x, p1, p2 } = &self;
        let n = *n as f64;
        // dp_n/dx (x) = n * (x * p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        n * (x * p1 - p2) / (x * x - 1.0)
    }
}

fn gauss_f64(n: usize) -> (Vec<f64>, Vec<f64>) {
    // Loosely based on the procedure used in
    // Numerical Recipes, The art of Scientific Computing, Third Edition (2007)
    let m = (n + 1) / 2;
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    // Only the first m roots are computed, the rest follow by symmetry
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut recurrence = LegendreRecurrence::evaluate(n, x);
        let mut converged = false;
        for _ in 0..MAX_NEWTON_ITERATIONS {
            let dx = -recurrence.value() / recurrence.derivative();
            x += dx;
            recurrence = LegendreRecurrence::evaluate(n, x);
            if dx.abs() <= 1e-15 {
                converged = true;
                break;
            }
        }
        if !converged {
            warn!("Newton iteration for Gauss point {i} of {n} did not converge");
        }

        let dp = recurrence.derivative();
        points.push(x);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    for i in m..n {
        let mirror_idx = n - i - 1;
        points.push(-points[mirror_idx]);
        weights.push(weights[mirror_idx]);
    }

    (weights, points)
}

/// Gauss quadrature for the reference interval [-1, 1].
///
/// Given `n` points, the rule integrates polynomials of order up to `2 n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss<T: Real>(num_points: usize) -> QuadraturePair1d<T> {
    assert!(num_points > 0, "number of points must be positive");
    let (weights, points) = gauss_f64(num_points);
    let weights = weights.into_iter().map(convert).collect();
    let points = points
        .into_iter()
        .map(|x| Point1::new(convert(x)))
        .collect();
    (weights, points)
}
