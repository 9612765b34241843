//! Point-wise field evaluators supplied by the host.
//!
//! The integrands never own the fields they evaluate. They hold borrowed trait objects, and a
//! field that is not set contributes nothing. Any `Sync` closure of the right signature can
//! be used as a field.
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, OVector, Scalar};

/// A scalar-valued function of space, such as a source, reaction coefficient or flux.
pub trait ScalarField<T, D>: Sync
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn evaluate(&self, x: &OPoint<T, D>) -> T;
}

impl<T, D, F> ScalarField<T, D> for F
where
    T: Scalar,
    D: DimName,
    F: Fn(&OPoint<T, D>) -> T + Sync,
    DefaultAllocator: Allocator<T, D>,
{
    fn evaluate(&self, x: &OPoint<T, D>) -> T {
        self(x)
    }
}

/// A vector-valued function of space, typically the advection velocity.
pub trait VectorField<T, D>: Sync
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn evaluate(&self, x: &OPoint<T, D>) -> OVector<T, D>;
}

impl<T, D, F> VectorField<T, D> for F
where
    T: Scalar,
    D: DimName,
    F: Fn(&OPoint<T, D>) -> OVector<T, D> + Sync,
    DefaultAllocator: Allocator<T, D>,
{
    fn evaluate(&self, x: &OPoint<T, D>) -> OVector<T, D> {
        self(x)
    }
}

/// An analytical solution of the scalar problem, used for error norms.
pub trait AnalyticalSolution<T, D>: Sync
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn value(&self, x: &OPoint<T, D>) -> T;

    fn gradient(&self, x: &OPoint<T, D>) -> OVector<T, D>;
}

/// An analytical solution given by a pair of closures for its value and its gradient.
#[derive(Debug, Clone)]
pub struct ExactSolution<F, G> {
    value: F,
    gradient: G,
}

impl<F, G> ExactSolution<F, G> {
    pub fn new(value: F, gradient: G) -> Self {
        Self { value, gradient }
    }
}

impl<T, D, F, G> AnalyticalSolution<T, D> for ExactSolution<F, G>
where
    T: Scalar,
    D: DimName,
    F: Fn(&OPoint<T, D>) -> T + Sync,
    G: Fn(&OPoint<T, D>) -> OVector<T, D> + Sync,
    DefaultAllocator: Allocator<T, D>,
{
    fn value(&self, x: &OPoint<T, D>) -> T {
        (self.value)(x)
    }

    fn gradient(&self, x: &OPoint<T, D>) -> OVector<T, D> {
        (self.gradient)(x)
    }
}
