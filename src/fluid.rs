//! Physical parameters of the transported medium.
use crate::Real;
use serde::{Deserialize, Serialize};

/// Scalar physical parameters shared by all advection-diffusion integrands.
///
/// The density multiplies the time derivative (and therefore the mass matrix), the
/// diffusivity $\kappa$ multiplies the diffusive flux $- \kappa \nabla u$.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidProperties<T> {
    pub density: T,
    pub diffusivity: T,
}

impl<T: Real> Default for FluidProperties<T> {
    fn default() -> Self {
        Self {
            density: T::one(),
            diffusivity: T::one(),
        }
    }
}

impl<T: Real> FluidProperties<T> {
    pub fn new(density: T, diffusivity: T) -> Self {
        Self { density, diffusivity }
    }

    pub fn density(&self) -> T {
        self.density
    }

    pub fn diffusivity(&self) -> T {
        self.diffusivity
    }

    pub fn set_density(&mut self, density: T) {
        self.density = density;
    }

    pub fn set_diffusivity(&mut self, diffusivity: T) {
        self.diffusivity = diffusivity;
    }
}
