//! Element integrands for stabilized finite element discretizations of the
//! advection-diffusion-reaction equation
//!
//! $$ \rho \frac{\partial u}{\partial t} + \vec U \cdot \nabla u - \nabla \cdot (\kappa \nabla u) + r u = s. $$
//!
//! The core of the crate consists of three integrands that a host finite element framework
//! drives one element at a time:
//!
//! - [`AdvectionDiffusion`](advection_diffusion::AdvectionDiffusion) assembles the Galerkin
//!   terms and, optionally, SUPG, GLS or multiscale stabilization terms. Stabilization terms
//!   are accumulated unscaled and folded into the element matrices once the element-level
//!   stabilization parameter is known.
//! - [`WeakDirichlet`](weak_dirichlet::WeakDirichlet) enforces Dirichlet conditions weakly
//!   through Nitsche-type boundary terms.
//! - [`AdvectionDiffusionNorm`](norm::AdvectionDiffusionNorm) computes energy and $L^2$ norms,
//!   error norms against an analytical solution and effectivity indices.
//!
//! A small host layer ([`quadrature`], [`element`], [`mesh`], [`assembly`]) is provided
//! so that complete problems can be assembled and solved.
use nalgebra::{DimMin, DimName, RealField};

pub mod advection_diffusion;
pub mod allocators;
pub mod assembly;
pub mod config;
pub mod connectivity;
pub mod element;
pub mod element_info;
pub mod field;
pub mod fluid;
pub mod integrand;
pub mod mesh;
pub mod norm;
pub mod quadrature;
pub mod stabilization;
pub mod weak_dirichlet;

#[cfg(feature = "proptest-support")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

pub use advection_diffusion::{AdvectionDiffusion, SolutionMode};
pub use integrand::IntegrandError;
pub use stabilization::Stabilization;
pub use weak_dirichlet::WeakDirichlet;

/// Real scalar types usable with the integrands.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// A small, fixed-size dimension.
///
/// Used as a trait alias for various traits frequently needed by generic routines.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}
