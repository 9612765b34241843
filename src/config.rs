//! Serializable configuration of the integrands.
//!
//! Configurations are plain data in `f64` and are converted into the scalar type of the
//! integrand by [`AdvectionDiffusion::from_config`](crate::AdvectionDiffusion::from_config)
//! and [`WeakDirichlet::from_config`](crate::WeakDirichlet::from_config).
use crate::advection_diffusion::SolutionMode;
use crate::stabilization::Stabilization;
use serde::{Deserialize, Serialize};

fn default_cinv() -> f64 {
    3.0
}

fn default_order() -> usize {
    1
}

fn default_one() -> f64 {
    1.0
}

fn default_cbi() -> f64 {
    4.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvectionDiffusionConfig {
    #[serde(default)]
    pub stabilization: Stabilization,
    /// Inverse estimate constant of the stabilization parameter.
    #[serde(default = "default_cinv")]
    pub cinv: f64,
    /// Polynomial order of the basis.
    #[serde(default = "default_order")]
    pub order: usize,
    #[serde(default = "default_one")]
    pub density: f64,
    #[serde(default = "default_one")]
    pub diffusivity: f64,
    #[serde(default)]
    pub mode: SolutionMode,
}

impl Default for AdvectionDiffusionConfig {
    fn default() -> Self {
        Self {
            stabilization: Stabilization::default(),
            cinv: default_cinv(),
            order: default_order(),
            density: default_one(),
            diffusivity: default_one(),
            mode: SolutionMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeakDirichletConfig {
    /// Penalty constant.
    #[serde(default = "default_cbi")]
    pub cbi: f64,
    /// Adjoint consistency factor.
    #[serde(default = "default_one")]
    pub gamma: f64,
    #[serde(default = "default_one")]
    pub density: f64,
    #[serde(default = "default_one")]
    pub diffusivity: f64,
}

impl Default for WeakDirichletConfig {
    fn default() -> Self {
        Self {
            cbi: default_cbi(),
            gamma: default_one(),
            density: default_one(),
            diffusivity: default_one(),
        }
    }
}
