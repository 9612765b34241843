use advection_diffusion::config::{AdvectionDiffusionConfig, WeakDirichletConfig};
use advection_diffusion::fluid::FluidProperties;
use advection_diffusion::{AdvectionDiffusion, SolutionMode, Stabilization, WeakDirichlet};
use nalgebra::U2;

#[test]
fn empty_configs_use_defaults() {
    let config: AdvectionDiffusionConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, AdvectionDiffusionConfig::default());
    assert_eq!(config.stabilization, Stabilization::None);
    assert_eq!(config.cinv, 3.0);
    assert_eq!(config.order, 1);
    assert_eq!(config.mode, SolutionMode::Static);

    let config: WeakDirichletConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, WeakDirichletConfig::default());
    assert_eq!(config.cbi, 4.0);
    assert_eq!(config.gamma, 1.0);
}

#[test]
fn advection_diffusion_config_is_applied() {
    let json = r#"{
        "stabilization": "gls",
        "cinv": 12.0,
        "order": 2,
        "diffusivity": 0.01,
        "mode": "rhs_only"
    }"#;
    let config: AdvectionDiffusionConfig = serde_json::from_str(json).unwrap();
    let integrand = AdvectionDiffusion::<f64, U2>::from_config(&config);
    assert_eq!(integrand.stabilization(), Stabilization::Gls);
    assert_eq!(integrand.cinv(), 12.0);
    assert_eq!(integrand.order(), 2);
    assert_eq!(integrand.mode(), SolutionMode::RhsOnly);
    assert_eq!(*integrand.fluid_properties(), FluidProperties::new(1.0, 0.01));
}

#[test]
fn weak_dirichlet_config_is_applied() {
    let config: WeakDirichletConfig = serde_json::from_str(r#"{ "cbi": 10.0, "gamma": -1.0 }"#).unwrap();
    let integrand = WeakDirichlet::<f64, U2>::from_config(&config);
    assert_eq!(integrand.cbi(), 10.0);
    assert_eq!(integrand.gamma(), -1.0);
    assert_eq!(*integrand.fluid_properties(), FluidProperties::default());
}

#[test]
fn invalid_configs_are_rejected() {
    assert!(serde_json::from_str::<AdvectionDiffusionConfig>(r#"{ "stabilisation": "supg" }"#).is_err());
    assert!(serde_json::from_str::<AdvectionDiffusionConfig>(r#"{ "stabilization": "pspg" }"#).is_err());
    assert!(serde_json::from_str::<AdvectionDiffusionConfig>(r#"{ "mode": "transient" }"#).is_err());
    assert!(serde_json::from_str::<WeakDirichletConfig>(r#"{ "penalty": 1.0 }"#).is_err());
}
