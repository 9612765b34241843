use advection_diffusion::assembly::global::{assemble_system, compute_element_norms};
use advection_diffusion::field::{AnalyticalSolution, ExactSolution};
use advection_diffusion::integrand::{ElementContext, FinalizeElement, Integrand, IntegrandError};
use advection_diffusion::mesh::procedural::create_unit_interval_mesh_1d;
use advection_diffusion::norm::{GlobalNorms, NormInfo, NUM_DISCRETE_NORMS, NUM_EXACT_NORMS};
use advection_diffusion::quadrature::univariate::gauss;
use advection_diffusion::{AdvectionDiffusion, Stabilization};
use matrixcompare::assert_scalar_eq;
use nalgebra::{DVector, Point1, Vector1, U1};

fn linear_exact() -> impl AnalyticalSolution<f64, U1> {
    ExactSolution::new(|x: &Point1<f64>| 1.0 + 2.0 * x[0], |_: &Point1<f64>| Vector1::new(2.0))
}

/// Nodal values of u = 1 + 2x on the unit interval mesh with `n` cells.
fn interpolated_linear(n: usize) -> DVector<f64> {
    DVector::from_fn(n + 1, |i, _| 1.0 + 2.0 * i as f64 / n as f64)
}

fn compute_norms(
    integrand: &AdvectionDiffusion<f64, U1>,
    solution: &DVector<f64>,
    analytical: Option<&dyn AnalyticalSolution<f64, U1>>,
    estimates: Option<&[f64]>,
) -> (Vec<NormInfo<f64>>, GlobalNorms<f64>) {
    let mesh = create_unit_interval_mesh_1d(solution.len() - 1);
    let norm = integrand.norm_integrand(solution, analytical);
    let elements = compute_element_norms(&mesh, &norm, &gauss::<f64>(2), estimates).unwrap();
    let global = GlobalNorms::from_elements(&elements);
    (elements, global)
}

#[test]
fn discrete_norms_of_linear_solution() {
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let solution = interpolated_linear(4);
    let (elements, global) = compute_norms(&integrand, &solution, None, None);

    assert_eq!(elements.len(), 4);
    assert!(elements.iter().all(|e| e.is_finalized() && e.exact_norms_squared().is_none()));
    assert_eq!(elements[2].element_index(), 2);
    assert_eq!(elements[2].element_solution(), &DVector::from_column_slice(&[2.0, 2.5]));
    assert_scalar_eq!(elements[0].discrete_norms_squared()[0], 1.0, comp = abs, tol = 1e-12);

    assert_eq!(global.num_elements(), 4);
    assert_scalar_eq!(global.energy_norm(), 2.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.l2_norm(), (13.0f64 / 3.0).sqrt(), comp = abs, tol = 1e-12);
    assert_eq!(global.stabilization_norm(), 0.0);
    assert_eq!(global.energy_error(), None);
    assert_eq!(global.effectivity_index(), None);
}

#[test]
fn reaction_contributes_to_energy() {
    let reaction = |_: &Point1<f64>| 2.0;
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None).with_reaction(&reaction);
    let (_, global) = compute_norms(&integrand, &interpolated_linear(4), None, None);
    assert_scalar_eq!(global.energy_norm().powi(2), 4.0 + 2.0 * 13.0 / 3.0, comp = abs, tol = 1e-12);
}

#[test]
fn error_norms_vanish_for_exact_discrete_solution() {
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let exact = linear_exact();
    let (elements, global) = compute_norms(&integrand, &interpolated_linear(4), Some(&exact), None);

    assert!(elements.iter().all(|e| e.exact_norms_squared().is_some()));
    assert_scalar_eq!(global.exact_energy_norm().unwrap(), 2.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.exact_l2_norm().unwrap(), (13.0f64 / 3.0).sqrt(), comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.energy_error().unwrap(), 0.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.l2_error().unwrap(), 0.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.h1_error().unwrap(), 0.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.relative_energy_error().unwrap(), 0.0, comp = abs, tol = 1e-12);
    // No estimates were supplied
    assert!(elements.iter().all(|e| e.effectivity().is_none()));
    assert_eq!(global.error_estimate(), None);
}

#[test]
fn effectivity_indices() {
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let exact = linear_exact();
    let zero = DVector::zeros(5);
    let estimates = [0.5; 4];
    let (elements, global) = compute_norms(&integrand, &zero, Some(&exact), Some(&estimates[..]));

    // The error is the exact solution itself, with a(e, e) = 1 on every element
    for element in &elements {
        assert_scalar_eq!(element.exact_norms_squared().unwrap()[1], 1.0, comp = abs, tol = 1e-12);
        assert_eq!(element.error_estimate(), Some(0.5));
        assert_scalar_eq!(element.effectivity().unwrap(), 0.5, comp = abs, tol = 1e-12);
    }
    assert_scalar_eq!(global.energy_error().unwrap(), 2.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.error_estimate().unwrap(), 1.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.effectivity_index().unwrap(), 0.5, comp = abs, tol = 1e-12);
    assert_scalar_eq!(global.relative_energy_error().unwrap(), 1.0, comp = abs, tol = 1e-12);
    // |e|_H1^2 = (e, e) + (e', e')
    assert_scalar_eq!(global.h1_error().unwrap().powi(2), 13.0 / 3.0 + 4.0, comp = abs, tol = 1e-12);
}

#[test]
fn effectivity_is_undefined_without_error() {
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let exact = ExactSolution::new(|_: &Point1<f64>| 0.0, |_: &Point1<f64>| Vector1::zeros());
    let estimates = [0.1; 2];
    let (elements, global) = compute_norms(&integrand, &DVector::zeros(3), Some(&exact), Some(&estimates[..]));
    assert!(elements.iter().all(|e| e.effectivity().is_none()));
    assert_eq!(global.effectivity_index(), None);
}

#[test]
fn stabilization_norm_uses_stored_tau() {
    let advection = |_: &Point1<f64>| Vector1::new(1.0);
    let mut integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::Supg).with_advection(&advection);
    integrand.fluid_properties_mut().diffusivity = 0.1;
    let mesh = create_unit_interval_mesh_1d::<f64>(4);
    integrand.set_num_elements(mesh.num_elements());
    assemble_system(&mesh, &integrand, &gauss::<f64>(2)).unwrap();
    let tau = integrand.element_tau(0);
    assert!(tau > 0.0);

    let (elements, global) = compute_norms(&integrand, &interpolated_linear(4), None, None);
    assert!(elements.iter().all(|e| e.tau() == tau));
    // (U u')^2 = 4 on the unit interval
    assert_scalar_eq!(global.stabilization_norm().powi(2), 4.0 * tau, comp = abs, tol = 1e-12);
}

#[test]
fn field_names_and_counts() {
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let solution = DVector::zeros(2);
    let exact = linear_exact();

    let norm = integrand.norm_integrand(&solution, None);
    assert!(!norm.has_analytical_solution());
    assert_eq!(norm.num_fields(0), 1);
    assert_eq!(norm.num_fields(1), NUM_DISCRETE_NORMS);
    assert_eq!(norm.num_fields(2), 0);

    let norm = integrand.norm_integrand(&solution, Some(&exact));
    assert_eq!(norm.num_fields(0), 2);
    assert_eq!(norm.num_fields(2), NUM_EXACT_NORMS + 1);
    assert_eq!(norm.num_fields(3), 0);
    assert_eq!(norm.name(1, 0, None).as_deref(), Some("a(u^h,u^h)^0.5"));
    assert_eq!(norm.name(2, 5, None).as_deref(), Some("effectivity index"));
    assert_eq!(norm.name(2, 1, Some("Q1")).as_deref(), Some("Q1 a(e,e)^0.5, e=u-u^h"));
    assert_eq!(norm.name(1, 3, None), None);
    assert_eq!(norm.name(0, 0, None), None);
}

#[test]
fn norm_contract_violations() {
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let solution = DVector::zeros(2);
    let norm = integrand.norm_integrand(&solution, None);
    let corners = [Point1::new(0.0), Point1::new(1.0)];

    assert_eq!(norm.local_integral(0, false).unwrap_err(), IntegrandError::ZeroNodeCount);

    let mut local = norm.local_integral(2, false).unwrap();
    let out_of_range = ElementContext {
        index: 0,
        nodes: &[0, 2],
        corners: &corners,
    };
    assert_eq!(
        norm.init_element(&mut local, &out_of_range),
        Err(IntegrandError::NodeIndexOutOfRange { index: 2, num_dofs: 2 })
    );

    let context = ElementContext {
        index: 0,
        nodes: &[0, 1],
        corners: &corners,
    };
    norm.init_element(&mut local, &context).unwrap();
    norm.finalize_element(&mut local).unwrap();
    assert_eq!(norm.finalize_element(&mut local), Err(IntegrandError::AlreadyFinalized));
    assert_eq!(norm.init_element(&mut local, &context), Err(IntegrandError::AlreadyFinalized));
}

#[test]
fn global_norms_serialize() {
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let (_, global) = compute_norms(&integrand, &interpolated_linear(2), None, None);
    let json = serde_json::to_value(&global).unwrap();
    assert_eq!(json["num_elements"], 2);
    assert!(json["exact"].is_null());
}
