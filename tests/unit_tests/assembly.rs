use advection_diffusion::assembly::global::{
    add_systems, apply_dirichlet_bc, assemble_boundary_system, assemble_system, compute_element_norms,
    gather_global_to_local,
};
use advection_diffusion::mesh::procedural::create_unit_interval_mesh_1d;
use advection_diffusion::proptest::rectangular_uniform_mesh_strategy;
use advection_diffusion::quadrature::tensor::quadrilateral_gauss;
use advection_diffusion::quadrature::univariate::gauss;
use advection_diffusion::{AdvectionDiffusion, SolutionMode, Stabilization, WeakDirichlet};
use matrixcompare::assert_matrix_eq;
use nalgebra::{dmatrix, dvector, DMatrix, DVector, Point1, Vector2, U1, U2};
use nalgebra_sparse::CsrMatrix;
use proptest::prelude::*;

#[test]
fn gather_global_to_local_picks_indexed_entries() {
    let global = dvector![1.0, 2.0, 3.0, 4.0, 5.0];
    let mut local = DVector::zeros(3);
    gather_global_to_local(&global, &mut local, &[4, 0, 2]);
    assert_eq!(local, dvector![5.0, 1.0, 3.0]);
}

#[test]
fn assemble_1d_diffusion_system() {
    let mesh = create_unit_interval_mesh_1d::<f64>(2);
    let source = |_: &Point1<f64>| 1.0;
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None).with_source(&source);
    let system = assemble_system(&mesh, &integrand, &gauss::<f64>(2)).unwrap();

    let expected_matrix = dmatrix![ 2.0, -2.0,  0.0;
                                   -2.0,  4.0, -2.0;
                                    0.0, -2.0,  2.0];
    assert_matrix_eq!(DMatrix::from(system.matrix.as_ref().unwrap()), expected_matrix, comp = abs, tol = 1e-12);
    assert_matrix_eq!(system.rhs, dvector![0.25, 0.5, 0.25], comp = abs, tol = 1e-12);
    assert!(system.mass.is_none());
}

#[test]
fn assemble_1d_mass_matrix_in_dynamic_mode() {
    let mesh = create_unit_interval_mesh_1d::<f64>(2);
    let mut integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    integrand.set_mode(SolutionMode::Dynamic);
    let system = assemble_system(&mesh, &integrand, &gauss::<f64>(2)).unwrap();

    let expected_mass = dmatrix![2.0, 1.0, 0.0;
                                 1.0, 4.0, 1.0;
                                 0.0, 1.0, 2.0] / 12.0;
    assert_matrix_eq!(DMatrix::from(system.mass.as_ref().unwrap()), expected_mass, comp = abs, tol = 1e-12);

    integrand.set_mode(SolutionMode::RhsOnly);
    let system = assemble_system(&mesh, &integrand, &gauss::<f64>(2)).unwrap();
    assert!(system.matrix.is_none());
    assert!(system.mass.is_none());
}

#[test]
fn stabilized_assembly_fills_tau_cache() {
    let mesh = create_unit_interval_mesh_1d::<f64>(4);
    let advection = |_: &Point1<f64>| nalgebra::Vector1::new(1.0);
    let mut integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::Supg).with_advection(&advection);
    integrand.fluid_properties_mut().diffusivity = 0.01;

    // The cache has not been sized
    assert!(assemble_system(&mesh, &integrand, &gauss::<f64>(2)).is_err());

    integrand.set_num_elements(mesh.num_elements());
    assemble_system(&mesh, &integrand, &gauss::<f64>(2)).unwrap();
    let tau: Vec<f64> = integrand.tau_cache().to_vec();
    assert!(tau.iter().all(|&t| t > 0.0));
    assert!(tau.windows(2).all(|w| (w[0] - w[1]).abs() < 1e-14));
}

#[test]
fn neumann_boundary_system_only_has_load() {
    let mesh = create_unit_interval_mesh_1d::<f64>(2);
    let flux = |x: &Point1<f64>| 1.0 + x[0];
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None).with_flux(&flux);
    let faces = mesh.find_boundary_faces();
    let system = assemble_boundary_system(&mesh, &integrand, &faces, 1, true).unwrap();
    assert!(system.matrix.is_none());
    assert_matrix_eq!(system.rhs, dvector![1.0, 0.0, 2.0], comp = abs, tol = 1e-14);
}

#[test]
fn weak_dirichlet_boundary_system() {
    let mesh = create_unit_interval_mesh_1d::<f64>(2);
    let integrand = WeakDirichlet::<f64, U1>::default();
    let faces = mesh.find_boundary_faces();
    let system = assemble_boundary_system(&mesh, &integrand, &faces[..1], 1, false).unwrap();
    // See the element-level weak Dirichlet test for the values on an element of size 0.5
    let expected = dmatrix![4.0, 2.0, 0.0;
                            2.0, 0.0, 0.0;
                            0.0, 0.0, 0.0];
    assert_matrix_eq!(DMatrix::from(system.matrix.as_ref().unwrap()), expected, comp = abs, tol = 1e-12);
    assert_matrix_eq!(system.rhs, DVector::<f64>::zeros(3));
}

#[test]
fn dirichlet_rows_are_replaced() {
    let mesh = create_unit_interval_mesh_1d::<f64>(2);
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let system = assemble_system(&mesh, &integrand, &gauss::<f64>(2)).unwrap();
    let mut matrix = system.matrix.unwrap();
    let mut rhs = system.rhs;

    apply_dirichlet_bc(&mut matrix, &mut rhs, &[0, 2], &[1.0, 3.0]).unwrap();
    let expected = dmatrix![ 1.0, 0.0,  0.0;
                            -2.0, 4.0, -2.0;
                             0.0, 0.0,  1.0];
    assert_matrix_eq!(DMatrix::from(&matrix), expected, comp = abs, tol = 1e-12);
    assert_eq!(rhs, dvector![1.0, 0.0, 3.0]);

    let solution = DMatrix::from(&matrix).lu().solve(&rhs).unwrap();
    assert_matrix_eq!(solution, dvector![1.0, 2.0, 3.0], comp = abs, tol = 1e-12);

    assert!(apply_dirichlet_bc(&mut matrix, &mut rhs, &[0], &[1.0, 2.0]).is_err());
    assert!(apply_dirichlet_bc(&mut matrix, &mut rhs, &[3], &[1.0]).is_err());

    let mut no_diagonal = CsrMatrix::from(&nalgebra_sparse::CooMatrix::<f64>::new(3, 3));
    assert!(apply_dirichlet_bc(&mut no_diagonal, &mut rhs, &[1], &[1.0]).is_err());
}

#[test]
fn systems_are_added() {
    let mesh = create_unit_interval_mesh_1d::<f64>(2);
    let source = |_: &Point1<f64>| 1.0;
    let interior = AdvectionDiffusion::<f64, U1>::new(Stabilization::None).with_source(&source);
    let boundary = WeakDirichlet::<f64, U1>::default();
    let a = assemble_system(&mesh, &interior, &gauss::<f64>(2)).unwrap();
    let b = assemble_boundary_system(&mesh, &boundary, &mesh.find_boundary_faces(), 1, false).unwrap();

    let sum = add_systems(a.clone(), &b).unwrap();
    let expected = DMatrix::from(a.matrix.as_ref().unwrap()) + DMatrix::from(b.matrix.as_ref().unwrap());
    assert_matrix_eq!(DMatrix::from(sum.matrix.as_ref().unwrap()), expected, comp = abs, tol = 1e-12);
    assert_matrix_eq!(sum.rhs, &a.rhs + &b.rhs, comp = abs, tol = 1e-14);
    assert!(sum.mass.is_none());

    let other = assemble_system(&create_unit_interval_mesh_1d::<f64>(3), &interior, &gauss::<f64>(2)).unwrap();
    assert!(add_systems(a, &other).is_err());
}

#[test]
fn element_norms_require_one_estimate_per_element() {
    let mesh = create_unit_interval_mesh_1d::<f64>(2);
    let integrand = AdvectionDiffusion::<f64, U1>::new(Stabilization::None);
    let solution = DVector::zeros(3);
    let norm = integrand.norm_integrand(&solution, None);
    assert!(compute_element_norms(&mesh, &norm, &gauss::<f64>(2), Some(&[1.0][..])).is_err());
    assert_eq!(compute_element_norms(&mesh, &norm, &gauss::<f64>(2), None).unwrap().len(), 2);
}

proptest! {
    #[test]
    fn diffusion_matrix_is_symmetric_with_constants_in_kernel(
        mesh in rectangular_uniform_mesh_strategy(1.0, 3)
    ) {
        let integrand = AdvectionDiffusion::<f64, U2>::new(Stabilization::None);
        let system = assemble_system(&mesh, &integrand, &quadrilateral_gauss::<f64>(2)).unwrap();
        let matrix = DMatrix::from(system.matrix.as_ref().unwrap());
        prop_assert!((&matrix - matrix.transpose()).amax() < 1e-12);
        let ones = DVector::repeat(mesh.num_vertices(), 1.0);
        prop_assert!((&matrix * ones).amax() < 1e-12);
    }

    #[test]
    fn advection_matrix_annihilates_constants(
        mesh in rectangular_uniform_mesh_strategy(1.0, 3),
        velocity in [-2.0 .. 2.0, -2.0 .. 2.0],
    ) {
        let advection = move |_: &nalgebra::Point2<f64>| Vector2::from(velocity);
        let mut integrand = AdvectionDiffusion::<f64, U2>::new(Stabilization::Supg).with_advection(&advection);
        integrand.set_num_elements(mesh.num_elements());
        let system = assemble_system(&mesh, &integrand, &quadrilateral_gauss::<f64>(2)).unwrap();
        let matrix = DMatrix::from(system.matrix.as_ref().unwrap());
        let ones = DVector::repeat(mesh.num_vertices(), 1.0);
        prop_assert!((&matrix * ones).amax() < 1e-10);
    }
}
