use advection_diffusion::connectivity::Quad4d2Connectivity;
use advection_diffusion::element::FiniteElement;
use advection_diffusion::mesh::procedural::{
    create_interval_mesh_1d, create_rectangular_uniform_quad_mesh_2d, create_unit_interval_mesh_1d,
    create_unit_square_uniform_quad_mesh_2d,
};
use advection_diffusion::mesh::{BoundaryFace, Mesh2d};
use advection_diffusion::proptest::rectangular_uniform_mesh_strategy;
use nalgebra::{point, vector, Point1};
use proptest::prelude::*;

#[test]
fn interval_mesh() {
    let mesh = create_interval_mesh_1d(-1.0, 1.0, 4);
    assert_eq!(mesh.num_vertices(), 5);
    assert_eq!(mesh.num_elements(), 4);
    let coords: Vec<f64> = mesh.vertices().iter().map(|v| v[0]).collect();
    assert_eq!(coords, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);

    let element = mesh.get_element(2).unwrap();
    assert_eq!(element.vertices(), &[Point1::new(0.0), Point1::new(0.5)]);
    assert!(mesh.get_element(4).is_none());

    let empty = create_unit_interval_mesh_1d::<f64>(0);
    assert_eq!(empty.num_vertices(), 0);
    assert_eq!(empty.num_elements(), 0);
}

#[test]
fn interval_mesh_boundary() {
    let mesh = create_unit_interval_mesh_1d::<f64>(3);
    let faces = mesh.find_boundary_faces();
    assert_eq!(
        faces,
        vec![
            BoundaryFace {
                element_index: 0,
                local_face: 0,
                vertices: vec![0]
            },
            BoundaryFace {
                element_index: 2,
                local_face: 1,
                vertices: vec![3]
            },
        ]
    );
    assert_eq!(mesh.find_boundary_vertices(), vec![0, 3]);
}

#[test]
fn unit_square_mesh() {
    let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(2);
    assert_eq!(mesh.num_vertices(), 9);
    assert_eq!(mesh.num_elements(), 4);
    // Vertices start in the top left corner, rows run from the top
    assert_eq!(mesh.vertices()[0], point![0.0, 1.0]);
    assert_eq!(mesh.vertices()[8], point![1.0, 0.0]);
    assert_eq!(mesh.connectivity()[0], Quad4d2Connectivity([3, 4, 1, 0]));

    let faces = mesh.find_boundary_faces();
    assert_eq!(faces.len(), 8);
    assert!(faces
        .windows(2)
        .all(|w| (w[0].element_index, w[0].local_face) < (w[1].element_index, w[1].local_face)));
    let boundary_vertices = mesh.find_boundary_vertices();
    assert_eq!(boundary_vertices, vec![0, 1, 2, 3, 5, 6, 7, 8]);
}

#[test]
fn rectangular_mesh_with_offset() {
    let mesh = create_rectangular_uniform_quad_mesh_2d(0.5, 2, 1, 1, &vector![1.0, 1.0]);
    assert_eq!(mesh.num_elements(), 2);
    assert_eq!(mesh.vertices()[0], point![1.0, 1.0]);
    assert_eq!(mesh.vertices()[5], point![2.0, 0.5]);

    let empty: Mesh2d<f64, Quad4d2Connectivity> =
        create_rectangular_uniform_quad_mesh_2d(1.0, 0, 1, 1, &vector![0.0, 0.0]);
    assert_eq!(empty.num_elements(), 0);
}

#[test]
fn mesh_serialization() {
    let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(1);
    let json = serde_json::to_string(&mesh).unwrap();
    let deserialized: Mesh2d<f64, Quad4d2Connectivity> = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, mesh);
}

proptest! {
    #[test]
    fn boundary_of_rectangular_meshes(mesh in rectangular_uniform_mesh_strategy(1.0, 4)) {
        let min = mesh.vertices().iter().fold(point![f64::MAX, f64::MAX], |a, v| a.inf(v));
        let max = mesh.vertices().iter().fold(point![f64::MIN, f64::MIN], |a, v| a.sup(v));
        let on_boundary = |i: &usize| {
            let v = mesh.vertices()[*i];
            v.x == min.x || v.x == max.x || v.y == min.y || v.y == max.y
        };

        let boundary_vertices = mesh.find_boundary_vertices();
        let expected: Vec<usize> = (0..mesh.num_vertices()).filter(on_boundary).collect();
        prop_assert_eq!(&boundary_vertices, &expected);

        let faces = mesh.find_boundary_faces();
        prop_assert_eq!(faces.len(), expected.len());
        for face in &faces {
            prop_assert!(face.vertices.iter().all(|i| on_boundary(i)));
        }
    }
}
