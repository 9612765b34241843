//! Proptest strategies for the types of this crate.
use crate::element::Quad4d2Element;
use crate::mesh::procedural::{create_rectangular_uniform_quad_mesh_2d, QuadMesh2d};
use crate::stabilization::Stabilization;
use ::proptest::prelude::*;
use nalgebra::{Point2, Vector2};
use std::cmp::max;

pub fn point2() -> impl Strategy<Value = Point2<f64>> {
    // Keep coordinates in a modest range, otherwise element geometry quickly degenerates
    // in floating point
    let range = -10.0..10.0;
    [range.clone(), range.clone()].prop_map(|[x, y]| Point2::new(x, y))
}

impl Arbitrary for Stabilization {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            Just(Stabilization::None),
            Just(Stabilization::Supg),
            Just(Stabilization::Gls),
            Just(Stabilization::Ms),
        ]
        .boxed()
    }
}

impl Arbitrary for Quad4d2Element<f64> {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    /// Counter-clockwise convex quadrilaterals, obtained by perturbing the corners of a
    /// rectangle by less than a quarter of its shortest side.
    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        let perturbation = -0.24..0.24;
        (
            point2(),
            0.1..5.0,
            0.1..5.0,
            ::proptest::array::uniform4([perturbation.clone(), perturbation]),
        )
            .prop_map(|(origin, width, height, offsets)| {
                let h = f64::min(width, height);
                let corners = [
                    Vector2::new(0.0, 0.0),
                    Vector2::new(width, 0.0),
                    Vector2::new(width, height),
                    Vector2::new(0.0, height),
                ];
                let mut vertices = [origin; 4];
                for ((vertex, corner), [dx, dy]) in vertices.iter_mut().zip(&corners).zip(&offsets) {
                    *vertex = origin + corner + Vector2::new(*dx, *dy) * h;
                }
                Quad4d2Element::from_vertices(vertices)
            })
            .boxed()
    }
}

pub fn rectangular_uniform_mesh_strategy(unit_length: f64, max_cells: usize) -> impl Strategy<Value = QuadMesh2d<f64>> {
    let max_cells = max(1, max_cells);
    (1..=max_cells, 1..=max_cells, 1..=max_cells).prop_map(move |(cells_per_unit, units_x, units_y)| {
        create_rectangular_uniform_quad_mesh_2d(unit_length, units_x, units_y, cells_per_unit, &Vector2::new(0.0, 0.0))
    })
}
