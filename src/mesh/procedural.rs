//! Basic procedural mesh generation routines.
use crate::connectivity::{Quad4d2Connectivity, Segment2d1Connectivity};
use crate::mesh::{Mesh1d, Mesh2d};
use crate::Real;
use nalgebra::{Point1, Point2, Vector2};

pub type SegmentMesh1d<T> = Mesh1d<T, Segment2d1Connectivity>;
pub type QuadMesh2d<T> = Mesh2d<T, Quad4d2Connectivity>;

/// Generates a uniform mesh of the interval `[a, b]` with the given number of cells.
pub fn create_interval_mesh_1d<T: Real>(a: T, b: T, num_cells: usize) -> SegmentMesh1d<T> {
    if num_cells == 0 {
        return SegmentMesh1d::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }
    let n = T::from_usize(num_cells).expect("Must be able to fit usize in T");
    let h = (b - a) / n;
    let vertices = (0..=num_cells)
        .map(|i| {
            let i = T::from_usize(i).expect("Must be able to fit usize in T");
            Point1::new(a + i * h)
        })
        .collect();
    let cells = (0..num_cells)
        .map(|i| Segment2d1Connectivity([i, i + 1]))
        .collect();
    SegmentMesh1d::from_vertices_and_connectivity(vertices, cells)
}

pub fn create_unit_interval_mesh_1d<T: Real>(num_cells: usize) -> SegmentMesh1d<T> {
    create_interval_mesh_1d(T::zero(), T::one(), num_cells)
}

pub fn create_unit_square_uniform_quad_mesh_2d<T: Real>(cells_per_dim: usize) -> QuadMesh2d<T> {
    create_rectangular_uniform_quad_mesh_2d(T::one(), 1, 1, cells_per_dim, &Vector2::new(T::zero(), T::one()))
}

/// Generates an axis-aligned rectangular uniform mesh given a unit length,
/// dimensions as multipliers of the unit length and the number of cells per unit length.
///
/// Cells are ordered row by row from the top, and vertices are ordered counter-clockwise.
pub fn create_rectangular_uniform_quad_mesh_2d<T: Real>(
    unit_length: T,
    units_x: usize,
    units_y: usize,
    cells_per_unit: usize,
    top_left: &Vector2<T>,
) -> QuadMesh2d<T> {
    if cells_per_unit == 0 || units_x == 0 || units_y == 0 {
        return QuadMesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let mut vertices = Vec::new();
    let mut cells = Vec::new();

    let cell_size = unit_length / T::from_usize(cells_per_unit).expect("Must be able to fit usize in T");
    let num_cells_x = units_x * cells_per_unit;
    let num_cells_y = units_y * cells_per_unit;

    let to_global_vertex_index = |i, j| (num_cells_x + 1) * j + i;

    for j in 0..=num_cells_y {
        for i in 0..=num_cells_x {
            let i_as_t = T::from_usize(i).expect("Must be able to fit usize in T");
            let j_as_t = T::from_usize(j).expect("Must be able to fit usize in T");
            let v = top_left + Vector2::new(i_as_t, -j_as_t) * cell_size;
            vertices.push(Point2::from(v));
        }
    }

    for j in 0..num_cells_y {
        for i in 0..num_cells_x {
            cells.push(Quad4d2Connectivity([
                to_global_vertex_index(i, j + 1),
                to_global_vertex_index(i + 1, j + 1),
                to_global_vertex_index(i + 1, j),
                to_global_vertex_index(i, j),
            ]));
        }
    }

    QuadMesh2d::from_vertices_and_connectivity(vertices, cells)
}
