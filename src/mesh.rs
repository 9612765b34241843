//! Index-based meshes and boundary extraction.
use crate::allocators::DimAllocator;
use crate::connectivity::Connectivity;
use crate::element::ElementConnectivity;
use crate::Real;
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, Scalar, U1, U2};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

pub mod procedural;

/// Index-based data structure for conforming meshes (i.e. no hanging nodes).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Mesh<T: Scalar, D, Connectivity>
where
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    // serde is not able to determine the necessary trait bounds in this case
    #[serde(bound(
        serialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Serialize",
        deserialize = "<DefaultAllocator as Allocator<T, D>>::Buffer: Deserialize<'de>"
    ))]
    vertices: Vec<OPoint<T, D>>,
    #[serde(bound(
        serialize = "Connectivity: Serialize",
        deserialize = "Connectivity: Deserialize<'de>"
    ))]
    connectivity: Vec<Connectivity>,
}

pub type Mesh1d<T, Connectivity> = Mesh<T, U1, Connectivity>;
pub type Mesh2d<T, Connectivity> = Mesh<T, U2, Connectivity>;

/// A face of a cell that is not shared with any other cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoundaryFace {
    /// Index of the cell the face belongs to.
    pub element_index: usize,
    /// Local index of the face in the cell.
    pub local_face: usize,
    /// Global vertex indices of the face.
    pub vertices: Vec<usize>,
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Construct a mesh from vertices and connectivity.
    ///
    /// The connectivity is expected to only reference in-bounds vertex indices. Users of the
    /// mesh are permitted to panic if they encounter invalid indices.
    pub fn from_vertices_and_connectivity(vertices: Vec<OPoint<T, D>>, connectivity: Vec<C>) -> Self {
        Self { vertices, connectivity }
    }

    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    pub fn vertices_mut(&mut self) -> &mut [OPoint<T, D>] {
        &mut self.vertices
    }

    pub fn connectivity(&self) -> &[C] {
        &self.connectivity
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_elements(&self) -> usize {
        self.connectivity.len()
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: Allocator<T, D>,
{
    /// Finds the faces that belong to exactly one cell.
    ///
    /// The faces are returned ordered by cell index and local face index.
    pub fn find_boundary_faces(&self) -> Vec<BoundaryFace> {
        let mut faces = Vec::new();
        // Sorted face vertices -> (first occurrence, count)
        let mut face_counts: FxHashMap<Vec<usize>, (usize, usize)> = FxHashMap::default();

        for (element_index, cell) in self.connectivity.iter().enumerate() {
            for local_face in 0..cell.num_faces() {
                if let Some(vertices) = cell.face_vertex_indices(local_face) {
                    let mut key = vertices.clone();
                    key.sort_unstable();
                    face_counts
                        .entry(key)
                        .and_modify(|(_, count)| *count += 1)
                        .or_insert((faces.len(), 1));
                    faces.push(BoundaryFace {
                        element_index,
                        local_face,
                        vertices,
                    });
                }
            }
        }

        let mut boundary_indices: Vec<_> = face_counts
            .into_values()
            .filter(|&(_, count)| count == 1)
            .map(|(i, _)| i)
            .collect();
        boundary_indices.sort_unstable();
        boundary_indices
            .into_iter()
            .map(|i| faces[i].clone())
            .collect()
    }

    /// Returns a sorted list of the vertices that belong to a boundary face.
    pub fn find_boundary_vertices(&self) -> Vec<usize> {
        let mut vertices: Vec<_> = self
            .find_boundary_faces()
            .into_iter()
            .flat_map(|face| face.vertices)
            .collect();
        vertices.sort_unstable();
        vertices.dedup();
        vertices
    }
}

impl<T, D, C> Mesh<T, D, C>
where
    T: Real,
    D: DimName,
    C: ElementConnectivity<T, GeometryDim = D>,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn get_element(&self, index: usize) -> Option<C::Element> {
        self.connectivity
            .get(index)
            .and_then(|conn| conn.element(&self.vertices))
    }
}
