//! Element connectivities: the global vertex indices of each element.
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::Deref;

pub trait Connectivity: Clone + Debug + Send + Sync {
    fn num_faces(&self) -> usize;

    /// The global vertex indices of the given local face, or `None` if the face does not exist.
    fn face_vertex_indices(&self, index: usize) -> Option<Vec<usize>>;

    fn vertex_indices(&self) -> &[usize];
}

/// Connectivity of a linear segment in one dimension.
///
/// Its faces are the two end points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment2d1Connectivity(pub [usize; 2]);

impl Connectivity for Segment2d1Connectivity {
    fn num_faces(&self) -> usize {
        2
    }

    fn face_vertex_indices(&self, index: usize) -> Option<Vec<usize>> {
        self.0.get(index).map(|&v| vec![v])
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}

/// Connectivity of a bilinear quadrilateral in two dimensions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

impl Deref for Quad4d2Connectivity {
    type Target = [usize; 4];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Connectivity for Quad4d2Connectivity {
    fn num_faces(&self) -> usize {
        4
    }

    fn face_vertex_indices(&self, index: usize) -> Option<Vec<usize>> {
        let idx = &self.0;
        if index < 4 {
            Some(vec![idx[index], idx[(index + 1) % 4]])
        } else {
            None
        }
    }

    fn vertex_indices(&self) -> &[usize] {
        &self.0
    }
}
