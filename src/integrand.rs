//! Interfaces between the integrands and the host framework.
//!
//! The host supplies per-point finite element data ([`FiniteElementPoint`],
//! [`BoundaryPoint`]) and per-element topology ([`ElementContext`]). Integrands expose a
//! small set of capabilities: every integrand creates and initializes its own element-local
//! container ([`Integrand`]), and implements whichever of interior evaluation, boundary
//! evaluation and element finalization apply to it.
use crate::allocators::DimAllocator;
use crate::{Real, SmallDim};
use nalgebra::allocator::Allocator;
use nalgebra::{DVector, DefaultAllocator, DimName, Dyn, OMatrix, OPoint, OVector, Scalar};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors signalled by the integrands.
///
/// All variants are contract violations on behalf of the caller. An operation that returns
/// an error has not modified the element-local container.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IntegrandError {
    /// An element-local container was requested for an element without nodes.
    ZeroNodeCount,
    /// The element has already been finalized and accepts no further contributions.
    AlreadyFinalized,
    /// The element has not been finalized yet.
    NotFinalized,
    /// The point or element data does not match the size of the element-local container.
    SizeMismatch { expected: usize, actual: usize },
    /// A node index does not refer to an entry of the global solution vector.
    NodeIndexOutOfRange { index: usize, num_dofs: usize },
    /// The boundary normal has zero length.
    DegenerateNormal,
    /// The element index exceeds the number of elements the integrand was configured for.
    ElementIndexOutOfRange { index: usize, num_elements: usize },
}

impl Display for IntegrandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroNodeCount => write!(f, "element-local container requested for an element with zero nodes"),
            Self::AlreadyFinalized => write!(f, "element has already been finalized"),
            Self::NotFinalized => write!(f, "element has not been finalized"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected} nodes, got {actual}")
            }
            Self::NodeIndexOutOfRange { index, num_dofs } => {
                write!(f, "node index {index} out of range for a solution with {num_dofs} entries")
            }
            Self::DegenerateNormal => write!(f, "boundary normal has zero length"),
            Self::ElementIndexOutOfRange { index, num_elements } => {
                write!(f, "element index {index} out of range for {num_elements} elements")
            }
        }
    }
}

impl std::error::Error for IntegrandError {}

/// Checks that every node index refers to an entry of a global vector with `num_dofs` entries.
pub(crate) fn check_node_indices(nodes: &[usize], num_dofs: usize) -> Result<(), IntegrandError> {
    match nodes.iter().find(|&&node| node >= num_dofs) {
        Some(&index) => Err(IntegrandError::NodeIndexOutOfRange { index, num_dofs }),
        None => Ok(()),
    }
}

/// Finite element data at a single quadrature (or result) point.
#[derive(Debug, Clone)]
pub struct FiniteElementPoint<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Basis function values $N_i$.
    pub basis: DVector<T>,
    /// Physical basis gradients $\nabla N_i$, one column per node.
    pub gradients: OMatrix<T, D, Dyn>,
    /// Physical basis Laplacians $\Delta N_i$. Absent for bases whose second derivatives
    /// vanish element-wise.
    pub laplacians: Option<DVector<T>>,
    /// Quadrature weight multiplied by the Jacobian determinant.
    pub weight: T,
    /// Cartesian coordinates of the point.
    pub coords: OPoint<T, D>,
}

impl<T, D> FiniteElementPoint<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// # Panics
    ///
    /// Panics if the number of basis values and gradient columns differ.
    pub fn new(basis: DVector<T>, gradients: OMatrix<T, D, Dyn>, weight: T, coords: OPoint<T, D>) -> Self {
        assert_eq!(
            basis.len(),
            gradients.ncols(),
            "Basis values and gradients must agree on the number of nodes"
        );
        Self {
            basis,
            gradients,
            laplacians: None,
            weight,
            coords,
        }
    }

    pub fn with_laplacians(self, laplacians: DVector<T>) -> Self {
        assert_eq!(laplacians.len(), self.basis.len());
        Self {
            laplacians: Some(laplacians),
            ..self
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.basis.len()
    }

    /// Laplacian of basis function `i`, zero if no second derivatives were supplied.
    pub fn laplacian(&self, i: usize) -> T {
        self.laplacians
            .as_ref()
            .map(|lap| lap[i])
            .unwrap_or_else(T::zero)
    }

    /// Computes $\vec U \cdot \nabla N_i$ for every basis function.
    pub fn advective_derivatives(&self, u: &OVector<T, D>) -> DVector<T> {
        self.gradients.tr_mul(u)
    }

    /// Interpolates nodal values `u` at the point.
    pub fn interpolate(&self, u: &DVector<T>) -> T {
        self.basis.dot(u)
    }

    /// Interpolates the gradient of a field with nodal values `u` at the point.
    pub fn interpolate_gradient(&self, u: &DVector<T>) -> OVector<T, D> {
        &self.gradients * u
    }
}

/// Finite element data at a boundary point.
///
/// Basis values and gradients are those of the volume element adjacent to the boundary,
/// and the weight is the quadrature weight times the surface Jacobian.
#[derive(Debug, Clone)]
pub struct BoundaryPoint<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub point: FiniteElementPoint<T, D>,
    /// Outward unit normal.
    pub normal: OVector<T, D>,
}

/// Per-element data the host passes to [`Integrand::init_element`].
#[derive(Debug, Clone)]
pub struct ElementContext<'a, T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    /// Zero-based global element index.
    pub index: usize,
    /// Global node indices of the element nodes.
    pub nodes: &'a [usize],
    /// Corner coordinates of the element.
    pub corners: &'a [OPoint<T, D>],
}

/// The capability shared by all integrands: creating and initializing element-local
/// containers.
pub trait Integrand<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// The element-local container receiving contributions.
    type Local;

    /// Creates a zero-initialized element-local container for an element with
    /// `num_nodes` nodes. If `neumann` is set, only boundary load contributions are requested.
    fn local_integral(&self, num_nodes: usize, neumann: bool) -> Result<Self::Local, IntegrandError>;

    /// Prepares the container for the element described by `element`.
    fn init_element(&self, local: &mut Self::Local, element: &ElementContext<T, D>) -> Result<(), IntegrandError>;

    /// Whether the integrand has contributions from the element interior.
    fn has_interior_terms(&self) -> bool {
        true
    }
}

/// Integrands with contributions from interior quadrature points.
pub trait InteriorIntegrand<T, D>: Integrand<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn evaluate_interior(&self, local: &mut Self::Local, point: &FiniteElementPoint<T, D>)
        -> Result<(), IntegrandError>;
}

/// Integrands with contributions from boundary quadrature points.
pub trait BoundaryIntegrand<T, D>: Integrand<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn evaluate_boundary(&self, local: &mut Self::Local, point: &BoundaryPoint<T, D>) -> Result<(), IntegrandError>;
}

/// Integrands that must close out element-level bookkeeping after all points are visited.
pub trait FinalizeElement<T, D>: Integrand<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn finalize_element(&self, local: &mut Self::Local) -> Result<(), IntegrandError>;
}
