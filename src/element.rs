//! Reference-mapped finite elements and construction of point data for the integrands.
use crate::allocators::DimAllocator;
use crate::connectivity::Connectivity;
use crate::integrand::{BoundaryPoint, FiniteElementPoint};
use crate::{Real, SmallDim};
use eyre::eyre;
use nalgebra::{DVector, DefaultAllocator, Dyn, OMatrix, OPoint, OVector};
use std::fmt::Debug;

mod quadrilateral;
mod segment;

pub use quadrilateral::*;
pub use segment::*;

/// A quadrature point on a face of an element.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceQuadraturePoint<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// The point in the reference coordinates of the element.
    pub reference_coords: OPoint<T, D>,
    /// The quadrature weight multiplied by the surface Jacobian of the face.
    pub weight: T,
    /// Outward unit normal in physical coordinates.
    pub normal: OVector<T, D>,
}

/// A finite element whose reference domain has the same dimension as its geometry.
pub trait FiniteElement<T>: Debug + Sync
where
    T: Real,
    DefaultAllocator: DimAllocator<T, Self::GeometryDim>,
{
    type GeometryDim: SmallDim;

    fn num_nodes(&self) -> usize;

    fn vertices(&self) -> &[OPoint<T, Self::GeometryDim>];

    /// Evaluates each basis function at the given reference coordinates.
    fn evaluate_basis(&self, xi: &OPoint<T, Self::GeometryDim>) -> DVector<T>;

    /// Gradients of the basis functions with respect to reference coordinates, one column per node.
    fn gradients(&self, xi: &OPoint<T, Self::GeometryDim>) -> OMatrix<T, Self::GeometryDim, Dyn>;

    /// The Jacobian of the reference-to-physical map.
    fn reference_jacobian(
        &self,
        xi: &OPoint<T, Self::GeometryDim>,
    ) -> OMatrix<T, Self::GeometryDim, Self::GeometryDim>;

    fn map_reference_coords(&self, xi: &OPoint<T, Self::GeometryDim>) -> OPoint<T, Self::GeometryDim>;

    /// The largest distance between any two points of the element.
    fn diameter(&self) -> T;

    fn num_faces(&self) -> usize;

    /// Gauss quadrature with `num_points` points on the given local face, or `None` if the face
    /// does not exist.
    fn face_quadrature(
        &self,
        face: usize,
        num_points: usize,
    ) -> Option<Vec<FaceQuadraturePoint<T, Self::GeometryDim>>>;
}

/// Connectivities that can produce the finite element they describe.
pub trait ElementConnectivity<T>: Connectivity
where
    T: Real,
    DefaultAllocator: DimAllocator<T, Self::GeometryDim>,
{
    type GeometryDim: SmallDim;
    type Element: FiniteElement<T, GeometryDim = Self::GeometryDim>;

    /// Returns the finite element associated with this connectivity.
    ///
    /// The vertices passed in should be the collection of *all* vertices in the mesh.
    fn element(&self, vertices: &[OPoint<T, Self::GeometryDim>]) -> Option<Self::Element>;
}

/// Computes basis values and physical basis gradients at the reference point `xi`.
///
/// The quadrature `weight` is scaled by the absolute Jacobian determinant.
#[allow(non_snake_case)]
pub fn populate_point<T, Element>(
    element: &Element,
    xi: &OPoint<T, Element::GeometryDim>,
    weight: T,
) -> eyre::Result<FiniteElementPoint<T, Element::GeometryDim>>
where
    T: Real,
    Element: FiniteElement<T>,
    DefaultAllocator: DimAllocator<T, Element::GeometryDim>,
{
    let J = element.reference_jacobian(xi);
    let det_J = J.determinant();
    let J_inv_t = J
        .try_inverse()
        .ok_or_else(|| eyre!("Singular element Jacobian at reference point {:?}", xi))?
        .transpose();
    let gradients = J_inv_t * element.gradients(xi);
    Ok(FiniteElementPoint::new(
        element.evaluate_basis(xi),
        gradients,
        weight * det_J.abs(),
        element.map_reference_coords(xi),
    ))
}

/// Computes boundary point data for all quadrature points on a local face of the element.
pub fn populate_face_points<T, Element>(
    element: &Element,
    face: usize,
    num_points: usize,
) -> eyre::Result<Vec<BoundaryPoint<T, Element::GeometryDim>>>
where
    T: Real,
    Element: FiniteElement<T>,
    DefaultAllocator: DimAllocator<T, Element::GeometryDim>,
{
    let face_quadrature = element
        .face_quadrature(face, num_points)
        .ok_or_else(|| eyre!("Face {} out of range for element with {} faces", face, element.num_faces()))?;
    face_quadrature
        .into_iter()
        .map(|face_point| {
            let mut point = populate_point(element, &face_point.reference_coords, T::one())?;
            point.weight = face_point.weight;
            Ok(BoundaryPoint {
                point,
                normal: face_point.normal,
            })
        })
        .collect()
}
