//! Integration of a single element.
use crate::allocators::DimAllocator;
use crate::element::{populate_face_points, populate_point, FiniteElement};
use crate::integrand::{BoundaryIntegrand, InteriorIntegrand};
use crate::quadrature::Quadrature;
use crate::Real;
use eyre::WrapErr;
use nalgebra::DefaultAllocator;

/// Evaluates the interior terms of the integrand at every quadrature point of the element.
pub fn integrate_element_interior<T, Element, I>(
    integrand: &I,
    local: &mut I::Local,
    element: &Element,
    quadrature: &impl Quadrature<T, Element::GeometryDim>,
) -> eyre::Result<()>
where
    T: Real,
    Element: FiniteElement<T>,
    I: InteriorIntegrand<T, Element::GeometryDim>,
    DefaultAllocator: DimAllocator<T, Element::GeometryDim>,
{
    for (&w, xi) in quadrature.weights().iter().zip(quadrature.points()) {
        let point = populate_point(element, xi, w)?;
        integrand
            .evaluate_interior(local, &point)
            .wrap_err_with(|| format!("Interior evaluation failed at reference point {:?}", xi))?;
    }
    Ok(())
}

/// Evaluates the boundary terms of the integrand on a local face of the element using
/// `num_points` Gauss points.
pub fn integrate_element_face<T, Element, I>(
    integrand: &I,
    local: &mut I::Local,
    element: &Element,
    face: usize,
    num_points: usize,
) -> eyre::Result<()>
where
    T: Real,
    Element: FiniteElement<T>,
    I: BoundaryIntegrand<T, Element::GeometryDim>,
    DefaultAllocator: DimAllocator<T, Element::GeometryDim>,
{
    for point in populate_face_points(element, face, num_points)? {
        integrand
            .evaluate_boundary(local, &point)
            .wrap_err_with(|| format!("Boundary evaluation failed on face {face}"))?;
    }
    Ok(())
}
