use crate::connectivity::Segment2d1Connectivity;
use crate::element::{ElementConnectivity, FaceQuadraturePoint, FiniteElement};
use crate::Real;
use nalgebra::{DVector, Dyn, Matrix1, OMatrix, OPoint, Point1, U1};
use numeric_literals::replace_float_literals;

/// A linear segment in one dimension.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Segment2d1Element<T: Real> {
    vertices: [Point1<T>; 2],
}

impl<T: Real> Segment2d1Element<T> {
    pub fn from_vertices(vertices: [Point1<T>; 2]) -> Self {
        Self { vertices }
    }

    pub fn from_interval(interval: [T; 2]) -> Self {
        Self::from_vertices([Point1::new(interval[0]), Point1::new(interval[1])])
    }
}

impl<T> FiniteElement<T> for Segment2d1Element<T>
where
    T: Real,
{
    type GeometryDim = U1;

    fn num_nodes(&self) -> usize {
        2
    }

    fn vertices(&self) -> &[Point1<T>] {
        &self.vertices
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_basis(&self, xi: &Point1<T>) -> DVector<T> {
        DVector::from_column_slice(&[(1.0 - xi[0]) / 2.0, (1.0 + xi[0]) / 2.0])
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn gradients(&self, _xi: &Point1<T>) -> OMatrix<T, U1, Dyn> {
        OMatrix::<T, U1, Dyn>::from_row_slice(&[-0.5, 0.5])
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn reference_jacobian(&self, _xi: &Point1<T>) -> Matrix1<T> {
        (self.vertices[1] - self.vertices[0]) / 2.0
    }

    fn map_reference_coords(&self, xi: &Point1<T>) -> Point1<T> {
        let a = &self.vertices[0].coords;
        let b = &self.vertices[1].coords;
        let phi = self.evaluate_basis(xi);
        OPoint::from(a * phi[0] + b * phi[1])
    }

    fn diameter(&self) -> T {
        (self.vertices[1] - self.vertices[0]).norm()
    }

    fn num_faces(&self) -> usize {
        2
    }

    /// The faces are the end points. Face 0 is the first vertex and face 1 the second.
    fn face_quadrature(&self, face: usize, _num_points: usize) -> Option<Vec<FaceQuadraturePoint<T, U1>>> {
        let tangent = (self.vertices[1] - self.vertices[0]).normalize();
        let (xi, normal) = match face {
            0 => (-T::one(), -tangent),
            1 => (T::one(), tangent),
            _ => return None,
        };
        Some(vec![FaceQuadraturePoint {
            reference_coords: Point1::new(xi),
            weight: T::one(),
            normal,
        }])
    }
}

impl<T> ElementConnectivity<T> for Segment2d1Connectivity
where
    T: Real,
{
    type GeometryDim = U1;
    type Element = Segment2d1Element<T>;

    fn element(&self, vertices: &[Point1<T>]) -> Option<Self::Element> {
        let Self(indices) = self;
        Some(Segment2d1Element::from_vertices([
            *vertices.get(indices[0])?,
            *vertices.get(indices[1])?,
        ]))
    }
}
