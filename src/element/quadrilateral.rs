use crate::connectivity::Quad4d2Connectivity;
use crate::element::{ElementConnectivity, FaceQuadraturePoint, FiniteElement};
use crate::quadrature::univariate::gauss;
use crate::Real;
use itertools::Itertools;
use nalgebra::{DVector, Dyn, Matrix2, Matrix2x4, OMatrix, OPoint, Point2, Vector2, U2};
use numeric_literals::replace_float_literals;

/// A bilinear quadrilateral with counter-clockwise vertex ordering.
///
/// ```text
/// 3_________2
/// |         |
/// |         |
/// |_________|
/// 0         1
/// ```
///
/// Face `i` connects vertex `i` to vertex `i + 1 (mod 4)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad4d2Element<T: Real> {
    vertices: [Point2<T>; 4],
}

impl<T: Real> Quad4d2Element<T> {
    pub fn from_vertices(vertices: [Point2<T>; 4]) -> Self {
        Self { vertices }
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference() -> Self {
        Self::from_vertices([
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ])
    }

    fn vertex_matrix(&self) -> Matrix2x4<T> {
        Matrix2x4::from_fn(|i, j| self.vertices[j][i])
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn reference_vertex<T: Real>(index: usize) -> Vector2<T> {
    match index % 4 {
        0 => Vector2::new(-1.0, -1.0),
        1 => Vector2::new(1.0, -1.0),
        2 => Vector2::new(1.0, 1.0),
        _ => Vector2::new(-1.0, 1.0),
    }
}

impl<T> FiniteElement<T> for Quad4d2Element<T>
where
    T: Real,
{
    type GeometryDim = U2;

    fn num_nodes(&self) -> usize {
        4
    }

    fn vertices(&self) -> &[Point2<T>] {
        &self.vertices
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn evaluate_basis(&self, xi: &Point2<T>) -> DVector<T> {
        // N_{alpha, beta}([alpha, beta]) = 1 with alpha, beta = 1 or -1
        let phi = |alpha, beta, xi: &Point2<T>| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
        DVector::from_column_slice(&[
            phi(-1.0, -1.0, xi),
            phi( 1.0, -1.0, xi),
            phi( 1.0,  1.0, xi),
            phi(-1.0,  1.0, xi),
        ])
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn gradients(&self, xi: &Point2<T>) -> OMatrix<T, U2, Dyn> {
        let phi_grad = |alpha, beta, xi: &Point2<T>|
            Vector2::new(
                alpha * (1.0 + beta * xi[1]) / 4.0,
                beta * (1.0 + alpha * xi[0]) / 4.0,
            );

        OMatrix::<T, U2, Dyn>::from_columns(&[
            phi_grad(-1.0, -1.0, xi),
            phi_grad( 1.0, -1.0, xi),
            phi_grad( 1.0,  1.0, xi),
            phi_grad(-1.0,  1.0, xi),
        ])
    }

    fn reference_jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        self.vertex_matrix() * self.gradients(xi).transpose()
    }

    fn map_reference_coords(&self, xi: &Point2<T>) -> Point2<T> {
        OPoint::from(self.vertex_matrix() * self.evaluate_basis(xi))
    }

    fn diameter(&self) -> T {
        self.vertices
            .iter()
            .tuple_combinations()
            .map(|(x, y)| (y - x).norm())
            .fold(T::zero(), |a, b| a.max(b))
    }

    fn num_faces(&self) -> usize {
        4
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn face_quadrature(&self, face: usize, num_points: usize) -> Option<Vec<FaceQuadraturePoint<T, U2>>> {
        if face >= 4 {
            return None;
        }
        let start = reference_vertex::<T>(face);
        let end = reference_vertex::<T>(face + 1);
        let (weights, points) = gauss::<T>(num_points);
        let points = weights
            .into_iter()
            .zip(points)
            .map(|(w, s)| {
                // Map s in [-1, 1] onto the reference edge
                let xi = Point2::from(&start * ((1.0 - s[0]) / 2.0) + &end * ((1.0 + s[0]) / 2.0));
                let tangent = self.reference_jacobian(&xi) * (&end - &start) / 2.0;
                let length = tangent.norm();
                FaceQuadraturePoint {
                    reference_coords: xi,
                    weight: w * length,
                    // Outward for counter-clockwise vertex ordering
                    normal: Vector2::new(tangent[1], -tangent[0]) / length,
                }
            })
            .collect();
        Some(points)
    }
}

impl<T> ElementConnectivity<T> for Quad4d2Connectivity
where
    T: Real,
{
    type GeometryDim = U2;
    type Element = Quad4d2Element<T>;

    fn element(&self, vertices: &[Point2<T>]) -> Option<Self::Element> {
        let Self(indices) = self;
        Some(Quad4d2Element::from_vertices([
            *vertices.get(indices[0])?,
            *vertices.get(indices[1])?,
            *vertices.get(indices[2])?,
            *vertices.get(indices[3])?,
        ]))
    }
}
