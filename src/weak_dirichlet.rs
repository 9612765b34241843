//! Weakly enforced Dirichlet conditions for the advection-diffusion equation.
use crate::allocators::DimAllocator;
use crate::config::WeakDirichletConfig;
use crate::element_info::ElementInfo;
use crate::field::{ScalarField, VectorField};
use crate::fluid::FluidProperties;
use crate::integrand::{BoundaryIntegrand, BoundaryPoint, ElementContext, Integrand, IntegrandError};
use crate::{Real, SmallDim};
use itertools::Itertools;
use nalgebra::{convert, DefaultAllocator, OPoint, OVector};
use numeric_literals::replace_float_literals;
use std::fmt;
use std::fmt::{Debug, Formatter};

/// Computes the diameter of a point set, i.e. the largest distance between any two points.
pub fn diameter<T, D>(points: &[OPoint<T, D>]) -> T
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    points
        .iter()
        .tuple_combinations()
        .map(|(x, y)| (y - x).norm())
        .fold(T::zero(), |a, b| a.max(b))
}

/// Nitsche-type boundary integrand enforcing $u = g$ on the boundary.
///
/// At each boundary point with outward normal $\vec n$ and $u_n^- = \min(\vec U \cdot \vec n, 0)$
/// it adds
///
/// $$ A_{ij} \mathrel{+}= \left( - N_i \kappa \nabla N_j \cdot \vec n
///     - \gamma \kappa \nabla N_i \cdot \vec n N_j - u_n^- N_i N_j
///     + \frac{C_{BI} \kappa}{h_K} N_i N_j \right) d\Gamma, $$
///
/// $$ b_i \mathrel{+}= \left( - \gamma \kappa \nabla N_i \cdot \vec n g - u_n^- N_i g
///     + \frac{C_{BI} \kappa}{h_K} N_i g \right) d\Gamma, $$
///
/// where $h_K$ is the diameter of the element adjacent to the boundary. With $\gamma = 1$ the
/// diffusive part is symmetric and adjoint consistent.
pub struct WeakDirichlet<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    cbi: T,
    gamma: T,
    advection: Option<&'a dyn VectorField<T, D>>,
    datum: Option<&'a dyn ScalarField<T, D>>,
    properties: FluidProperties<T>,
}

impl<'a, T, D> Debug for WeakDirichlet<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakDirichlet")
            .field("cbi", &self.cbi)
            .field("gamma", &self.gamma)
            .field("advection", &self.advection.is_some())
            .field("datum", &self.datum.is_some())
            .field("properties", &self.properties)
            .finish()
    }
}

impl<'a, T, D> Default for WeakDirichlet<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn default() -> Self {
        Self::new(4.0, 1.0)
    }
}

impl<'a, T, D> WeakDirichlet<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn new(cbi: T, gamma: T) -> Self {
        Self {
            cbi,
            gamma,
            advection: None,
            datum: None,
            properties: FluidProperties::default(),
        }
    }

    pub fn from_config(config: &WeakDirichletConfig) -> Self {
        Self::new(convert(config.cbi), convert(config.gamma))
            .with_fluid_properties(FluidProperties::new(convert(config.density), convert(config.diffusivity)))
    }

    pub fn with_advection(mut self, advection: &'a dyn VectorField<T, D>) -> Self {
        self.advection = Some(advection);
        self
    }

    /// Sets the prescribed boundary value $g$. An unset datum means $g = 0$.
    pub fn with_datum(mut self, datum: &'a dyn ScalarField<T, D>) -> Self {
        self.datum = Some(datum);
        self
    }

    pub fn with_fluid_properties(mut self, properties: FluidProperties<T>) -> Self {
        self.properties = properties;
        self
    }

    pub fn set_advection(&mut self, advection: Option<&'a dyn VectorField<T, D>>) {
        self.advection = advection;
    }

    pub fn set_datum(&mut self, datum: Option<&'a dyn ScalarField<T, D>>) {
        self.datum = datum;
    }

    pub fn cbi(&self) -> T {
        self.cbi
    }

    pub fn gamma(&self) -> T {
        self.gamma
    }

    pub fn fluid_properties(&self) -> &FluidProperties<T> {
        &self.properties
    }

    pub fn fluid_properties_mut(&mut self) -> &mut FluidProperties<T> {
        &mut self.properties
    }

    fn advection_at(&self, x: &OPoint<T, D>) -> OVector<T, D> {
        self.advection
            .map(|field| field.evaluate(x))
            .unwrap_or_else(OVector::<T, D>::zeros)
    }

    fn datum_at(&self, x: &OPoint<T, D>) -> T {
        self.datum.map(|field| field.evaluate(x)).unwrap_or_else(T::zero)
    }
}

impl<'a, T, D> Integrand<T, D> for WeakDirichlet<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    type Local = ElementInfo<T, D>;

    fn local_integral(&self, num_nodes: usize, _neumann: bool) -> Result<Self::Local, IntegrandError> {
        if num_nodes == 0 {
            return Err(IntegrandError::ZeroNodeCount);
        }
        Ok(ElementInfo::new(num_nodes, true, false))
    }

    fn init_element(&self, local: &mut Self::Local, element: &ElementContext<T, D>) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        if !element.nodes.is_empty() && element.nodes.len() != local.num_nodes() {
            return Err(IntegrandError::SizeMismatch {
                expected: local.num_nodes(),
                actual: element.nodes.len(),
            });
        }
        local.element_index = element.index;
        local.set_element_size(diameter(element.corners));
        Ok(())
    }

    fn has_interior_terms(&self) -> bool {
        false
    }
}

impl<'a, T, D> BoundaryIntegrand<T, D> for WeakDirichlet<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn evaluate_boundary(&self, local: &mut Self::Local, point: &BoundaryPoint<T, D>) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        let fe = &point.point;
        let n = local.num_nodes();
        if fe.num_nodes() != n {
            return Err(IntegrandError::SizeMismatch {
                expected: n,
                actual: fe.num_nodes(),
            });
        }
        if point.normal.norm_squared() == T::zero() {
            return Err(IntegrandError::DegenerateNormal);
        }

        let x = &fe.coords;
        let w = fe.weight;
        let kappa = self.properties.diffusivity;
        let hk = local.element_size();
        let g = self.datum_at(x);
        let u = self.advection_at(x);
        let inflow = u.dot(&point.normal).min(T::zero());
        let penalty = self.cbi * kappa / hk;

        let phi = &fe.basis;
        // grad N_j . n
        let normal_derivatives = fe.advective_derivatives(&point.normal);

        if let Some(a) = local.matrices.a.as_mut() {
            // Consistency
            a.ger(-kappa * w, phi, &normal_derivatives, T::one());
            // Adjoint
            a.ger(-self.gamma * kappa * w, &normal_derivatives, phi, T::one());
            // Inflow and penalty
            a.ger((penalty - inflow) * w, phi, phi, T::one());
        }
        let b = &mut local.matrices.b;
        b.axpy(-self.gamma * kappa * g * w, &normal_derivatives, T::one());
        b.axpy((penalty - inflow) * g * w, phi, T::one());

        Ok(())
    }
}
