//! The advection-diffusion integrand with optional residual-based stabilization.
use crate::allocators::DimAllocator;
use crate::assembly::global::gather_global_to_local;
use crate::config::AdvectionDiffusionConfig;
use crate::element_info::ElementInfo;
use crate::field::{AnalyticalSolution, ScalarField, VectorField};
use crate::fluid::FluidProperties;
use crate::integrand::{
    check_node_indices, BoundaryIntegrand, BoundaryPoint, ElementContext, FinalizeElement, FiniteElementPoint, Integrand,
    IntegrandError, InteriorIntegrand,
};
use crate::norm::AdvectionDiffusionNorm;
use crate::stabilization::{Stabilization, TauCache};
use crate::{Real, SmallDim};
use log::debug;
use nalgebra::{convert, DVector, DVectorView, DefaultAllocator, OPoint, OVector};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Debug, Formatter};

/// Selects which element matrices are assembled during a solution phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionMode {
    /// Stiffness matrix and load vector.
    #[default]
    Static,
    /// Stiffness matrix, mass matrix and load vector.
    Dynamic,
    /// Load vector only.
    RhsOnly,
}

impl SolutionMode {
    pub fn assembles_matrices(&self) -> bool {
        !matches!(self, Self::RhsOnly)
    }

    pub fn assembles_mass(&self) -> bool {
        matches!(self, Self::Dynamic)
    }
}

/// Integrand of the advection-diffusion-reaction equation
///
/// $$ \rho \frac{\partial u}{\partial t} + \vec U \cdot \nabla u - \nabla \cdot (\kappa \nabla u) + r u = s. $$
///
/// At each interior point the Galerkin terms
///
/// $$ A_{ij} \mathrel{+}= \left(\kappa \nabla N_i \cdot \nabla N_j + N_i \vec U \cdot \nabla N_j + r N_i N_j\right) d\Omega,
///    \quad b_i \mathrel{+}= N_i s \, d\Omega, \quad M_{ij} \mathrel{+}= \rho N_i N_j \, d\Omega $$
///
/// are assembled. If stabilization is enabled, the stabilization terms are accumulated without
/// the stabilization parameter $\tau$, which depends on element-level quantities and is only
/// known once all points of the element have been visited. [`FinalizeElement::finalize_element`]
/// computes $\tau$, stores it in the per-element cache and adds the scaled stabilization terms
/// to the element matrices.
///
/// Advection, reaction, source and flux fields are borrowed from the caller. Fields that are
/// not set are zero.
pub struct AdvectionDiffusion<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    advection: Option<&'a dyn VectorField<T, D>>,
    reaction: Option<&'a dyn ScalarField<T, D>>,
    source: Option<&'a dyn ScalarField<T, D>>,
    flux: Option<&'a dyn ScalarField<T, D>>,
    tau_cache: TauCache,
    order: usize,
    properties: FluidProperties<T>,
    stabilization: Stabilization,
    cinv: T,
    mode: SolutionMode,
}

impl<'a, T, D> Debug for AdvectionDiffusion<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvectionDiffusion")
            .field("advection", &self.advection.is_some())
            .field("reaction", &self.reaction.is_some())
            .field("source", &self.source.is_some())
            .field("flux", &self.flux.is_some())
            .field("num_elements", &self.tau_cache.len())
            .field("order", &self.order)
            .field("properties", &self.properties)
            .field("stabilization", &self.stabilization)
            .field("cinv", &self.cinv)
            .field("mode", &self.mode)
            .finish()
    }
}

impl<'a, T, D> AdvectionDiffusion<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn new(stabilization: Stabilization) -> Self {
        Self {
            advection: None,
            reaction: None,
            source: None,
            flux: None,
            tau_cache: TauCache::default(),
            order: 1,
            properties: FluidProperties::default(),
            stabilization,
            cinv: 3.0,
            mode: SolutionMode::Static,
        }
    }

    pub fn from_config(config: &AdvectionDiffusionConfig) -> Self {
        let mut integrand = Self::new(config.stabilization)
            .with_cinv(convert(config.cinv))
            .with_order(config.order);
        integrand.properties = FluidProperties::new(convert(config.density), convert(config.diffusivity));
        integrand.mode = config.mode;
        integrand
    }

    pub fn with_advection(mut self, advection: &'a dyn VectorField<T, D>) -> Self {
        self.advection = Some(advection);
        self
    }

    pub fn with_reaction(mut self, reaction: &'a dyn ScalarField<T, D>) -> Self {
        self.reaction = Some(reaction);
        self
    }

    pub fn with_source(mut self, source: &'a dyn ScalarField<T, D>) -> Self {
        self.source = Some(source);
        self
    }

    /// Sets the prescribed boundary flux $\kappa \nabla u \cdot \vec n$ used on Neumann boundaries.
    pub fn with_flux(mut self, flux: &'a dyn ScalarField<T, D>) -> Self {
        self.flux = Some(flux);
        self
    }

    pub fn with_cinv(mut self, cinv: T) -> Self {
        self.cinv = cinv;
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_fluid_properties(mut self, properties: FluidProperties<T>) -> Self {
        self.properties = properties;
        self
    }

    pub fn set_advection(&mut self, advection: Option<&'a dyn VectorField<T, D>>) {
        self.advection = advection;
    }

    pub fn set_reaction(&mut self, reaction: Option<&'a dyn ScalarField<T, D>>) {
        self.reaction = reaction;
    }

    pub fn set_source(&mut self, source: Option<&'a dyn ScalarField<T, D>>) {
        self.source = source;
    }

    pub fn set_flux(&mut self, flux: Option<&'a dyn ScalarField<T, D>>) {
        self.flux = flux;
    }

    pub fn stabilization(&self) -> Stabilization {
        self.stabilization
    }

    pub fn set_stabilization(&mut self, stabilization: Stabilization) {
        self.stabilization = stabilization;
    }

    pub fn cinv(&self) -> T {
        self.cinv
    }

    pub fn set_cinv(&mut self, cinv: T) {
        self.cinv = cinv;
    }

    /// The polynomial order of the basis.
    pub fn order(&self) -> usize {
        self.order
    }

    pub fn set_order(&mut self, order: usize) {
        self.order = order;
    }

    pub fn mode(&self) -> SolutionMode {
        self.mode
    }

    /// Defines the solution mode for the subsequent assembly passes.
    pub fn set_mode(&mut self, mode: SolutionMode) {
        self.mode = mode;
    }

    /// Sizes the per-element stabilization parameter storage and resets it to zero.
    pub fn set_num_elements(&mut self, num_elements: usize) {
        self.tau_cache.resize(num_elements);
    }

    pub fn num_elements(&self) -> usize {
        self.tau_cache.len()
    }

    /// The stabilization parameter stored for the given element, or zero if the index is out
    /// of range.
    pub fn element_tau(&self, element_index: usize) -> T {
        self.tau_cache.get(element_index)
    }

    pub fn tau_cache(&self) -> &TauCache {
        &self.tau_cache
    }

    pub fn fluid_properties(&self) -> &FluidProperties<T> {
        &self.properties
    }

    pub fn fluid_properties_mut(&mut self) -> &mut FluidProperties<T> {
        &mut self.properties
    }

    /// Advances the integrand one time step. The integrand carries no history, so this is a no-op.
    pub fn advance_step(&mut self) {}

    pub fn advection_at(&self, x: &OPoint<T, D>) -> OVector<T, D> {
        self.advection
            .map(|field| field.evaluate(x))
            .unwrap_or_else(OVector::<T, D>::zeros)
    }

    pub fn reaction_at(&self, x: &OPoint<T, D>) -> T {
        self.reaction
            .map(|field| field.evaluate(x))
            .unwrap_or_else(T::zero)
    }

    pub fn source_at(&self, x: &OPoint<T, D>) -> T {
        self.source.map(|field| field.evaluate(x)).unwrap_or_else(T::zero)
    }

    pub fn flux_at(&self, x: &OPoint<T, D>) -> Option<T> {
        self.flux.map(|field| field.evaluate(x))
    }

    /// Number of primary (`field == 1`) or secondary (`field == 2`) solution components.
    pub fn num_fields(&self, field: usize) -> usize {
        if field > 1 {
            D::dim()
        } else {
            1
        }
    }

    pub fn field1_name(&self, prefix: Option<&str>) -> String {
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix} u"),
            _ => "u".to_string(),
        }
    }

    pub fn field2_name(&self, component: usize, prefix: Option<&str>) -> String {
        let name = match component {
            0 => "q_x".to_string(),
            1 => "q_y".to_string(),
            2 => "q_z".to_string(),
            _ => format!("q_{}", component + 1),
        };
        match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix} {name}"),
            _ => name,
        }
    }

    /// Computes the diffusive flux $\vec q = -\kappa \nabla u_h$ from element nodal values.
    pub fn compute_flux(&self, point: &FiniteElementPoint<T, D>, u_element: &DVector<T>) -> OVector<T, D> {
        point.interpolate_gradient(u_element) * (-self.properties.diffusivity)
    }

    /// Evaluates the secondary solution (the diffusive flux) at a result point, given the
    /// global node indices of the element and the global primary solution.
    pub fn evaluate_secondary(
        &self,
        point: &FiniteElementPoint<T, D>,
        nodes: &[usize],
        solution: &DVector<T>,
    ) -> Result<OVector<T, D>, IntegrandError> {
        if nodes.len() != point.num_nodes() {
            return Err(IntegrandError::SizeMismatch {
                expected: point.num_nodes(),
                actual: nodes.len(),
            });
        }
        check_node_indices(nodes, solution.len())?;
        let mut u_element = DVector::zeros(nodes.len());
        gather_global_to_local(DVectorView::from(solution), &mut u_element, nodes);
        Ok(self.compute_flux(point, &u_element))
    }

    /// Creates the norm integrand for the discrete solution `solution`, optionally measuring
    /// errors against an analytical solution.
    pub fn norm_integrand<'b>(
        &'b self,
        solution: &'b DVector<T>,
        analytical: Option<&'b dyn AnalyticalSolution<T, D>>,
    ) -> AdvectionDiffusionNorm<'b, T, D> {
        AdvectionDiffusionNorm::new(self, solution, analytical)
    }

    /// Scales the stabilization terms of the element by the given `tau`, stores it for the
    /// element and adds the terms to the element matrices.
    pub fn finalize_with_tau(&self, local: &mut ElementInfo<T, D>, tau: T) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        if self.stabilization.is_enabled() || !self.tau_cache.is_empty() {
            self.tau_cache.store(local.element_index, tau)?;
        }
        local.fold_stabilization(tau)
    }

    /// The weighting function of the stabilization method applied to each basis function.
    fn stabilization_weights(
        &self,
        point: &FiniteElementPoint<T, D>,
        advective: &DVector<T>,
        residual: &DVector<T>,
        reaction: T,
    ) -> Option<DVector<T>> {
        let kappa = self.properties.diffusivity;
        match self.stabilization {
            Stabilization::None => None,
            Stabilization::Supg => Some(advective.clone()),
            Stabilization::Gls => Some(residual.clone()),
            Stabilization::Ms => Some(DVector::from_fn(advective.len(), |i, _| {
                advective[i] + kappa * point.laplacian(i) - reaction * point.basis[i]
            })),
        }
    }
}

impl<'a, T, D> Integrand<T, D> for AdvectionDiffusion<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    type Local = ElementInfo<T, D>;

    fn local_integral(&self, num_nodes: usize, neumann: bool) -> Result<Self::Local, IntegrandError> {
        if num_nodes == 0 {
            return Err(IntegrandError::ZeroNodeCount);
        }
        let lhs = !neumann && self.mode.assembles_matrices();
        Ok(ElementInfo::new(num_nodes, lhs, self.mode.assembles_mass()))
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
        Ok(())
    }
}

impl<'a, T, D> InteriorIntegrand<T, D> for AdvectionDiffusion<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn evaluate_interior(
        &self,
        local: &mut Self::Local,
        point: &FiniteElementPoint<T, D>,
    ) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        let n = local.num_nodes();
        if point.num_nodes() != n {
            return Err(IntegrandError::SizeMismatch {
                expected: n,
                actual: point.num_nodes(),
            });
        }

        let x = &point.coords;
        let w = point.weight;
        let u = self.advection_at(x);
        let r = self.reaction_at(x);
        let s = self.source_at(x);
        let kappa = self.properties.diffusivity;
        let rho = self.properties.density;
        let phi = &point.basis;
        // U . grad N_j
        let advective = point.advective_derivatives(&u);

        if let Some(a) = local.matrices.a.as_mut() {
            a.gemm_tr(kappa * w, &point.gradients, &point.gradients, T::one());
            a.ger(w, phi, &advective, T::one());
            a.ger(r * w, phi, phi, T::one());
        }
        if let Some(m) = local.matrices.m.as_mut() {
            m.ger(rho * w, phi, phi, T::one());
        }
        local.matrices.b.axpy(s * w, phi, T::one());

        local.accumulate_velocity(&u, w);

        // L N_j = U . grad N_j - kappa lap N_j + r N_j
        let residual = DVector::from_fn(n, |j, _| advective[j] - kappa * point.laplacian(j) + r * phi[j]);
        if let Some(weights) = self.stabilization_weights(point, &advective, &residual, r) {
            local.stabilized_matrix.ger(w, &weights, &residual, T::one());
            if let Some(stabilized_mass) = local.stabilized_mass.as_mut() {
                stabilized_mass.ger(rho * w, &weights, phi, T::one());
            }
            local.stabilized_vector.axpy(s * w, &weights, T::one());
        }

        Ok(())
    }
}

impl<'a, T, D> BoundaryIntegrand<T, D> for AdvectionDiffusion<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Adds the Neumann contribution $b_i \mathrel{+}= N_i g \, d\Gamma$ of the prescribed flux $g$.
    fn evaluate_boundary(&self, local: &mut Self::Local, point: &BoundaryPoint<T, D>) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        let fe = &point.point;
        if fe.num_nodes() != local.num_nodes() {
            return Err(IntegrandError::SizeMismatch {
                expected: local.num_nodes(),
                actual: fe.num_nodes(),
            });
        }
        if let Some(g) = self.flux_at(&fe.coords) {
            local.matrices.b.axpy(g * fe.weight, &fe.basis, T::one());
        }
        Ok(())
    }
}

impl<'a, T, D> FinalizeElement<T, D> for AdvectionDiffusion<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn finalize_element(&self, local: &mut Self::Local) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        let tau = if self.stabilization.is_enabled() {
            local.tau(self.properties.diffusivity, self.cinv, self.order)
        } else {
            T::zero()
        };
        debug!(
            "Element {}: h = {:?}, tau = {:?}",
            local.element_index,
            local.element_size(),
            tau
        );
        self.finalize_with_tau(local, tau)
    }
}
