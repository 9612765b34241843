//! Energy and $L^2$ norms of the discrete solution and of its error against an analytical solution.
use crate::advection_diffusion::AdvectionDiffusion;
use crate::allocators::DimAllocator;
use crate::assembly::global::gather_global_to_local;
use crate::field::AnalyticalSolution;
use crate::integrand::{
    check_node_indices, ElementContext, FinalizeElement, FiniteElementPoint, Integrand, IntegrandError, InteriorIntegrand,
};
use crate::{Real, SmallDim};
use nalgebra::{DVector, DVectorView, DefaultAllocator, Scalar};
use serde::Serialize;
use std::fmt;
use std::fmt::{Debug, Formatter};

/// Number of norms in the group of discrete norms.
pub const NUM_DISCRETE_NORMS: usize = 3;
/// Number of norms in the group of norms involving the analytical solution.
pub const NUM_EXACT_NORMS: usize = 5;

/// Element-local container of [`AdvectionDiffusionNorm`].
///
/// All norms are stored squared. The discrete group holds
/// $a(u^h, u^h)$, $(u^h, u^h)$ and $\tau (\vec U \cdot \nabla u^h)^2$. The exact group, present
/// only with an analytical solution, holds $a(u, u)$, $a(e, e)$, $(e, e)$, $(u, u)$ and
/// $|e|^2_{H^1}$ with $e = u - u^h$.
#[derive(Debug, Clone, PartialEq)]
pub struct NormInfo<T: Scalar> {
    element_index: usize,
    solution: DVector<T>,
    discrete: [T; NUM_DISCRETE_NORMS],
    exact: Option<[T; NUM_EXACT_NORMS]>,
    tau: T,
    error_estimate: Option<T>,
    effectivity: Option<T>,
    finalized: bool,
}

impl<T: Real> NormInfo<T> {
    pub fn new(num_nodes: usize, with_exact: bool) -> Self {
        Self {
            element_index: 0,
            solution: DVector::zeros(num_nodes),
            discrete: [T::zero(); NUM_DISCRETE_NORMS],
            exact: with_exact.then(|| [T::zero(); NUM_EXACT_NORMS]),
            tau: T::zero(),
            error_estimate: None,
            effectivity: None,
            finalized: false,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.solution.len()
    }

    pub fn element_index(&self) -> usize {
        self.element_index
    }

    /// The discrete solution at the element nodes.
    pub fn element_solution(&self) -> &DVector<T> {
        &self.solution
    }

    pub fn discrete_norms_squared(&self) -> &[T; NUM_DISCRETE_NORMS] {
        &self.discrete
    }

    pub fn exact_norms_squared(&self) -> Option<&[T; NUM_EXACT_NORMS]> {
        self.exact.as_ref()
    }

    /// The stabilization parameter of the element, available after finalization.
    pub fn tau(&self) -> T {
        self.tau
    }

    /// Supplies an a posteriori estimate of the element energy error.
    pub fn set_error_estimate(&mut self, estimate: T) {
        self.error_estimate = Some(estimate);
    }

    pub fn error_estimate(&self) -> Option<T> {
        self.error_estimate
    }

    /// The ratio of the error estimate to the true energy error, if both are available.
    pub fn effectivity(&self) -> Option<T> {
        self.effectivity
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn ensure_accumulating(&self) -> Result<(), IntegrandError> {
        if self.finalized {
            Err(IntegrandError::AlreadyFinalized)
        } else {
            Ok(())
        }
    }
}

/// Norm integrand evaluating a discrete solution of an [`AdvectionDiffusion`] problem.
///
/// The energy density is that of the symmetric part of the primal bilinear form,
/// $a(v, v) = \int \kappa |\nabla v|^2 + r v^2 \, d\Omega$. The stabilization energy uses the
/// stabilization parameters stored by the primal integrand during assembly.
pub struct AdvectionDiffusionNorm<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    problem: &'a AdvectionDiffusion<'a, T, D>,
    solution: &'a DVector<T>,
    analytical: Option<&'a dyn AnalyticalSolution<T, D>>,
}

impl<'a, T, D> Debug for AdvectionDiffusionNorm<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvectionDiffusionNorm")
            .field("problem", &self.problem)
            .field("num_dofs", &self.solution.len())
            .field("analytical", &self.analytical.is_some())
            .finish()
    }
}

impl<'a, T, D> AdvectionDiffusionNorm<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn new(
        problem: &'a AdvectionDiffusion<'a, T, D>,
        solution: &'a DVector<T>,
        analytical: Option<&'a dyn AnalyticalSolution<T, D>>,
    ) -> Self {
        Self {
            problem,
            solution,
            analytical,
        }
    }

    pub fn has_analytical_solution(&self) -> bool {
        self.analytical.is_some()
    }

    /// Number of norm groups (`group == 0`) or number of norms in a group.
    ///
    /// The second group carries the effectivity index in its last slot.
    pub fn num_fields(&self, group: usize) -> usize {
        match group {
            0 => {
                if self.analytical.is_some() {
                    2
                } else {
                    1
                }
            }
            1 => NUM_DISCRETE_NORMS,
            2 if self.analytical.is_some() => NUM_EXACT_NORMS + 1,
            _ => 0,
        }
    }

    /// Name of norm `index` in `group` (both one-based groups, zero-based indices).
    pub fn name(&self, group: usize, index: usize, prefix: Option<&str>) -> Option<String> {
        let name = match (group, index) {
            (1, 0) => "a(u^h,u^h)^0.5",
            (1, 1) => "(u^h,u^h)^0.5",
            (1, 2) => "(tau U.grad u^h,U.grad u^h)^0.5",
            (2, 0) => "a(u,u)^0.5",
            (2, 1) => "a(e,e)^0.5, e=u-u^h",
            (2, 2) => "(e,e)^0.5, e=u-u^h",
            (2, 3) => "(u,u)^0.5",
            (2, 4) => "|e|_H1, e=u-u^h",
            (2, 5) => "effectivity index",
            _ => return None,
        };
        Some(match prefix {
            Some(prefix) if !prefix.is_empty() => format!("{prefix} {name}"),
            _ => name.to_string(),
        })
    }
}

impl<'a, T, D> Integrand<T, D> for AdvectionDiffusionNorm<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    type Local = NormInfo<T>;

    fn local_integral(&self, num_nodes: usize, _neumann: bool) -> Result<Self::Local, IntegrandError> {
        if num_nodes == 0 {
            return Err(IntegrandError::ZeroNodeCount);
        }
        Ok(NormInfo::new(num_nodes, self.analytical.is_some()))
    }

    fn init_element(&self, local: &mut Self::Local, element: &ElementContext<T, D>) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        if element.nodes.len() != local.num_nodes() {
            return Err(IntegrandError::SizeMismatch {
                expected: local.num_nodes(),
                actual: element.nodes.len(),
            });
        }
        check_node_indices(element.nodes, self.solution.len())?;
        gather_global_to_local(DVectorView::from(self.solution), &mut local.solution, element.nodes);
        local.element_index = element.index;
        Ok(())
    }
}

impl<'a, T, D> InteriorIntegrand<T, D> for AdvectionDiffusionNorm<'a, T, D>
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
        if point.num_nodes() != local.num_nodes() {
            return Err(IntegrandError::SizeMismatch {
                expected: local.num_nodes(),
                actual: point.num_nodes(),
            });
        }

        let x = &point.coords;
        let w = point.weight;
        let kappa = self.problem.fluid_properties().diffusivity;
        let r = self.problem.reaction_at(x);
        let energy = |v: T, grad_v_squared: T| kappa * grad_v_squared + r * v * v;

        let u_h = point.interpolate(&local.solution);
        let grad_u_h = point.interpolate_gradient(&local.solution);
        let tau = self.problem.element_tau(local.element_index);
        let advective = self.problem.advection_at(x).dot(&grad_u_h);

        local.discrete[0] += energy(u_h, grad_u_h.norm_squared()) * w;
        local.discrete[1] += u_h * u_h * w;
        local.discrete[2] += tau * advective * advective * w;

        if let (Some(analytical), Some(exact)) = (self.analytical, local.exact.as_mut()) {
            let u = analytical.value(x);
            let grad_u = analytical.gradient(x);
            let e = u - u_h;
            let grad_e = &grad_u - &grad_u_h;

            exact[0] += energy(u, grad_u.norm_squared()) * w;
            exact[1] += energy(e, grad_e.norm_squared()) * w;
            exact[2] += e * e * w;
            exact[3] += u * u * w;
            exact[4] += (e * e + grad_e.norm_squared()) * w;
        }

        Ok(())
    }
}

impl<'a, T, D> FinalizeElement<T, D> for AdvectionDiffusionNorm<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn finalize_element(&self, local: &mut Self::Local) -> Result<(), IntegrandError> {
        local.ensure_accumulating()?;
        local.tau = self.problem.element_tau(local.element_index);
        local.effectivity = match (local.error_estimate, local.exact.as_ref()) {
            (Some(estimate), Some(exact)) if exact[1] > T::zero() => Some(estimate / exact[1].sqrt()),
            _ => None,
        };
        local.finalized = true;
        Ok(())
    }
}

/// Global norms reduced from element contributions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalNorms<T: Scalar> {
    discrete: [T; NUM_DISCRETE_NORMS],
    exact: Option<[T; NUM_EXACT_NORMS]>,
    error_estimate: Option<T>,
    num_elements: usize,
}

impl<T: Real> Default for GlobalNorms<T> {
    fn default() -> Self {
        Self {
            discrete: [T::zero(); NUM_DISCRETE_NORMS],
            exact: None,
            error_estimate: None,
            num_elements: 0,
        }
    }
}

impl<T: Real> GlobalNorms<T> {
    pub fn from_elements<'b>(elements: impl IntoIterator<Item = &'b NormInfo<T>>) -> Self
    where
        T: 'b,
    {
        let mut norms = Self::default();
        for info in elements {
            norms.accumulate(info);
        }
        norms
    }

    /// Adds the contributions of a single element.
    pub fn accumulate(&mut self, info: &NormInfo<T>) {
        for (global, local) in self.discrete.iter_mut().zip(&info.discrete) {
            *global += *local;
        }
        if let Some(local_exact) = &info.exact {
            let exact = self.exact.get_or_insert([T::zero(); NUM_EXACT_NORMS]);
            for (global, local) in exact.iter_mut().zip(local_exact) {
                *global += *local;
            }
        }
        if let Some(estimate) = info.error_estimate {
            *self.error_estimate.get_or_insert_with(T::zero) += estimate * estimate;
        }
        self.num_elements += 1;
    }

    pub fn num_elements(&self) -> usize {
        self.num_elements
    }

    /// $a(u^h, u^h)^{1/2}$
    pub fn energy_norm(&self) -> T {
        self.discrete[0].sqrt()
    }

    /// $\|u^h\|_{L^2}$
    pub fn l2_norm(&self) -> T {
        self.discrete[1].sqrt()
    }

    pub fn stabilization_norm(&self) -> T {
        self.discrete[2].sqrt()
    }

    pub fn exact_energy_norm(&self) -> Option<T> {
        self.exact.map(|exact| exact[0].sqrt())
    }

    pub fn energy_error(&self) -> Option<T> {
        self.exact.map(|exact| exact[1].sqrt())
    }

    pub fn l2_error(&self) -> Option<T> {
        self.exact.map(|exact| exact[2].sqrt())
    }

    pub fn exact_l2_norm(&self) -> Option<T> {
        self.exact.map(|exact| exact[3].sqrt())
    }

    pub fn h1_error(&self) -> Option<T> {
        self.exact.map(|exact| exact[4].sqrt())
    }

    /// The energy error relative to the energy norm of the analytical solution.
    pub fn relative_energy_error(&self) -> Option<T> {
        let exact_norm = self.exact_energy_norm()?;
        let error = self.energy_error()?;
        (exact_norm > T::zero()).then(|| error / exact_norm)
    }

    /// The global error estimate $(\sum_K \eta_K^2)^{1/2}$, if element estimates were supplied.
    pub fn error_estimate(&self) -> Option<T> {
        self.error_estimate.map(|estimate| estimate.sqrt())
    }

    pub fn effectivity_index(&self) -> Option<T> {
        let estimate = self.error_estimate()?;
        let error = self.energy_error()?;
        (error > T::zero()).then(|| estimate / error)
    }
}
