//! Element-local containers receiving integrand contributions.
use crate::allocators::DimAllocator;
use crate::integrand::IntegrandError;
use crate::stabilization::compute_tau;
use crate::{Real, SmallDim};
use nalgebra::allocator::Allocator;
use nalgebra::{DMatrix, DVector, DefaultAllocator, DimName, OVector, Scalar};

/// Element matrices and vectors: the stiffness-like matrix $A$, the mass-like matrix $M$
/// and the load vector $b$.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMatrices<T: Scalar> {
    pub a: Option<DMatrix<T>>,
    pub m: Option<DMatrix<T>>,
    pub b: DVector<T>,
}

impl<T: Real> ElementMatrices<T> {
    /// Creates zeroed matrices for an element with `num_nodes` nodes.
    ///
    /// `lhs` requests the stiffness matrix, `mass` the mass matrix.
    pub fn new(num_nodes: usize, lhs: bool, mass: bool) -> Self {
        Self {
            a: lhs.then(|| DMatrix::zeros(num_nodes, num_nodes)),
            m: (lhs && mass).then(|| DMatrix::zeros(num_nodes, num_nodes)),
            b: DVector::zeros(num_nodes),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.b.len()
    }

    pub fn stiffness(&self) -> Option<&DMatrix<T>> {
        self.a.as_ref()
    }

    pub fn mass(&self) -> Option<&DMatrix<T>> {
        self.m.as_ref()
    }

    pub fn load(&self) -> &DVector<T> {
        &self.b
    }
}

impl<T: Scalar> AsRef<ElementMatrices<T>> for ElementMatrices<T> {
    fn as_ref(&self) -> &ElementMatrices<T> {
        self
    }
}

/// Lifecycle of an [`ElementInfo`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ElementState<T> {
    /// Quadrature point contributions are being accumulated.
    Accumulating,
    /// Stabilization terms have been scaled by `tau` and folded into the element matrices.
    Finalized { tau: T },
}

/// Element-local container of the advection-diffusion integrands.
///
/// Besides the element matrices it carries the unscaled stabilization terms, the
/// integrated advection velocity and element measure, and the element size. All
/// accumulators start at zero and only grow until the element is finalized, at which point
/// the stabilization terms are scaled by the element stabilization parameter and added to
/// the element matrices.
#[derive(Debug, Clone)]
pub struct ElementInfo<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    pub(crate) matrices: ElementMatrices<T>,
    pub(crate) stabilized_matrix: DMatrix<T>,
    pub(crate) stabilized_mass: Option<DMatrix<T>>,
    pub(crate) stabilized_vector: DVector<T>,
    pub(crate) velocity_integral: OVector<T, D>,
    pub(crate) measure: T,
    pub(crate) element_size: T,
    pub(crate) prescribed_size: bool,
    pub(crate) element_index: usize,
    pub(crate) state: ElementState<T>,
}

impl<T, D> ElementInfo<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn new(num_nodes: usize, lhs: bool, mass: bool) -> Self {
        let matrices = ElementMatrices::new(num_nodes, lhs, mass);
        let stabilized_mass = matrices.m.as_ref().map(|_| DMatrix::zeros(num_nodes, num_nodes));
        Self {
            matrices,
            stabilized_matrix: DMatrix::zeros(num_nodes, num_nodes),
            stabilized_mass,
            stabilized_vector: DVector::zeros(num_nodes),
            velocity_integral: OVector::<T, D>::zeros(),
            measure: T::zero(),
            element_size: T::zero(),
            prescribed_size: false,
            element_index: 0,
            state: ElementState::Accumulating,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.matrices.num_nodes()
    }

    pub fn matrices(&self) -> &ElementMatrices<T> {
        &self.matrices
    }

    /// The element matrices with the stabilization terms folded in.
    pub fn finalized_matrices(&self) -> Result<&ElementMatrices<T>, IntegrandError> {
        match self.state {
            ElementState::Accumulating => Err(IntegrandError::NotFinalized),
            ElementState::Finalized { .. } => Ok(&self.matrices),
        }
    }

    pub fn into_matrices(self) -> ElementMatrices<T> {
        self.matrices
    }

    /// The unscaled stabilization matrix (`eMs`).
    pub fn stabilized_matrix(&self) -> &DMatrix<T> {
        &self.stabilized_matrix
    }

    /// The unscaled stabilization contribution to the mass matrix.
    pub fn stabilized_mass(&self) -> Option<&DMatrix<T>> {
        self.stabilized_mass.as_ref()
    }

    /// The unscaled stabilization load vector (`eSs`).
    pub fn stabilized_vector(&self) -> &DVector<T> {
        &self.stabilized_vector
    }

    /// The element measure accumulated from the visited quadrature points.
    pub fn measure(&self) -> T {
        self.measure
    }

    /// The mean advection velocity over the element.
    pub fn mean_velocity(&self) -> OVector<T, D> {
        if self.measure > T::zero() {
            &self.velocity_integral / self.measure
        } else {
            OVector::<T, D>::zeros()
        }
    }

    /// The characteristic element size $h_K$.
    pub fn element_size(&self) -> T {
        self.element_size
    }

    /// Prescribes the element size, which is otherwise derived from the element measure.
    pub fn set_element_size(&mut self, size: T) {
        self.element_size = size;
        self.prescribed_size = true;
    }

    pub fn element_index(&self) -> usize {
        self.element_index
    }

    pub fn state(&self) -> ElementState<T> {
        self.state
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, ElementState::Finalized { .. })
    }

    /// The stabilization parameter used at finalization, if finalized.
    pub fn finalized_tau(&self) -> Option<T> {
        match self.state {
            ElementState::Accumulating => None,
            ElementState::Finalized { tau } => Some(tau),
        }
    }

    /// Computes the stabilization parameter from the element size and the mean advection
    /// velocity of the element.
    pub fn tau(&self, kappa: T, cinv: T, order: usize) -> T {
        compute_tau(kappa, cinv, order, self.element_size, self.mean_velocity().norm())
    }

    pub(crate) fn ensure_accumulating(&self) -> Result<(), IntegrandError> {
        match self.state {
            ElementState::Accumulating => Ok(()),
            ElementState::Finalized { .. } => Err(IntegrandError::AlreadyFinalized),
        }
    }

    /// Records the measure and advection velocity of one quadrature point and updates the
    /// running element size.
    pub(crate) fn accumulate_velocity(&mut self, velocity: &OVector<T, D>, weight: T) {
        self.velocity_integral.axpy(weight, velocity, T::one());
        self.measure += weight;
        if !self.prescribed_size {
            let d = T::from_usize(D::dim()).expect("Dimension must fit in T");
            self.element_size = self.measure.powf(T::one() / d);
        }
    }

    /// Scales the stabilization accumulators by `tau`, adds them to the element matrices and
    /// marks the element as finalized.
    pub(crate) fn fold_stabilization(&mut self, tau: T) -> Result<(), IntegrandError> {
        self.ensure_accumulating()?;
        if let Some(a) = self.matrices.a.as_mut() {
            *a += &self.stabilized_matrix * tau;
        }
        if let (Some(m), Some(stabilized_mass)) = (self.matrices.m.as_mut(), self.stabilized_mass.as_ref()) {
            *m += stabilized_mass * tau;
        }
        self.matrices.b.axpy(tau, &self.stabilized_vector, T::one());
        self.state = ElementState::Finalized { tau };
        Ok(())
    }
}

impl<T, D> AsRef<ElementMatrices<T>> for ElementInfo<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn as_ref(&self) -> &ElementMatrices<T> {
        &self.matrices
    }
}
