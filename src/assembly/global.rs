//! Parallel element loops and assembly into global sparse matrices.
use crate::allocators::DimAllocator;
use crate::assembly::local::{integrate_element_face, integrate_element_interior};
use crate::element::{ElementConnectivity, FiniteElement};
use crate::element_info::ElementMatrices;
use crate::integrand::{BoundaryIntegrand, ElementContext, FinalizeElement, InteriorIntegrand};
use crate::mesh::{BoundaryFace, Mesh};
use crate::norm::{AdvectionDiffusionNorm, NormInfo};
use crate::quadrature::Quadrature;
use crate::Real;
use eyre::{eyre, WrapErr};
use log::{debug, trace};
use nalgebra::{DMatrix, DVector, DVectorView, DefaultAllocator, OPoint, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::prelude::*;

/// Copies the entries of `global` referenced by `indices` into `local`.
///
/// # Panics
///
/// Panics if an index is out of bounds for `global`, or if `local` and `indices` differ in length.
pub fn gather_global_to_local<'a, T: Scalar>(
    global: impl Into<DVectorView<'a, T>>,
    local: &mut DVector<T>,
    indices: &[usize],
) {
    let global = global.into();
    assert_eq!(local.len(), indices.len(), "Local vector must have one entry per index");
    for (i_local, &i_global) in indices.iter().enumerate() {
        local[i_local] = global[i_global].clone();
    }
}

/// Global matrices and load vector assembled from element contributions.
#[derive(Debug, Clone)]
pub struct AssembledSystem<T: Scalar> {
    pub matrix: Option<CsrMatrix<T>>,
    pub mass: Option<CsrMatrix<T>>,
    pub rhs: DVector<T>,
}

/// Element matrices tagged with the global node indices of the element.
type ScatterItem<Local> = (Vec<usize>, Local);

fn scatter<T, Local>(num_nodes: usize, elements: &[ScatterItem<Local>]) -> AssembledSystem<T>
where
    T: Real,
    Local: AsRef<ElementMatrices<T>>,
{
    let has_matrix = elements.iter().any(|(_, local)| local.as_ref().a.is_some());
    let has_mass = elements.iter().any(|(_, local)| local.as_ref().m.is_some());
    let mut matrix = has_matrix.then(|| CooMatrix::new(num_nodes, num_nodes));
    let mut mass = has_mass.then(|| CooMatrix::new(num_nodes, num_nodes));
    let mut rhs = DVector::zeros(num_nodes);

    let scatter_matrix = |coo: &mut CooMatrix<T>, nodes: &[usize], local: &DMatrix<T>| {
        for (i_local, &i) in nodes.iter().enumerate() {
            for (j_local, &j) in nodes.iter().enumerate() {
                coo.push(i, j, local[(i_local, j_local)]);
            }
        }
    };

    for (nodes, local) in elements {
        let matrices = local.as_ref();
        if let (Some(coo), Some(a)) = (matrix.as_mut(), matrices.a.as_ref()) {
            scatter_matrix(coo, nodes, a);
        }
        if let (Some(coo), Some(m)) = (mass.as_mut(), matrices.m.as_ref()) {
            scatter_matrix(coo, nodes, m);
        }
        for (i_local, &i) in nodes.iter().enumerate() {
            rhs[i] += matrices.b[i_local];
        }
    }

    AssembledSystem {
        matrix: matrix.as_ref().map(CsrMatrix::from),
        mass: mass.as_ref().map(CsrMatrix::from),
        rhs,
    }
}

/// Runs the interior element loop in parallel and returns the finalized element containers.
///
/// `prepare` is called on each container after all quadrature points have been evaluated and
/// before the element is finalized.
fn integrate_interior<T, C, I, F>(
    mesh: &Mesh<T, C::GeometryDim, C>,
    integrand: &I,
    quadrature: &(impl Quadrature<T, C::GeometryDim> + Sync),
    prepare: F,
) -> eyre::Result<Vec<ScatterItem<I::Local>>>
where
    T: Real,
    C: ElementConnectivity<T>,
    I: InteriorIntegrand<T, C::GeometryDim> + FinalizeElement<T, C::GeometryDim> + Sync,
    I::Local: Send,
    F: Fn(usize, &mut I::Local) + Sync,
    OPoint<T, C::GeometryDim>: Sync,
    DefaultAllocator: DimAllocator<T, C::GeometryDim>,
{
    mesh.connectivity()
        .par_iter()
        .enumerate()
        .map(|(index, conn)| {
            let element = conn
                .element(mesh.vertices())
                .ok_or_else(|| eyre!("Element {index} references vertices out of bounds"))?;
            let nodes = conn.vertex_indices();
            let context = ElementContext {
                index,
                nodes,
                corners: element.vertices(),
            };
            let mut local = integrand
                .local_integral(nodes.len(), false)
                .wrap_err_with(|| format!("Failed to create local integral for element {index}"))?;
            integrand
                .init_element(&mut local, &context)
                .wrap_err_with(|| format!("Failed to initialize element {index}"))?;
            if integrand.has_interior_terms() {
                integrate_element_interior(integrand, &mut local, &element, quadrature)
                    .wrap_err_with(|| format!("Failed to integrate element {index}"))?;
            }
            prepare(index, &mut local);
            integrand
                .finalize_element(&mut local)
                .wrap_err_with(|| format!("Failed to finalize element {index}"))?;
            trace!("Integrated element {index}");
            Ok((nodes.to_vec(), local))
        })
        .collect()
}

/// Assembles the global system of an interior integrand over all elements of the mesh.
///
/// The element loop runs in parallel. Each element is finalized before its matrices are
/// added to the global system.
pub fn assemble_system<T, C, I>(
    mesh: &Mesh<T, C::GeometryDim, C>,
    integrand: &I,
    quadrature: &(impl Quadrature<T, C::GeometryDim> + Sync),
) -> eyre::Result<AssembledSystem<T>>
where
    T: Real,
    C: ElementConnectivity<T>,
    I: InteriorIntegrand<T, C::GeometryDim> + FinalizeElement<T, C::GeometryDim> + Sync,
    I::Local: AsRef<ElementMatrices<T>> + Send,
    OPoint<T, C::GeometryDim>: Sync,
    DefaultAllocator: DimAllocator<T, C::GeometryDim>,
{
    let elements = integrate_interior(mesh, integrand, quadrature, |_, _| {})?;
    let system = scatter(mesh.num_vertices(), &elements);
    debug!(
        "Assembled {} elements into a system with {} unknowns",
        elements.len(),
        mesh.num_vertices()
    );
    Ok(system)
}

/// Assembles the contributions of a boundary integrand on the given boundary faces.
///
/// With `neumann` set, the element containers are requested for a Neumann pass, which
/// only carries load vector contributions.
pub fn assemble_boundary_system<T, C, I>(
    mesh: &Mesh<T, C::GeometryDim, C>,
    integrand: &I,
    faces: &[BoundaryFace],
    num_points: usize,
    neumann: bool,
) -> eyre::Result<AssembledSystem<T>>
where
    T: Real,
    C: ElementConnectivity<T>,
    I: BoundaryIntegrand<T, C::GeometryDim> + Sync,
    I::Local: AsRef<ElementMatrices<T>> + Send,
    OPoint<T, C::GeometryDim>: Sync,
    DefaultAllocator: DimAllocator<T, C::GeometryDim>,
{
    let elements = faces
        .par_iter()
        .map(|face| {
            let index = face.element_index;
            let conn = mesh
                .connectivity()
                .get(index)
                .ok_or_else(|| eyre!("Boundary face refers to element {index}, which does not exist"))?;
            let element = conn
                .element(mesh.vertices())
                .ok_or_else(|| eyre!("Element {index} references vertices out of bounds"))?;
            let nodes = conn.vertex_indices();
            let context = ElementContext {
                index,
                nodes,
                corners: element.vertices(),
            };
            let mut local = integrand
                .local_integral(nodes.len(), neumann)
                .wrap_err_with(|| format!("Failed to create local integral for element {index}"))?;
            integrand
                .init_element(&mut local, &context)
                .wrap_err_with(|| format!("Failed to initialize element {index}"))?;
            integrate_element_face(integrand, &mut local, &element, face.local_face, num_points)
                .wrap_err_with(|| format!("Failed to integrate face {} of element {index}", face.local_face))?;
            Ok((nodes.to_vec(), local))
        })
        .collect::<eyre::Result<Vec<_>>>()?;
    debug!("Assembled {} boundary faces", elements.len());
    Ok(scatter(mesh.num_vertices(), &elements))
}

/// Computes the element norms of a discrete solution.
///
/// If `error_estimates` is given, it must hold one estimate per element, which is used for
/// the element effectivity indices.
pub fn compute_element_norms<T, C>(
    mesh: &Mesh<T, C::GeometryDim, C>,
    norm: &AdvectionDiffusionNorm<T, C::GeometryDim>,
    quadrature: &(impl Quadrature<T, C::GeometryDim> + Sync),
    error_estimates: Option<&[T]>,
) -> eyre::Result<Vec<NormInfo<T>>>
where
    T: Real,
    C: ElementConnectivity<T>,
    OPoint<T, C::GeometryDim>: Sync,
    DefaultAllocator: DimAllocator<T, C::GeometryDim>,
{
    if let Some(estimates) = error_estimates {
        if estimates.len() != mesh.num_elements() {
            return Err(eyre!(
                "Expected {} element error estimates, got {}",
                mesh.num_elements(),
                estimates.len()
            ));
        }
    }
    let elements = integrate_interior(mesh, norm, quadrature, |index, local: &mut NormInfo<T>| {
        if let Some(estimates) = error_estimates {
            local.set_error_estimate(estimates[index]);
        }
    })?;
    Ok(elements.into_iter().map(|(_, local)| local).collect())
}

/// Prescribes `values` at the given `nodes` by replacing the corresponding rows of the system
/// with identity rows.
///
/// The columns are left untouched, so the matrix does not stay symmetric.
pub fn apply_dirichlet_bc<T: Real>(
    matrix: &mut CsrMatrix<T>,
    rhs: &mut DVector<T>,
    nodes: &[usize],
    values: &[T],
) -> eyre::Result<()> {
    if nodes.len() != values.len() {
        return Err(eyre!(
            "Expected one Dirichlet value per node, got {} nodes and {} values",
            nodes.len(),
            values.len()
        ));
    }
    for (&node, &value) in nodes.iter().zip(values) {
        if node >= matrix.nrows() {
            return Err(eyre!("Dirichlet node {node} out of bounds for {} rows", matrix.nrows()));
        }
        let mut row = matrix.row_mut(node);
        let (cols, row_values) = row.cols_and_values_mut();
        let mut has_diagonal = false;
        for (&col, entry) in cols.iter().zip(row_values) {
            if col == node {
                *entry = T::one();
                has_diagonal = true;
            } else {
                *entry = T::zero();
            }
        }
        if !has_diagonal {
            return Err(eyre!("Row {node} has no diagonal entry in the sparsity pattern"));
        }
        rhs[node] = value;
    }
    Ok(())
}

/// Adds the matrices and load vectors of two systems of the same size.
pub fn add_systems<T: Real>(a: AssembledSystem<T>, b: &AssembledSystem<T>) -> eyre::Result<AssembledSystem<T>> {
    if a.rhs.len() != b.rhs.len() {
        return Err(eyre!("Cannot add systems with {} and {} unknowns", a.rhs.len(), b.rhs.len()));
    }
    let add = |x: Option<CsrMatrix<T>>, y: &Option<CsrMatrix<T>>| match (x, y) {
        (Some(x), Some(y)) => Some(x + y),
        (x, None) => x,
        (None, Some(y)) => Some(y.clone()),
    };
    Ok(AssembledSystem {
        matrix: add(a.matrix, &b.matrix),
        mass: add(a.mass, &b.mass),
        rhs: a.rhs + &b.rhs,
    })
}
