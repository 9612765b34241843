use advection_diffusion::assembly::global::AssembledSystem;
use eyre::eyre;
use nalgebra::{DMatrix, DVector};


/// Solves the assembled system with a dense LU factorization.
pub fn solve_dense(system: &AssembledSystem<f64>) -> eyre::Result<DVector<f64>> {
    let matrix = system
        .matrix
        .as_ref()
        .ok_or_else(|| eyre!("System has no matrix"))?;
    DMatrix::from(matrix)
        .lu()
        .solve(&system.rhs)
        .ok_or_else(|| eyre!("Failed to solve linear system: matrix is singular"))
}
