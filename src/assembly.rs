//! Element loops driving the integrands over a mesh.
//!
//! [`local`] integrates a single element, [`global`] runs the element loop in parallel and
//! collects element matrices into global sparse matrices.
pub mod global;
pub mod local;
