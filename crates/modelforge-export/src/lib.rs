//! Serializers for ModelForge models.
//!
//! Two output forms cover the two solver entry points:
//!
//! * [`to_statements`] renders the declarative statement language the
//!   optimization server executes, preserving abstract structure (`sum {i
//!   in S}`, qualified group declarations) for server-side resolution.
//! * [`to_matrix`] flattens a fully concrete linear model into a sparse
//!   column/row/coefficient form for matrix-based APIs, rejecting anything
//!   symbolic or nonlinear.

pub mod error;
pub mod matrix;
pub mod statement;

pub use error::{ExportError, Result};
pub use matrix::{to_matrix, MatrixColumn, MatrixEntry, MatrixProblem, MatrixRow};
pub use statement::{fmt_num, render_expression, solve_sense, to_statements};
