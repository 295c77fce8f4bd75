//! The submit boundary.

use modelforge_export::MatrixProblem;

use crate::error::Result;
use crate::options::SolverOptions;
use crate::response::SolveResponse;

/// A serialized model ready for submission.
#[derive(Debug, Clone, Copy)]
pub struct SubmitRequest<'a> {
    /// Model name.
    pub name: &'a str,
    /// Statement-form model text.
    pub statements: &'a str,
    /// Sparse-matrix form, present when the options requested it.
    pub matrix: Option<&'a MatrixProblem>,
    /// Options to forward.
    pub options: &'a SolverOptions,
}

/// A solver backend: anything that can execute statement-form models.
///
/// Implementations own their transport (in-process solver, HTTP service,
/// test script); the boundary is a single synchronous call.
pub trait SolverBackend {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Executes a serialized model and returns its solution.
    fn submit(&mut self, request: SubmitRequest<'_>) -> Result<SolveResponse>;
}
