//! Solver boundary for ModelForge.
//!
//! Models never solve in-process: they serialize to statement form and go
//! through a [`SolverBackend`], which hides the transport. [`solve`] wires
//! the round trip together: serialize, submit with [`SolverOptions`], and
//! write the [`SolveResponse`] back onto the session's entities.

pub mod backend;
pub mod error;
pub mod options;
pub mod response;
pub mod solve;

pub use backend::{SolverBackend, SubmitRequest};
pub use error::{Result, SolverError};
pub use options::SolverOptions;
pub use response::{ConRecord, SolveResponse, SolveStatus, VarRecord};
pub use solve::solve;
