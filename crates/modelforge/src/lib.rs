//! ModelForge - an algebraic modeling layer.
//!
//! Build optimization models from symbolic expressions over named
//! entities, keep them abstract where the data lives server-side, and
//! serialize to either the declarative statement language or sparse-matrix
//! interchange form.
//!
//! # Example
//!
//! ```rust
//! use modelforge::prelude::*;
//!
//! let mut sess = Session::new();
//! let m = sess.add_model(Some("knapsack"));
//! let take = sess.add_variables(
//!     &[Domain::values(["hammer", "wrench", "screwdriver"])],
//!     VarSpec::new().named("take").binary(),
//! );
//! let weight = sess.sum_of(take, &[QueryIndex::Wild]);
//! let cap = sess.add_constraint(weight.le(2.0), Some("cap")).unwrap();
//! sess.include(m, EntityRef::VariableGroup(take)).unwrap();
//! sess.include(m, EntityRef::Constraint(cap)).unwrap();
//! assert!(to_statements(&sess, m).contains("var take {{'hammer','wrench','screwdriver'}} binary;"));
//! ```

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

pub use modelforge_core::{
    key, Bound, BoundAttr, Compare, CondOp, Condition, ConSense, Constraint, ConstraintGroup,
    ConstraintSpec, Domain, ElementType, EntityRef, Expression, ImplicitVar, IndexValue, Key,
    Model, ModelForgeError, ObjSense, Objective, Parameter, ParameterGroup, QueryIndex,
    ReadColumn, ReadData, Session, Set, SetIterator, SetSpec, Statement, StatementKind, VarSpec,
    VarType, Variable, VariableGroup,
};
pub use modelforge_export::{
    to_matrix, to_statements, ExportError, MatrixColumn, MatrixEntry, MatrixProblem, MatrixRow,
};
pub use modelforge_solver::{
    solve, ConRecord, SolveResponse, SolveStatus, SolverBackend, SolverError, SolverOptions,
    SubmitRequest, VarRecord,
};

/// Everything needed for typical model building.
pub mod prelude {
    pub use modelforge_core::{
        key, Compare, Condition, Domain, ElementType, EntityRef, Expression, IndexValue, ObjSense,
        QueryIndex, Session, SetSpec, StatementKind, VarSpec,
    };
    pub use modelforge_export::{to_matrix, to_statements};
    pub use modelforge_solver::{solve, SolveStatus, SolverBackend, SolverOptions};
}

static INIT: OnceLock<()> = OnceLock::new();

/// Initializes logging for model-building sessions.
///
/// Safe to call multiple times; only the first call has effect. Reads
/// `RUST_LOG`, defaulting to `info` for the modelforge crates.
pub fn init_logging() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("modelforge=info,modelforge_core=info,modelforge_solver=info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    });
}
