//! Core model-building layer: entities, symbolic expressions, and the
//! naming registry.
//!
//! Everything revolves around a [`Session`]: it owns the arenas entities
//! live in, hands out cheap `Copy` handles, and keeps the name registry
//! that makes serialized output reproducible. Expressions are built with
//! ordinary operators over those handles, aggregations with
//! [`Session::sum_over`], relations with the [`Compare`] methods, and the
//! result is collected into [`Model`] containers for the serializers in
//! `modelforge-export`.
//!
//! ```
//! use modelforge_core::{Compare, Domain, EntityRef, ObjSense, QueryIndex, Session, VarSpec};
//!
//! let mut sess = Session::new();
//! let m = sess.add_model(Some("prod"));
//! let x = sess.add_variables(&[Domain::values(["a", "b"])], VarSpec::new().named("make").lb(0.0));
//! let total = sess.sum_of(x, &[QueryIndex::Wild]);
//! let obj = sess.add_objective(ObjSense::Max, Some("profit"), total);
//! sess.include(m, EntityRef::VariableGroup(x)).unwrap();
//! sess.include(m, EntityRef::Objective(obj)).unwrap();
//! ```

pub mod entity;
pub mod error;
pub mod expr;
pub mod model;
pub mod registry;
pub mod session;
pub mod statement;
pub mod types;

pub use entity::constraint::{ConData, ConGroupData};
pub use entity::impvar::ImpVarData;
pub use entity::objective::ObjData;
pub use entity::parameter::{ParamData, ParamGroupData};
pub use entity::set::{IterData, SetData, SetSpec};
pub use entity::variable::{VarData, VarGroupData, VarSpec};
pub use error::{ModelForgeError, Result};
pub use expr::{
    Compare, CondOp, Condition, ConstraintSpec, Domain, Expression, OpaqueOp, OpaqueTerm, SumExpr,
    TermKey,
};
pub use model::ModelData;
pub use registry::{EntityRef, Registry};
pub use session::Session;
pub use statement::{ReadColumn, ReadData, StatementData, StatementKind};
pub use types::{
    key_is_abstract, Bound, BoundAttr, ConSense, Constraint, ConstraintGroup, ElementType,
    ImplicitVar, IndexValue, Key, Model, ObjSense, Objective, Parameter, ParameterGroup,
    QueryIndex, Set, SetIterator, Statement, VarType, Variable, VariableGroup,
};
