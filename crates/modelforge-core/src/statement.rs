//! Free-form and structured statements.
//!
//! Statements are ordinary registered entities: they have a creation order
//! and serialize interleaved with everything else, which is how data-load
//! steps end up before the declarations that depend on them.

use crate::registry::EntityRef;
use crate::session::Session;
use crate::types::{ParameterGroup, Set, Statement};

/// A server-side data load: `read data <table> into <set>=[keys] <cols>;`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadData {
    /// Source table name.
    pub table: String,
    /// Index set populated from the key columns, if any.
    pub set: Option<Set>,
    /// Key column names.
    pub key_columns: Vec<String>,
    /// Parameter columns loaded alongside the keys.
    pub columns: Vec<ReadColumn>,
}

/// One parameter column of a `read data` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadColumn {
    /// Target parameter group.
    pub target: ParameterGroup,
    /// Source column; `None` reads the column named like the target.
    pub column: Option<String>,
}

/// Body of a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    /// Verbatim statement text (without the trailing `;`).
    Literal(String),
    /// Server-side data load.
    Read(ReadData),
    /// `print a b;` over registered entity names.
    Print(Vec<String>),
    /// `drop c1 c2;` over registered constraint names.
    Drop(Vec<String>),
    /// `problem <name> include <members>;` sub-problem declaration.
    Problem {
        /// Sub-problem name.
        name: String,
        /// Registered names of the included entities.
        members: Vec<String>,
    },
}

/// Stored state of a statement.
#[derive(Debug, Clone)]
pub struct StatementData {
    /// Registered name (only used for ordering).
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// The statement body.
    pub kind: StatementKind,
}

impl Session {
    /// Records a statement at the current point of the build.
    pub fn add_statement(&mut self, kind: StatementKind) -> Statement {
        let name = self.registry_mut().assign_name(None, "stmt");
        let handle = Statement::from_index(self.statements.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::Statement(handle));
        self.statements.push(StatementData { name, order, kind });
        handle
    }

    /// Records a verbatim statement.
    pub fn add_literal_statement(&mut self, text: impl Into<String>) -> Statement {
        self.add_statement(StatementKind::Literal(text.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_keep_creation_order() {
        let mut sess = Session::new();
        let a = sess.add_literal_statement("expand");
        let b = sess.add_statement(StatementKind::Drop(vec!["c1".into()]));
        assert!(sess.statement(a).order < sess.statement(b).order);
        assert_eq!(
            sess.statement(b).kind,
            StatementKind::Drop(vec!["c1".into()])
        );
    }
}
