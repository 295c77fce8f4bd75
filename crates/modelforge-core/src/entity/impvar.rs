//! Implicit variables: named expressions serialized as `impvar` and
//! usable as terms in later expressions.

use crate::expr::Expression;
use crate::registry::EntityRef;
use crate::session::Session;
use crate::types::ImplicitVar;

/// Stored state of an implicit variable.
#[derive(Debug, Clone)]
pub struct ImpVarData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// The defining expression.
    pub expr: Expression,
    /// Solution value, once written back.
    pub value: Option<f64>,
}

impl Session {
    /// Declares an implicit variable with a defining expression.
    pub fn add_impvar(&mut self, name: Option<&str>, expr: Expression) -> ImplicitVar {
        let name = self.registry_mut().assign_name(name, "impvar");
        let handle = ImplicitVar::from_index(self.impvars.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::ImplicitVar(handle));
        self.impvars.push(ImpVarData {
            name,
            order,
            expr,
            value: None,
        });
        handle
    }
}
