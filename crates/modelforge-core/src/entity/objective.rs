//! Objective functions.

use crate::expr::Expression;
use crate::registry::EntityRef;
use crate::session::Session;
use crate::types::{ObjSense, Objective};

/// Stored state of an objective.
#[derive(Debug, Clone)]
pub struct ObjData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// Optimization direction.
    pub sense: ObjSense,
    /// The objective expression.
    pub expr: Expression,
    /// Objective value, once written back.
    pub value: Option<f64>,
}

impl Session {
    /// Declares an objective.
    pub fn add_objective(
        &mut self,
        sense: ObjSense,
        name: Option<&str>,
        expr: Expression,
    ) -> Objective {
        let name = self.registry_mut().assign_name(name, "obj");
        let handle = Objective::from_index(self.objectives.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::Objective(handle));
        self.objectives.push(ObjData {
            name,
            order,
            sense,
            expr,
            value: None,
        });
        handle
    }
}
