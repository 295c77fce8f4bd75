//! Scalar and grouped parameters (server-side data slots).

use std::collections::HashMap;

use crate::expr::{Domain, Expression, TermKey};
use crate::registry::EntityRef;
use crate::session::Session;
use crate::types::{ElementType, Key, Parameter, ParameterGroup};

/// Stored state of a scalar parameter.
#[derive(Debug, Clone)]
pub struct ParamData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// Declared element type.
    pub ptype: ElementType,
    /// Declared `init` value, if any.
    pub init: Option<f64>,
    /// Client-side assigned value, if any.
    pub value: Option<f64>,
}

/// Stored state of a parameter group.
#[derive(Debug, Clone)]
pub struct ParamGroupData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// Index space.
    pub domains: Vec<Domain>,
    /// Declared element type.
    pub ptype: ElementType,
    /// Declared `init` value applied to every member.
    pub init: Option<f64>,
    /// Per-member value overrides.
    pub values: HashMap<Key, f64>,
    /// Override keys in assignment order, for reproducible rendering.
    pub value_order: Vec<Key>,
}

impl Session {
    /// Declares a scalar parameter.
    pub fn add_parameter(
        &mut self,
        name: Option<&str>,
        ptype: ElementType,
        init: Option<f64>,
    ) -> Parameter {
        let name = self.registry_mut().assign_name(name, "p");
        let handle = Parameter::from_index(self.params.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::Parameter(handle));
        self.params.push(ParamData {
            name,
            order,
            ptype,
            init,
            value: None,
        });
        handle
    }

    /// Declares a parameter group over an index space.
    pub fn add_parameters(
        &mut self,
        domains: &[Domain],
        name: Option<&str>,
        ptype: ElementType,
        init: Option<f64>,
    ) -> ParameterGroup {
        let name = self.registry_mut().assign_name(name, "p");
        let handle = ParameterGroup::from_index(self.param_groups.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::ParameterGroup(handle));
        self.param_groups.push(ParamGroupData {
            name,
            order,
            domains: domains.to_vec(),
            ptype,
            init,
            values: HashMap::new(),
            value_order: Vec::new(),
        });
        handle
    }

    /// Assigns a client-side value to a scalar parameter.
    pub fn set_param_value(&mut self, p: Parameter, value: f64) {
        self.params[p.index()].value = Some(value);
    }

    /// Assigns a client-side value to one member of a parameter group.
    pub fn set_group_param_value(&mut self, g: ParameterGroup, key: Key, value: f64) {
        let data = &mut self.param_groups[g.index()];
        if data.values.insert(key.clone(), value).is_none() {
            data.value_order.push(key);
        }
    }

    /// Symbolic reference to one member of a parameter group, e.g. `a[i]`.
    pub fn param_ref(&self, g: ParameterGroup, key: Key) -> Expression {
        Expression::term(TermKey::GroupParam(g, key), 1.0)
    }
}
