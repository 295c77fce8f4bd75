//! The model container.
//!
//! A model is a view over session entities: it owns nothing, it collects
//! references. Inclusion order is irrelevant; the serializers emit members
//! by creation order, so a model is reproducible no matter how it was
//! assembled.

use tracing::{debug, warn};

use crate::error::{ModelForgeError, Result};
use crate::registry::EntityRef;
use crate::session::Session;
use crate::types::{Model, Objective, Statement, Variable};

/// Stored state of a model.
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// Included entities, deduplicated, in inclusion order.
    pub members: Vec<EntityRef>,
    /// Statements to serialize after `solve;`.
    pub post_statements: Vec<Statement>,
}

impl Session {
    /// Declares a model.
    pub fn add_model(&mut self, name: Option<&str>) -> Model {
        let name = self.registry_mut().assign_name(name, "model");
        let handle = Model::from_index(self.models.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::Model(handle));
        self.models.push(ModelData {
            name,
            order,
            members: Vec::new(),
            post_statements: Vec::new(),
        });
        handle
    }

    /// Includes an entity into a model.
    ///
    /// Dispatch is exhaustive over the entity kinds; a bare set iterator is
    /// not includable (it only exists inside an aggregation). Including a
    /// model merges the inner model's members into this one; its objectives
    /// replace any already-included objective (last write wins).
    ///
    /// Inside a [`Session::declarative`] scope the include order is checked:
    /// an entity created after the model itself is rejected with
    /// [`ModelForgeError::OrderingViolation`].
    pub fn include(&mut self, model: Model, target: EntityRef) -> Result<()> {
        if let EntityRef::SetIterator(_) = target {
            return Err(ModelForgeError::InvalidOperation(
                "a set iterator cannot be included into a model".into(),
            ));
        }
        if self.in_declarative()
            && self.order_of_ref(target) > self.models[model.index()].order
        {
            return Err(ModelForgeError::OrderingViolation {
                object: self.name_of(target).to_owned(),
                model: self.models[model.index()].name.clone(),
            });
        }
        if let EntityRef::Model(inner) = target {
            if inner == model {
                return Err(ModelForgeError::InvalidOperation(
                    "a model cannot include itself".into(),
                ));
            }
            return self.merge_model(model, inner);
        }
        self.push_member(model, target)
    }

    /// Merges every member of `inner` into `model`. Objectives carried by
    /// `inner` replace the target's objectives (last write wins).
    fn merge_model(&mut self, model: Model, inner: Model) -> Result<()> {
        let inner_members = self.models[inner.index()].members.clone();
        if inner_members
            .iter()
            .any(|m| matches!(m, EntityRef::Objective(_)))
        {
            let outer = &mut self.models[model.index()];
            let had_objective = outer
                .members
                .iter()
                .any(|m| matches!(m, EntityRef::Objective(_)));
            outer.members.retain(|m| !matches!(m, EntityRef::Objective(_)));
            if had_objective {
                warn!(
                    model = %self.models[model.index()].name,
                    from = %self.models[inner.index()].name,
                    "objective replaced by included model"
                );
            }
        }
        for member in inner_members {
            match member {
                EntityRef::Model(nested) => self.merge_model(model, nested)?,
                _ => self.push_member(model, member)?,
            }
        }
        let extra = self.models[inner.index()].post_statements.clone();
        self.models[model.index()].post_statements.extend(extra);
        debug!(
            inner = %self.models[inner.index()].name,
            outer = %self.models[model.index()].name,
            "model merged"
        );
        Ok(())
    }

    fn push_member(&mut self, model: Model, target: EntityRef) -> Result<()> {
        let name = self.name_of(target).to_owned();
        let conflict = self.models[model.index()]
            .members
            .iter()
            .any(|m| *m != target && self.name_of(*m) == name);
        if conflict {
            return Err(ModelForgeError::NamingConflict(name));
        }
        let members = &mut self.models[model.index()].members;
        if !members.contains(&target) {
            members.push(target);
        }
        Ok(())
    }

    /// Removes an entity from a model (the entity itself stays alive).
    pub fn exclude(&mut self, model: Model, target: EntityRef) {
        self.models[model.index()].members.retain(|m| *m != target);
    }

    /// Appends a statement serialized after `solve;`.
    pub fn add_postsolve(&mut self, model: Model, statement: Statement) {
        self.models[model.index()].post_statements.push(statement);
    }

    /// Objectives included in a model, sorted by creation order. The first
    /// one is the active objective.
    pub fn model_objectives(&self, model: Model) -> Vec<Objective> {
        let mut objs: Vec<Objective> = self.models[model.index()]
            .members
            .iter()
            .filter_map(|m| match m {
                EntityRef::Objective(o) => Some(*o),
                _ => None,
            })
            .collect();
        objs.sort_by_key(|o| self.objectives[o.index()].order);
        objs
    }

    /// Model members sorted by creation order, ready for serialization.
    pub fn model_members_ordered(&self, model: Model) -> Vec<EntityRef> {
        let mut members = self.models[model.index()].members.clone();
        members.sort_by_key(|m| self.order_of_ref(*m));
        members
    }

    /// Variables a model spans: scalar members plus every materialized
    /// member of included groups, in creation order.
    pub fn model_variables(&self, model: Model) -> Vec<Variable> {
        let mut vars = Vec::new();
        for member in self.model_members_ordered(model) {
            match member {
                EntityRef::Variable(v) => vars.push(v),
                EntityRef::VariableGroup(g) => {
                    let group = &self.var_groups[g.index()];
                    for key in &group.member_order {
                        if let Some(v) = group.members.get(key) {
                            vars.push(*v);
                        }
                    }
                }
                _ => {}
            }
        }
        vars
    }

    /// Clears solution state (values and duals) of everything in a model.
    pub fn clear_solution(&mut self, model: Model) {
        for member in self.models[model.index()].members.clone() {
            match member {
                EntityRef::Variable(v) => self.vars[v.index()].value = None,
                EntityRef::VariableGroup(g) => {
                    let handles: Vec<Variable> =
                        self.var_groups[g.index()].members.values().copied().collect();
                    for v in handles {
                        self.vars[v.index()].value = None;
                    }
                }
                EntityRef::Constraint(c) => self.cons[c.index()].dual = None,
                EntityRef::ConstraintGroup(g) => {
                    let handles: Vec<_> =
                        self.con_groups[g.index()].members.values().copied().collect();
                    for c in handles {
                        self.cons[c.index()].dual = None;
                    }
                }
                EntityRef::Objective(o) => self.objectives[o.index()].value = None,
                EntityRef::ImplicitVar(v) => self.impvars[v.index()].value = None,
                _ => {}
            }
        }
    }
}
