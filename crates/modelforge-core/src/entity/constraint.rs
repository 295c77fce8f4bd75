//! Constraints and constraint groups.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ModelForgeError, Result};
use crate::expr::{Condition, ConstraintSpec, Domain, Expression};
use crate::registry::EntityRef;
use crate::session::{ScopeFrame, Session};
use crate::types::{key_is_abstract, ConSense, Constraint, ConstraintGroup, Key, SetIterator};

/// Stored state of one constraint.
#[derive(Debug, Clone)]
pub struct ConData {
    /// Solver-safe name; for members, group name and key joined with `_`.
    pub name: String,
    /// Bracketed display form; equals `name` for standalone constraints.
    pub display: String,
    /// Creation order (group members inherit the group's).
    pub order: u64,
    /// Left-hand body with its constant isolated into `rhs`.
    pub body: Expression,
    /// Relation direction.
    pub sense: ConSense,
    /// Numeric right-hand side.
    pub rhs: f64,
    /// Width of a ranged constraint.
    pub range: Option<f64>,
    /// Membership filters (from the spec and any active condition scope).
    pub filters: Vec<Condition>,
    /// Owning group and member key, for members.
    pub group: Option<(ConstraintGroup, Key)>,
    /// Dual value, once written back.
    pub dual: Option<f64>,
}

/// Stored state of a constraint group.
#[derive(Debug, Clone)]
pub struct ConGroupData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// Index space.
    pub domains: Vec<Domain>,
    /// Member keys in definition order.
    pub member_order: Vec<Key>,
    /// Members, concrete and abstract-template alike.
    pub members: HashMap<Key, Constraint>,
    /// Iterators bound by an abstract definition; empty for fully concrete
    /// groups.
    pub iterators: Vec<SetIterator>,
}

impl Session {
    /// Attaches a standalone constraint.
    ///
    /// Fails if the bound on the relation's active side is infinite
    /// (`<= infinity`, `>= -infinity`, or an infinite equality), which
    /// would make the constraint vacuous.
    pub fn add_constraint(
        &mut self,
        spec: ConstraintSpec,
        name: Option<&str>,
    ) -> Result<Constraint> {
        let name = self.registry_mut().assign_name(name, "con");
        self.attach_constraint(spec, name.clone(), name, None, None)
    }

    /// `inherited_order` skips registration (abstract template members keep
    /// their group's name and order instead of taking over its registry
    /// entry).
    fn attach_constraint(
        &mut self,
        spec: ConstraintSpec,
        name: String,
        display: String,
        group: Option<(ConstraintGroup, Key)>,
        inherited_order: Option<u64>,
    ) -> Result<Constraint> {
        let (body, sense, rhs, range, mut filters) = spec.into_parts();
        let vacuous = match sense {
            ConSense::Le => rhs == f64::INFINITY,
            ConSense::Ge => rhs == f64::NEG_INFINITY,
            ConSense::Eq => rhs.is_infinite(),
        };
        if vacuous || rhs.is_nan() {
            return Err(ModelForgeError::InvalidBound(display));
        }
        let mut active = self.active_conditions();
        active.append(&mut filters);
        let handle = Constraint::from_index(self.cons.len());
        let order = match inherited_order {
            Some(order) => order,
            None => self
                .registry_mut()
                .register(&name, EntityRef::Constraint(handle)),
        };
        self.cons.push(ConData {
            name,
            display,
            order,
            body,
            sense,
            rhs,
            range,
            filters: active,
            group,
            dual: None,
        });
        Ok(handle)
    }

    /// Attaches a constraint group over an index space.
    ///
    /// The body closure is invoked once per concrete key; for an abstract
    /// dimension it is invoked once with the binding iterators in the key,
    /// producing a single template member that serializes with an
    /// `{i in S}` qualifier.
    pub fn add_constraints<F>(
        &mut self,
        domains: &[Domain],
        name: Option<&str>,
        mut body: F,
    ) -> Result<ConstraintGroup>
    where
        F: FnMut(&mut Session, &Key) -> ConstraintSpec,
    {
        let gname = self.registry_mut().assign_name(name, "con");
        let handle = ConstraintGroup::from_index(self.con_groups.len());
        let order = self
            .registry_mut()
            .register(&gname, EntityRef::ConstraintGroup(handle));
        self.con_groups.push(ConGroupData {
            name: gname.clone(),
            order,
            domains: domains.to_vec(),
            member_order: Vec::new(),
            members: HashMap::new(),
            iterators: Vec::new(),
        });

        self.frames.push(ScopeFrame::default());
        let fragments: Vec<Vec<Key>> = domains
            .iter()
            .map(|d| self.domain_fragments(d))
            .collect();
        let keys = crate::expr::sum::cartesian_keys(&fragments);
        let mut created = Vec::with_capacity(keys.len());
        for key in keys {
            let spec = body(self, &key);
            let display = format!("{}[{}]", gname, self.key_display(&key));
            let (member_name, inherited) = if key_is_abstract(&key) {
                (gname.clone(), Some(order))
            } else {
                (format!("{}_{}", gname, self.key_flat(&key)), None)
            };
            let con =
                self.attach_constraint(spec, member_name, display, Some((handle, key.clone())), inherited);
            match con {
                Ok(con) => created.push((key, con)),
                Err(err) => {
                    self.frames.pop();
                    return Err(err);
                }
            }
        }
        let frame = self.frames.pop().unwrap_or_default();
        let group = &mut self.con_groups[handle.index()];
        group.iterators = frame.bound;
        for (key, con) in created {
            group.member_order.push(key.clone());
            group.members.insert(key, con);
        }
        debug!(group = %gname, members = self.con_groups[handle.index()].member_order.len(), "constraint group attached");
        Ok(handle)
    }

    /// Resolves one member of a constraint group.
    pub fn constraint_member(&self, g: ConstraintGroup, key: &Key) -> Result<Constraint> {
        self.con_groups[g.index()]
            .members
            .get(key)
            .copied()
            .ok_or_else(|| {
                ModelForgeError::NotFound(format!(
                    "{}[{}]",
                    self.con_groups[g.index()].name,
                    self.key_display(key)
                ))
            })
    }

    /// Resolves a constraint by registered name.
    pub fn constraint_by_name(&self, name: &str) -> Option<Constraint> {
        match self.lookup(name) {
            Some(EntityRef::Constraint(c)) => Some(c),
            _ => None,
        }
    }

    /// Removes a constraint everywhere: its name, its group membership, and
    /// every model that includes it.
    pub fn drop_constraint(&mut self, c: Constraint) -> Result<()> {
        let (name, group) = {
            let data = &self.cons[c.index()];
            (data.name.clone(), data.group.clone())
        };
        let registered = self.lookup(&name) == Some(EntityRef::Constraint(c));
        if !registered && group.is_none() {
            return Err(ModelForgeError::NotFound(name));
        }
        if registered {
            self.registry_mut().remove(&name);
        }
        if let Some((g, key)) = group {
            let gdata = &mut self.con_groups[g.index()];
            gdata.members.remove(&key);
            gdata.member_order.retain(|k| *k != key);
        }
        for model in &mut self.models {
            model.members.retain(|m| *m != EntityRef::Constraint(c));
        }
        debug!(constraint = %name, "dropped");
        Ok(())
    }
}
