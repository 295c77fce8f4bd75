//! Name registry and creation-order bookkeeping.
//!
//! The registry is an explicit object owned by a [`Session`](crate::Session)
//! rather than process-wide state, so several independent model-building
//! sessions can coexist in one process. It guarantees that no two live
//! entries share a name and hands out strictly increasing order numbers;
//! that order is the only total order the serializers rely on.

use std::collections::HashMap;

use tracing::warn;

use crate::types::{
    Constraint, ConstraintGroup, ImplicitVar, Model, Objective, Parameter, ParameterGroup, Set,
    SetIterator, Statement, Variable, VariableGroup,
};

/// Reference to any registered entity, by kind.
///
/// A closed sum type: inclusion dispatch and registry lookups match on it
/// exhaustively, so adding an entity kind is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Variable(Variable),
    VariableGroup(VariableGroup),
    Constraint(Constraint),
    ConstraintGroup(ConstraintGroup),
    Set(Set),
    SetIterator(SetIterator),
    Parameter(Parameter),
    ParameterGroup(ParameterGroup),
    ImplicitVar(ImplicitVar),
    Objective(Objective),
    Model(Model),
    Statement(Statement),
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    target: EntityRef,
    order: u64,
}

/// Mapping from resolved names to live entities plus creation counters.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<String, RegistryEntry>,
    counters: HashMap<&'static str, u64>,
    next_order: u64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a unique name for a new entity.
    ///
    /// An empty or missing request synthesizes `"{tag}_{n}"` from the
    /// per-tag counter. A request colliding with a registered name is
    /// replaced the same way (counter-based, never random, so output stays
    /// reproducible) and the collision is reported as a warning.
    pub fn assign_name(&mut self, requested: Option<&str>, tag: &'static str) -> String {
        let mut name = match requested {
            Some(r) if !r.is_empty() => {
                let cleaned = r.replace(' ', "_");
                if self.entries.contains_key(&cleaned) {
                    warn!(requested = r, tag, "name collision, assigning generated name");
                    self.generated(tag)
                } else {
                    cleaned
                }
            }
            _ => self.generated(tag),
        };
        while self.entries.contains_key(&name) {
            name = self.generated(tag);
        }
        name
    }

    fn generated(&mut self, tag: &'static str) -> String {
        let ctr = self.counters.entry(tag).or_insert(0);
        *ctr += 1;
        format!("{}_{}", tag, ctr)
    }

    /// Stores an entity under its resolved name and returns its creation
    /// order number (strictly increasing within this registry).
    pub fn register(&mut self, name: &str, target: EntityRef) -> u64 {
        self.next_order += 1;
        self.entries.insert(
            name.to_owned(),
            RegistryEntry {
                target,
                order: self.next_order,
            },
        );
        self.next_order
    }

    /// Looks up a registered entity by name.
    pub fn lookup(&self, name: &str) -> Option<EntityRef> {
        self.entries.get(name).map(|e| e.target)
    }

    /// Creation order of a registered name, if present.
    pub fn order_of(&self, name: &str) -> Option<u64> {
        self.entries.get(name).map(|e| e.order)
    }

    /// Removes a name from the registry, freeing it for reuse.
    pub fn remove(&mut self, name: &str) {
        self.entries.remove(name);
    }

    /// Whether a name is currently registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Clears the table and all counters atomically.
    ///
    /// A partial clear is never acceptable: stale entries would trigger
    /// false collision renames in the next build.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.counters.clear();
        self.next_order = 0;
    }
}
