//! Sets and set iterators.

use crate::registry::EntityRef;
use crate::session::Session;
use crate::types::{ElementType, Key, Set, SetIterator};

/// Builder for a new set.
#[derive(Debug, Clone, Default)]
pub struct SetSpec {
    name: Option<String>,
    etypes: Vec<ElementType>,
    members: Option<Vec<Key>>,
}

impl SetSpec {
    /// One-dimensional numeric abstract set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an explicit name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declares the element type of each tuple position.
    pub fn typed(mut self, etypes: &[ElementType]) -> Self {
        self.etypes = etypes.to_vec();
        self
    }

    /// Makes the set concrete with an explicit member list.
    pub fn with_members(mut self, members: Vec<Key>) -> Self {
        self.members = Some(members);
        self
    }
}

/// Stored state of a set.
#[derive(Debug, Clone)]
pub struct SetData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// Element type per tuple position.
    pub etypes: Vec<ElementType>,
    /// Concrete members; `None` marks the set abstract (populated
    /// server-side, e.g. by a `read data` statement).
    pub members: Option<Vec<Key>>,
}

impl SetData {
    /// Tuple arity of the set.
    pub fn dim(&self) -> usize {
        self.etypes.len().max(1)
    }

    /// Whether the set has no client-side member list.
    pub fn is_abstract(&self) -> bool {
        self.members.is_none()
    }
}

/// Stored state of a set iterator.
#[derive(Debug, Clone)]
pub struct IterData {
    /// Registered name (`o1`, `o2`, ...).
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// The set this iterator ranges over.
    pub set: Set,
    /// `(position, arity)` when this iterator is one leg of a tuple
    /// unpacking over a multi-dimensional set.
    pub tuple_pos: Option<(usize, usize)>,
}

impl Session {
    /// Declares a set.
    pub fn add_set(&mut self, spec: SetSpec) -> Set {
        let name = self
            .registry_mut()
            .assign_name(spec.name.as_deref(), "set");
        let handle = Set::from_index(self.sets.len());
        let order = self.registry_mut().register(&name, EntityRef::Set(handle));
        let etypes = if spec.etypes.is_empty() {
            vec![ElementType::default()]
        } else {
            spec.etypes
        };
        self.sets.push(SetData {
            name,
            order,
            etypes,
            members: spec.members,
        });
        handle
    }

    /// Creates a fresh iterator over a one-dimensional set.
    ///
    /// If an iteration scope frame is open (inside `sum_over` or a group
    /// definition), the iterator is recorded in it and will be bound by the
    /// enclosing aggregation.
    pub fn iterator(&mut self, set: Set) -> SetIterator {
        self.new_iterator(set, None)
    }

    /// Creates one iterator per tuple position of a multi-dimensional set;
    /// they render together as `<a, b> in S`.
    pub fn tuple_iterators(&mut self, set: Set) -> Vec<SetIterator> {
        let dim = self.set(set).dim();
        if dim == 1 {
            return vec![self.new_iterator(set, None)];
        }
        (0..dim)
            .map(|pos| self.new_iterator(set, Some((pos, dim))))
            .collect()
    }

    fn new_iterator(&mut self, set: Set, tuple_pos: Option<(usize, usize)>) -> SetIterator {
        self.iter_seq += 1;
        let requested = format!("o{}", self.iter_seq);
        let name = self.registry_mut().assign_name(Some(&requested), "o");
        let handle = SetIterator::from_index(self.iters.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::SetIterator(handle));
        self.iters.push(IterData {
            name,
            order,
            set,
            tuple_pos,
        });
        if let Some(frame) = self.frames.last_mut() {
            frame.bound.push(handle);
        }
        handle
    }

    /// Iterators for one abstract set dimension: a single iterator for a
    /// one-dimensional set, a tuple unpacking otherwise.
    pub(crate) fn bind_iterators(&mut self, set: Set) -> Vec<SetIterator> {
        self.tuple_iterators(set)
    }
}
