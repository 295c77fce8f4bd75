//! Abstract iteration: index domains and symbolic aggregation.
//!
//! `sum_over` is the single entry point for aggregation. Whether the result
//! is an eagerly expanded linear expression or a symbolic `sum {i in S}`
//! node depends only on the domains: concrete domains expand, abstract sets
//! bind fresh iterators. The binding is explicit (a scope frame pushed for
//! the duration of the body closure), so iterator ownership never depends
//! on anything outside this call.

use crate::expr::{Expression, SumExpr};
use crate::session::{ScopeFrame, Session};
use crate::types::{IndexValue, Key, Set};

/// One dimension of an index space, for groups and aggregations alike.
#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// A declared set; abstract sets make the dimension symbolic.
    Set(Set),
    /// An inline list of concrete values.
    Values(Vec<IndexValue>),
    /// A half-open integer range `[start, end)`.
    Range(i64, i64),
}

impl Domain {
    /// Inline domain from any list of index values.
    pub fn values(vals: impl IntoIterator<Item = impl Into<IndexValue>>) -> Self {
        Domain::Values(vals.into_iter().map(Into::into).collect())
    }

    /// Number of key positions this dimension occupies.
    pub(crate) fn arity(&self, sess: &Session) -> usize {
        match self {
            Domain::Set(s) => sess.set(*s).dim(),
            _ => 1,
        }
    }

    /// Whether this dimension has no concrete element list.
    pub fn is_abstract(&self, sess: &Session) -> bool {
        match self {
            Domain::Set(s) => sess.set(*s).is_abstract(),
            _ => false,
        }
    }
}

impl From<Set> for Domain {
    fn from(s: Set) -> Self {
        Domain::Set(s)
    }
}

impl From<std::ops::Range<i64>> for Domain {
    fn from(r: std::ops::Range<i64>) -> Self {
        Domain::Range(r.start, r.end)
    }
}

/// Cartesian product over per-dimension key fragments.
///
/// The product of zero dimensions is a single empty key, so a domain-less
/// aggregation still invokes its body exactly once.
pub(crate) fn cartesian_keys(fragments: &[Vec<Key>]) -> Vec<Key> {
    let mut keys: Vec<Key> = vec![Key::new()];
    for dim in fragments {
        let mut next = Vec::with_capacity(keys.len() * dim.len());
        for prefix in &keys {
            for fragment in dim {
                let mut key = prefix.clone();
                key.extend(fragment.iter().cloned());
                next.push(key);
            }
        }
        keys = next;
    }
    keys
}

impl Session {
    /// Key fragments a domain contributes, creating iterators for abstract
    /// sets. Iterators land in the current scope frame.
    pub(crate) fn domain_fragments(&mut self, domain: &Domain) -> Vec<Key> {
        match domain {
            Domain::Set(s) => {
                let set = *s;
                if self.set(set).is_abstract() {
                    let iters = self.bind_iterators(set);
                    let mut key = Key::new();
                    for it in iters {
                        key.push(IndexValue::Iter(it));
                    }
                    vec![key]
                } else {
                    self.set(set)
                        .members
                        .as_ref()
                        .map(|m| m.to_vec())
                        .unwrap_or_default()
                }
            }
            Domain::Values(vals) => vals
                .iter()
                .map(|v| {
                    let mut key = Key::new();
                    key.push(v.clone());
                    key
                })
                .collect(),
            Domain::Range(start, end) => (*start..*end)
                .map(|n| {
                    let mut key = Key::new();
                    key.push(IndexValue::Num(n));
                    key
                })
                .collect(),
        }
    }

    /// Aggregates the body over the Cartesian product of the domains.
    ///
    /// Concrete domains are expanded eagerly and the partial expressions
    /// merged; abstract sets contribute one fresh iterator per position and
    /// the merged body is wrapped in a symbolic sum binding exactly those
    /// iterators. Calling this twice with the same domains yields
    /// structurally equal expressions up to iterator identity.
    pub fn sum_over<F>(&mut self, domains: &[Domain], mut body: F) -> Expression
    where
        F: FnMut(&mut Session, &Key) -> Expression,
    {
        self.frames.push(ScopeFrame::default());
        let fragments: Vec<Vec<Key>> = domains
            .iter()
            .map(|d| self.domain_fragments(d))
            .collect();
        let mut total = Expression::new();
        for key in cartesian_keys(&fragments) {
            total.merge(&body(self, &key));
        }
        let frame = self.frames.pop().unwrap_or_default();
        if frame.bound.is_empty() {
            total
        } else {
            let mut wrapped = Expression::new();
            wrapped.push_sum(SumExpr {
                iterators: frame.bound,
                body: Box::new(total),
            });
            wrapped
        }
    }
}
