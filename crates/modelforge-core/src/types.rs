//! Identifier handles and shared value types.
//!
//! Every entity lives in an arena owned by [`Session`](crate::Session); the
//! types here are the cheap `Copy` handles that refer into those arenas,
//! plus the index-value and bound types shared across the entity model.

use smallvec::SmallVec;

macro_rules! define_handle {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub(crate) fn from_index(index: usize) -> Self {
                Self(index as u32)
            }

            /// Position of this entity in its session arena.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_handle!(
    /// Handle to a scalar decision variable.
    Variable
);
define_handle!(
    /// Handle to an index-driven group of variables.
    VariableGroup
);
define_handle!(
    /// Handle to a single constraint.
    Constraint
);
define_handle!(
    /// Handle to an index-driven group of constraints.
    ConstraintGroup
);
define_handle!(
    /// Handle to a concrete or symbolic index set.
    Set
);
define_handle!(
    /// Handle to a symbolic loop variable ranging over a [`Set`].
    SetIterator
);
define_handle!(
    /// Handle to a scalar parameter.
    Parameter
);
define_handle!(
    /// Handle to an index-driven group of parameters.
    ParameterGroup
);
define_handle!(
    /// Handle to an implicit variable (a named expression).
    ImplicitVar
);
define_handle!(
    /// Handle to an objective function.
    Objective
);
define_handle!(
    /// Handle to a model container.
    Model
);
define_handle!(
    /// Handle to a free-form or structured statement.
    Statement
);

/// Type of a decision variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VarType {
    /// Continuous variable (default).
    #[default]
    Continuous,
    /// Integer variable.
    Integer,
    /// Binary variable; defaults its bounds to `[0, 1]`.
    Binary,
}

/// Direction of an objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ObjSense {
    /// Minimize (default).
    #[default]
    Min,
    /// Maximize.
    Max,
}

impl ObjSense {
    /// Statement-language keyword for this sense.
    pub fn keyword(self) -> &'static str {
        match self {
            ObjSense::Min => "min",
            ObjSense::Max => "max",
        }
    }
}

/// Direction of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConSense {
    /// Less-than-or-equal.
    Le,
    /// Greater-than-or-equal.
    Ge,
    /// Equality; may carry a range for double-sided constraints.
    Eq,
}

impl ConSense {
    /// Statement-language symbol for this sense.
    pub fn symbol(self) -> &'static str {
        match self {
            ConSense::Le => "<=",
            ConSense::Ge => ">=",
            ConSense::Eq => "=",
        }
    }
}

/// Declared element type of a set dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// Numeric elements (default).
    #[default]
    Num,
    /// String elements.
    Str,
}

impl ElementType {
    /// Statement-language keyword for this element type.
    pub fn keyword(self) -> &'static str {
        match self {
            ElementType::Num => "num",
            ElementType::Str => "str",
        }
    }
}

/// One position of a composite index key.
///
/// Concrete keys hold numbers or strings; abstract keys hold a
/// [`SetIterator`] standing in for a not-yet-resolved position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexValue {
    /// Concrete numeric index.
    Num(i64),
    /// Concrete string index.
    Str(String),
    /// Symbolic index bound to a set iterator.
    Iter(SetIterator),
}

impl IndexValue {
    /// Whether this position is still symbolic.
    pub fn is_abstract(&self) -> bool {
        matches!(self, IndexValue::Iter(_))
    }
}

impl From<i64> for IndexValue {
    fn from(v: i64) -> Self {
        IndexValue::Num(v)
    }
}

impl From<i32> for IndexValue {
    fn from(v: i32) -> Self {
        IndexValue::Num(v as i64)
    }
}

impl From<&str> for IndexValue {
    fn from(v: &str) -> Self {
        IndexValue::Str(v.to_owned())
    }
}

impl From<String> for IndexValue {
    fn from(v: String) -> Self {
        IndexValue::Str(v)
    }
}

impl From<SetIterator> for IndexValue {
    fn from(v: SetIterator) -> Self {
        IndexValue::Iter(v)
    }
}

/// Composite index key of a group member.
pub type Key = SmallVec<[IndexValue; 4]>;

/// Whether any position of a key is symbolic.
pub fn key_is_abstract(key: &[IndexValue]) -> bool {
    key.iter().any(IndexValue::is_abstract)
}

/// Builds a [`Key`](crate::Key) from a list of index values.
///
/// ```
/// use modelforge_core::{key, IndexValue};
///
/// let k = key![0, "east"];
/// assert_eq!(k[1], IndexValue::Str("east".into()));
/// ```
#[macro_export]
macro_rules! key {
    ($($v:expr),* $(,)?) => {{
        let mut k = $crate::Key::new();
        $(k.push($crate::IndexValue::from($v));)*
        k
    }};
}

/// One position of a partial-match query against a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryIndex {
    /// Match any value in this dimension.
    Wild,
    /// Match exactly one value.
    One(IndexValue),
    /// Match any of the listed values.
    Many(Vec<IndexValue>),
}

impl<T: Into<IndexValue>> From<T> for QueryIndex {
    fn from(v: T) -> Self {
        QueryIndex::One(v.into())
    }
}

/// Variable attribute addressable in the statement language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundAttr {
    /// Lower bound.
    Lb,
    /// Upper bound.
    Ub,
}

impl BoundAttr {
    /// Statement-language suffix for this attribute (`.lb` / `.ub`).
    pub fn suffix(self) -> &'static str {
        match self {
            BoundAttr::Lb => ".lb",
            BoundAttr::Ub => ".ub",
        }
    }
}

/// A variable bound: numeric, or symbolic for shadow members.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Plain numeric bound.
    Value(f64),
    /// The named attribute of a (shadow) variable, e.g. `x[i].lb`.
    Attr(Variable, BoundAttr),
    /// A parameter reference, possibly keyed for group parameters.
    Param(Parameter, Key),
}

impl Bound {
    /// Numeric value if this bound is concrete.
    pub fn as_value(&self) -> Option<f64> {
        match self {
            Bound::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether this bound still refers to a symbolic entity.
    pub fn is_symbolic(&self) -> bool {
        !matches!(self, Bound::Value(_))
    }
}

impl From<f64> for Bound {
    fn from(v: f64) -> Self {
        Bound::Value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_macro_mixed_types() {
        let k = key![3, "west"];
        assert_eq!(k.len(), 2);
        assert_eq!(k[0], IndexValue::Num(3));
        assert!(!key_is_abstract(&k));
    }

    #[test]
    fn test_abstract_key_detection() {
        let it = SetIterator::from_index(0);
        let k = key![1, it];
        assert!(key_is_abstract(&k));
    }

    #[test]
    fn test_handle_ordering_follows_creation() {
        let a = Variable::from_index(0);
        let b = Variable::from_index(1);
        assert!(a < b);
    }

    #[test]
    fn test_bound_value_extraction() {
        assert_eq!(Bound::Value(4.0).as_value(), Some(4.0));
        let attr = Bound::Attr(Variable::from_index(0), BoundAttr::Ub);
        assert_eq!(attr.as_value(), None);
        assert!(attr.is_symbolic());
    }
}
