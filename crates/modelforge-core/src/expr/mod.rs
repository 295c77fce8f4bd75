//! Symbolic expression engine.
//!
//! An [`Expression`] is a sum of `coefficient * term` entries plus a
//! constant. Terms are keyed by entity ids, which are handed out in
//! creation order, so iterating the term map is deterministic and already
//! dependency-safe for the serializers. Symbolic aggregations (`sum {i in S}
//! ...`) and non-expandable products ride along in dedicated side lists
//! instead of being flattened into terms.

mod constraint;
pub(crate) mod sum;

pub use constraint::{Compare, CondOp, Condition, ConstraintSpec};
pub use sum::Domain;

use std::collections::BTreeMap;
use std::ops::{Add, Mul, Neg, Sub};

use crate::types::{ImplicitVar, Key, Parameter, ParameterGroup, SetIterator, Variable};

/// Identifier of one term inside an [`Expression`].
///
/// Ordering follows entity creation order, which keeps rendered output
/// reproducible without a separate insertion log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TermKey {
    /// Linear term over one variable.
    Var(Variable),
    /// Bilinear term over two variables (normalized so the smaller handle
    /// comes first); marks the expression nonlinear.
    Quad(Variable, Variable),
    /// A set iterator used as a value, e.g. `2 * i` inside a condition.
    Iter(SetIterator),
    /// A scalar parameter reference.
    Param(Parameter),
    /// A keyed member of a parameter group, e.g. `a[i]`.
    GroupParam(ParameterGroup, Key),
    /// An implicit variable (named expression) used by reference.
    ImpVar(ImplicitVar),
}

impl TermKey {
    /// Whether this term depends on an unbound set iterator.
    pub fn is_abstract(&self) -> bool {
        match self {
            TermKey::Iter(_) => true,
            TermKey::GroupParam(_, key) => crate::types::key_is_abstract(key),
            _ => false,
        }
    }
}

/// A symbolic aggregation: `sum {iterators} (body)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SumExpr {
    /// Iterators bound by this aggregation, in binding order.
    pub iterators: Vec<SetIterator>,
    /// The aggregated body.
    pub body: Box<Expression>,
}

/// A product that cannot be expanded into terms; rendered verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueTerm {
    /// Coefficient applied to the whole node.
    pub coeff: f64,
    /// The operation itself.
    pub op: OpaqueOp,
}

/// Operator of an opaque node.
#[derive(Debug, Clone, PartialEq)]
pub enum OpaqueOp {
    /// General product of two subexpressions.
    Mul(Box<Expression>, Box<Expression>),
    /// Integer power of a subexpression.
    Pow(Box<Expression>, i32),
}

/// A linear (or bounded nonlinear) symbolic expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expression {
    terms: BTreeMap<TermKey, f64>,
    constant: f64,
    sums: Vec<SumExpr>,
    opaques: Vec<OpaqueTerm>,
}

impl Expression {
    /// Empty expression (zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Just a constant, no terms.
    pub fn from_constant(constant: f64) -> Self {
        Self {
            constant,
            ..Default::default()
        }
    }

    /// Single term with a coefficient.
    pub fn term(key: TermKey, coeff: f64) -> Self {
        let mut e = Self::new();
        e.add_term(key, coeff);
        e
    }

    /// Single variable with coefficient 1.
    pub fn var(v: Variable) -> Self {
        Self::term(TermKey::Var(v), 1.0)
    }

    // ── Accessors ───────────────────────────────────────────

    /// Constant part of the expression.
    pub fn constant(&self) -> f64 {
        self.constant
    }

    /// Terms in creation order.
    pub fn terms(&self) -> impl Iterator<Item = (&TermKey, f64)> {
        self.terms.iter().map(|(k, c)| (k, *c))
    }

    /// Coefficient of one term, zero if absent.
    pub fn coefficient(&self, key: &TermKey) -> f64 {
        self.terms.get(key).copied().unwrap_or(0.0)
    }

    /// Symbolic aggregations attached to this expression.
    pub fn sums(&self) -> &[SumExpr] {
        &self.sums
    }

    /// Opaque operator nodes attached to this expression.
    pub fn opaques(&self) -> &[OpaqueTerm] {
        &self.opaques
    }

    /// True if the expression is a bare constant.
    pub fn is_constant(&self) -> bool {
        self.terms.is_empty() && self.sums.is_empty() && self.opaques.is_empty()
    }

    /// True if no quadratic terms or opaque nodes are present.
    ///
    /// Symbolic sums do not count against linearity; they are an
    /// abstraction concern, not a degree concern.
    pub fn is_linear(&self) -> bool {
        self.opaques.is_empty() && !self.terms.keys().any(|k| matches!(k, TermKey::Quad(_, _)))
    }

    /// True if any part still depends on an unbound set iterator.
    pub fn has_iterators(&self) -> bool {
        !self.sums.is_empty()
            || self.terms.keys().any(TermKey::is_abstract)
            || self.opaques.iter().any(|o| match &o.op {
                OpaqueOp::Mul(a, b) => a.has_iterators() || b.has_iterators(),
                OpaqueOp::Pow(a, _) => a.has_iterators(),
            })
    }

    /// True if any parameter reference is present (data that the matrix
    /// format cannot carry symbolically).
    pub fn has_parameters(&self) -> bool {
        self.terms
            .keys()
            .any(|k| matches!(k, TermKey::Param(_) | TermKey::GroupParam(_, _)))
            || self.sums.iter().any(|s| s.body.has_parameters())
    }

    /// Max degree of any term: 0 constant, 1 linear, 2 quadratic.
    /// Opaque nodes count as degree 2.
    pub fn degree(&self) -> usize {
        if !self.opaques.is_empty()
            || self.terms.keys().any(|k| matches!(k, TermKey::Quad(_, _)))
        {
            2
        } else if !self.terms.is_empty() || !self.sums.is_empty() {
            1
        } else {
            0
        }
    }

    // ── Mutation ────────────────────────────────────────────

    /// Merges a term into the map, summing coefficients on re-addition.
    ///
    /// A resulting zero coefficient is kept until [`compact`](Self::compact)
    /// is called explicitly.
    pub fn add_term(&mut self, key: TermKey, coeff: f64) {
        let key = match key {
            TermKey::Quad(a, b) if b < a => TermKey::Quad(b, a),
            other => other,
        };
        *self.terms.entry(key).or_insert(0.0) += coeff;
    }

    /// Adds a constant offset in place.
    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    /// Removes terms whose coefficient folded to exactly zero.
    pub fn compact(&mut self) {
        self.terms.retain(|_, c| *c != 0.0);
    }

    /// Attaches a symbolic aggregation node.
    pub fn push_sum(&mut self, sum: SumExpr) {
        self.sums.push(sum);
    }

    // ── Algebra ─────────────────────────────────────────────

    /// Scales all terms, sums, opaque nodes, and the constant.
    pub fn scale(&self, by: f64) -> Self {
        Self {
            terms: self.terms.iter().map(|(k, c)| (k.clone(), c * by)).collect(),
            constant: self.constant * by,
            sums: self
                .sums
                .iter()
                .map(|s| SumExpr {
                    iterators: s.iterators.clone(),
                    body: Box::new(s.body.scale(by)),
                })
                .collect(),
            opaques: self
                .opaques
                .iter()
                .map(|o| OpaqueTerm {
                    coeff: o.coeff * by,
                    op: o.op.clone(),
                })
                .collect(),
        }
    }

    /// Merges another expression into this one.
    pub fn merge(&mut self, other: &Expression) {
        for (k, c) in &other.terms {
            self.add_term(k.clone(), *c);
        }
        self.constant += other.constant;
        self.sums.extend(other.sums.iter().cloned());
        self.opaques.extend(other.opaques.iter().cloned());
    }

    /// Copy with the constant set to zero.
    pub fn without_constant(&self) -> Self {
        let mut e = self.clone();
        e.constant = 0.0;
        e
    }

    /// Distributing product.
    ///
    /// Scalars scale; a product of two linear expressions expands, with
    /// variable-variable pairs becoming quadratic terms. Any deeper product
    /// (or a pair involving an iterator or parameter term) is kept as an
    /// opaque operator node rather than expanded.
    pub fn multiply(&self, other: &Expression) -> Expression {
        if self.is_constant() {
            return other.scale(self.constant);
        }
        if other.is_constant() {
            return self.scale(other.constant);
        }
        let expandable = |e: &Expression| e.sums.is_empty() && e.opaques.is_empty() && e.is_linear();
        if !expandable(self) || !expandable(other) {
            return Expression {
                opaques: vec![OpaqueTerm {
                    coeff: 1.0,
                    op: OpaqueOp::Mul(Box::new(self.clone()), Box::new(other.clone())),
                }],
                ..Default::default()
            };
        }

        let mut out = Expression::from_constant(self.constant * other.constant);
        for (k, c) in &self.terms {
            if other.constant != 0.0 {
                out.add_term(k.clone(), c * other.constant);
            }
        }
        for (k, c) in &other.terms {
            if self.constant != 0.0 {
                out.add_term(k.clone(), c * self.constant);
            }
        }
        for (ka, ca) in &self.terms {
            for (kb, cb) in &other.terms {
                match (ka, kb) {
                    (TermKey::Var(a), TermKey::Var(b)) => {
                        out.add_term(TermKey::Quad(*a, *b), ca * cb);
                    }
                    _ => out.opaques.push(OpaqueTerm {
                        coeff: ca * cb,
                        op: OpaqueOp::Mul(
                            Box::new(Expression::term(ka.clone(), 1.0)),
                            Box::new(Expression::term(kb.clone(), 1.0)),
                        ),
                    }),
                }
            }
        }
        out
    }

    /// Integer power; constants fold, anything else becomes opaque.
    pub fn pow(&self, exponent: i32) -> Expression {
        if self.is_constant() {
            return Expression::from_constant(self.constant.powi(exponent));
        }
        Expression {
            opaques: vec![OpaqueTerm {
                coeff: 1.0,
                op: OpaqueOp::Pow(Box::new(self.clone()), exponent),
            }],
            ..Default::default()
        }
    }
}

// ── Conversions ─────────────────────────────────────────────

impl From<Variable> for Expression {
    fn from(v: Variable) -> Self {
        Expression::var(v)
    }
}

impl From<SetIterator> for Expression {
    fn from(i: SetIterator) -> Self {
        Expression::term(TermKey::Iter(i), 1.0)
    }
}

impl From<Parameter> for Expression {
    fn from(p: Parameter) -> Self {
        Expression::term(TermKey::Param(p), 1.0)
    }
}

impl From<ImplicitVar> for Expression {
    fn from(v: ImplicitVar) -> Self {
        Expression::term(TermKey::ImpVar(v), 1.0)
    }
}

impl From<f64> for Expression {
    fn from(c: f64) -> Self {
        Expression::from_constant(c)
    }
}

impl From<i64> for Expression {
    fn from(c: i64) -> Self {
        Expression::from_constant(c as f64)
    }
}

// ── Operators ───────────────────────────────────────────────

impl Add for Expression {
    type Output = Expression;

    fn add(mut self, rhs: Expression) -> Expression {
        self.merge(&rhs);
        self
    }
}

impl Sub for Expression {
    type Output = Expression;

    fn sub(mut self, rhs: Expression) -> Expression {
        self.merge(&rhs.scale(-1.0));
        self
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        self.scale(-1.0)
    }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::multiply(&self, &rhs)
    }
}

macro_rules! impl_mixed_ops {
    ($t:ty) => {
        impl Add<Expression> for $t {
            type Output = Expression;
            fn add(self, rhs: Expression) -> Expression {
                Expression::from(self) + rhs
            }
        }
        impl Add<$t> for Expression {
            type Output = Expression;
            fn add(self, rhs: $t) -> Expression {
                self + Expression::from(rhs)
            }
        }
        impl Sub<Expression> for $t {
            type Output = Expression;
            fn sub(self, rhs: Expression) -> Expression {
                Expression::from(self) - rhs
            }
        }
        impl Sub<$t> for Expression {
            type Output = Expression;
            fn sub(self, rhs: $t) -> Expression {
                self - Expression::from(rhs)
            }
        }
        impl Mul<Expression> for $t {
            type Output = Expression;
            fn mul(self, rhs: Expression) -> Expression {
                Expression::from(self) * rhs
            }
        }
        impl Mul<$t> for Expression {
            type Output = Expression;
            fn mul(self, rhs: $t) -> Expression {
                self * Expression::from(rhs)
            }
        }
    };
}

impl_mixed_ops!(Variable);
impl_mixed_ops!(SetIterator);
impl_mixed_ops!(Parameter);
impl_mixed_ops!(ImplicitVar);
impl_mixed_ops!(f64);
impl_mixed_ops!(i64);

macro_rules! impl_entity_pair_ops {
    ($a:ty, $b:ty) => {
        impl Add<$b> for $a {
            type Output = Expression;
            fn add(self, rhs: $b) -> Expression {
                Expression::from(self) + Expression::from(rhs)
            }
        }
        impl Sub<$b> for $a {
            type Output = Expression;
            fn sub(self, rhs: $b) -> Expression {
                Expression::from(self) - Expression::from(rhs)
            }
        }
        impl Mul<$b> for $a {
            type Output = Expression;
            fn mul(self, rhs: $b) -> Expression {
                Expression::from(self) * Expression::from(rhs)
            }
        }
    };
}

impl_entity_pair_ops!(Variable, Variable);
impl_entity_pair_ops!(Variable, SetIterator);
impl_entity_pair_ops!(SetIterator, Variable);
impl_entity_pair_ops!(SetIterator, SetIterator);
impl_entity_pair_ops!(Variable, Parameter);
impl_entity_pair_ops!(Parameter, Variable);
impl_entity_pair_ops!(Variable, f64);
impl_entity_pair_ops!(f64, Variable);
impl_entity_pair_ops!(SetIterator, f64);
impl_entity_pair_ops!(f64, SetIterator);
impl_entity_pair_ops!(Parameter, f64);
impl_entity_pair_ops!(f64, Parameter);
impl_entity_pair_ops!(Variable, i64);
impl_entity_pair_ops!(i64, Variable);
impl_entity_pair_ops!(ImplicitVar, f64);
impl_entity_pair_ops!(f64, ImplicitVar);
impl_entity_pair_ops!(SetIterator, i64);
impl_entity_pair_ops!(i64, SetIterator);

impl Neg for Variable {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::var(self).scale(-1.0)
    }
}
