//! Comparison surface: constraint specs and filter conditions.

use crate::expr::Expression;
use crate::types::ConSense;

/// A fully-formed relation between two expressions, before attachment.
///
/// The constant parts of both sides are folded into a numeric right-hand
/// side at construction time, so `2 * x + 3 <= 7` and `2 * x <= 4` produce
/// the same spec. Attachment to a session turns this into a named
/// [`Constraint`](crate::types::Constraint).
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    body: Expression,
    sense: ConSense,
    rhs: f64,
    range: Option<f64>,
    filters: Vec<Condition>,
}

impl ConstraintSpec {
    fn relate(lhs: Expression, sense: ConSense, rhs: Expression) -> Self {
        let diff = lhs - rhs;
        let shift = -diff.constant();
        Self {
            body: diff.without_constant(),
            sense,
            rhs: shift,
            range: None,
            filters: Vec::new(),
        }
    }

    /// Ranged constraint `lo <= body <= hi`, carried as an equality with a
    /// range width.
    pub fn ranged(body: impl Into<Expression>, lo: f64, hi: f64) -> Self {
        let body: Expression = body.into();
        let shift = body.constant();
        Self {
            body: body.without_constant(),
            sense: ConSense::Eq,
            rhs: lo - shift,
            range: Some(hi - lo),
            filters: Vec::new(),
        }
    }

    /// Adds a membership filter; within a group definition this renders as
    /// the `{iters: condition}` qualifier.
    pub fn filter(mut self, condition: Condition) -> Self {
        self.filters.push(condition);
        self
    }

    /// Left-hand body with its constant already isolated into the RHS.
    pub fn body(&self) -> &Expression {
        &self.body
    }

    /// Relation direction.
    pub fn sense(&self) -> ConSense {
        self.sense
    }

    /// Numeric right-hand side.
    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    /// Width of a ranged constraint, if any.
    pub fn range(&self) -> Option<f64> {
        self.range
    }

    /// Filters attached so far.
    pub fn filters(&self) -> &[Condition] {
        &self.filters
    }

    pub(crate) fn into_parts(self) -> (Expression, ConSense, f64, Option<f64>, Vec<Condition>) {
        (self.body, self.sense, self.rhs, self.range, self.filters)
    }
}

/// Builds relations out of anything convertible to an [`Expression`].
///
/// Named methods instead of operator overloads: `PartialOrd` is already
/// taken on the handle types, and a comparison that silently built a
/// constraint would be a trap in `if` conditions.
pub trait Compare: Into<Expression> + Sized {
    /// `self <= rhs`.
    fn le(self, rhs: impl Into<Expression>) -> ConstraintSpec {
        ConstraintSpec::relate(self.into(), ConSense::Le, rhs.into())
    }

    /// `self >= rhs`.
    fn ge(self, rhs: impl Into<Expression>) -> ConstraintSpec {
        ConstraintSpec::relate(self.into(), ConSense::Ge, rhs.into())
    }

    /// `self = rhs`.
    fn eq_to(self, rhs: impl Into<Expression>) -> ConstraintSpec {
        ConstraintSpec::relate(self.into(), ConSense::Eq, rhs.into())
    }

    /// `lo <= self <= hi`.
    fn eq_range(self, lo: f64, hi: f64) -> ConstraintSpec {
        ConstraintSpec::ranged(self, lo, hi)
    }
}

impl<T: Into<Expression>> Compare for T {}

/// Relational operator of a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CondOp {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl CondOp {
    /// Statement-language symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            CondOp::Lt => "<",
            CondOp::Le => "<=",
            CondOp::Gt => ">",
            CondOp::Ge => ">=",
            CondOp::Eq => "=",
            CondOp::Ne => "ne",
        }
    }
}

/// A boolean predicate over expressions, used to filter abstract members.
///
/// Unlike a [`ConstraintSpec`], a condition is not attached to a model; it
/// qualifies which index tuples a group definition covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    /// Left side of the predicate.
    pub lhs: Expression,
    /// Relational operator.
    pub op: CondOp,
    /// Right side of the predicate.
    pub rhs: Expression,
}

impl Condition {
    fn build(lhs: impl Into<Expression>, op: CondOp, rhs: impl Into<Expression>) -> Self {
        Self {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
        }
    }

    /// `lhs < rhs`.
    pub fn lt(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::build(lhs, CondOp::Lt, rhs)
    }

    /// `lhs <= rhs`.
    pub fn le(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::build(lhs, CondOp::Le, rhs)
    }

    /// `lhs > rhs`.
    pub fn gt(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::build(lhs, CondOp::Gt, rhs)
    }

    /// `lhs >= rhs`.
    pub fn ge(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::build(lhs, CondOp::Ge, rhs)
    }

    /// `lhs = rhs`.
    pub fn eq(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::build(lhs, CondOp::Eq, rhs)
    }

    /// `lhs ne rhs`.
    pub fn ne(lhs: impl Into<Expression>, rhs: impl Into<Expression>) -> Self {
        Self::build(lhs, CondOp::Ne, rhs)
    }
}
