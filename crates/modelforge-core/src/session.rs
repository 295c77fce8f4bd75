//! The model-building session.
//!
//! A [`Session`] owns the arenas every entity lives in, the name
//! [`Registry`], the iteration scope stack, and the active condition stack.
//! All state is instance-local; two sessions never interfere, and a session
//! is deliberately single-threaded (model building is a sequential,
//! order-sensitive activity).

use tracing::debug;

use crate::entity::constraint::{ConData, ConGroupData};
use crate::entity::impvar::ImpVarData;
use crate::entity::objective::ObjData;
use crate::entity::parameter::{ParamData, ParamGroupData};
use crate::entity::set::{IterData, SetData};
use crate::entity::variable::{VarData, VarGroupData};
use crate::error::{ModelForgeError, Result};
use crate::expr::{Condition, Expression, OpaqueOp, TermKey};
use crate::model::ModelData;
use crate::registry::{EntityRef, Registry};
use crate::statement::StatementData;
use crate::types::{
    Constraint, ConstraintGroup, ImplicitVar, Model, Objective, Parameter, ParameterGroup, Set,
    SetIterator, Statement, Variable, VariableGroup,
};

/// One level of the iteration scope stack.
///
/// Every [`SetIterator`] created while a frame is on top of the stack is
/// recorded here; when the frame is popped by `sum_over` the recorded
/// iterators become the binding list of the resulting symbolic sum.
#[derive(Debug, Default)]
pub(crate) struct ScopeFrame {
    pub(crate) bound: Vec<SetIterator>,
}

/// Owner of all model-building state.
#[derive(Debug, Default)]
pub struct Session {
    registry: Registry,
    pub(crate) vars: Vec<VarData>,
    pub(crate) var_groups: Vec<VarGroupData>,
    pub(crate) cons: Vec<ConData>,
    pub(crate) con_groups: Vec<ConGroupData>,
    pub(crate) sets: Vec<SetData>,
    pub(crate) iters: Vec<IterData>,
    pub(crate) params: Vec<ParamData>,
    pub(crate) param_groups: Vec<ParamGroupData>,
    pub(crate) impvars: Vec<ImpVarData>,
    pub(crate) objectives: Vec<ObjData>,
    pub(crate) models: Vec<ModelData>,
    pub(crate) statements: Vec<StatementData>,
    pub(crate) frames: Vec<ScopeFrame>,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) iter_seq: u64,
    declarative_depth: u32,
}

impl Session {
    /// Creates an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the whole session atomically: all arenas, the registry and
    /// its counters, and any in-flight scopes.
    pub fn reset(&mut self) {
        debug!("resetting session");
        *self = Self::default();
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Looks up any top-level entity by its registered name.
    pub fn lookup(&self, name: &str) -> Option<EntityRef> {
        self.registry.lookup(name)
    }

    /// Creation order of a registered name.
    pub fn order_of(&self, name: &str) -> Option<u64> {
        self.registry.order_of(name)
    }

    // ── Data accessors (handles are only ever minted by this session) ──

    /// Data of a scalar or member variable.
    pub fn var(&self, v: Variable) -> &VarData {
        &self.vars[v.index()]
    }

    pub(crate) fn var_mut(&mut self, v: Variable) -> &mut VarData {
        &mut self.vars[v.index()]
    }

    /// Data of a variable group.
    pub fn var_group(&self, g: VariableGroup) -> &VarGroupData {
        &self.var_groups[g.index()]
    }

    /// Data of a constraint.
    pub fn con(&self, c: Constraint) -> &ConData {
        &self.cons[c.index()]
    }

    pub(crate) fn con_mut(&mut self, c: Constraint) -> &mut ConData {
        &mut self.cons[c.index()]
    }

    /// Data of a constraint group.
    pub fn con_group(&self, g: ConstraintGroup) -> &ConGroupData {
        &self.con_groups[g.index()]
    }

    /// Data of a set.
    pub fn set(&self, s: Set) -> &SetData {
        &self.sets[s.index()]
    }

    /// Data of a set iterator.
    pub fn iter(&self, i: SetIterator) -> &IterData {
        &self.iters[i.index()]
    }

    /// Data of a scalar parameter.
    pub fn param(&self, p: Parameter) -> &ParamData {
        &self.params[p.index()]
    }

    /// Data of a parameter group.
    pub fn param_group(&self, g: ParameterGroup) -> &ParamGroupData {
        &self.param_groups[g.index()]
    }

    /// Data of an implicit variable.
    pub fn impvar(&self, v: ImplicitVar) -> &ImpVarData {
        &self.impvars[v.index()]
    }

    /// Data of an objective.
    pub fn objective(&self, o: Objective) -> &ObjData {
        &self.objectives[o.index()]
    }

    /// Data of a model.
    pub fn model(&self, m: Model) -> &ModelData {
        &self.models[m.index()]
    }

    /// Data of a statement.
    pub fn statement(&self, s: Statement) -> &StatementData {
        &self.statements[s.index()]
    }

    /// Registered name of any entity reference.
    pub fn name_of(&self, target: EntityRef) -> &str {
        match target {
            EntityRef::Variable(v) => &self.vars[v.index()].name,
            EntityRef::VariableGroup(g) => &self.var_groups[g.index()].name,
            EntityRef::Constraint(c) => &self.cons[c.index()].name,
            EntityRef::ConstraintGroup(g) => &self.con_groups[g.index()].name,
            EntityRef::Set(s) => &self.sets[s.index()].name,
            EntityRef::SetIterator(i) => &self.iters[i.index()].name,
            EntityRef::Parameter(p) => &self.params[p.index()].name,
            EntityRef::ParameterGroup(g) => &self.param_groups[g.index()].name,
            EntityRef::ImplicitVar(v) => &self.impvars[v.index()].name,
            EntityRef::Objective(o) => &self.objectives[o.index()].name,
            EntityRef::Model(m) => &self.models[m.index()].name,
            EntityRef::Statement(s) => &self.statements[s.index()].name,
        }
    }

    /// Creation order of any entity reference.
    pub fn order_of_ref(&self, target: EntityRef) -> u64 {
        match target {
            EntityRef::Variable(v) => self.vars[v.index()].order,
            EntityRef::VariableGroup(g) => self.var_groups[g.index()].order,
            EntityRef::Constraint(c) => self.cons[c.index()].order,
            EntityRef::ConstraintGroup(g) => self.con_groups[g.index()].order,
            EntityRef::Set(s) => self.sets[s.index()].order,
            EntityRef::SetIterator(i) => self.iters[i.index()].order,
            EntityRef::Parameter(p) => self.params[p.index()].order,
            EntityRef::ParameterGroup(g) => self.param_groups[g.index()].order,
            EntityRef::ImplicitVar(v) => self.impvars[v.index()].order,
            EntityRef::Objective(o) => self.objectives[o.index()].order,
            EntityRef::Model(m) => self.models[m.index()].order,
            EntityRef::Statement(s) => self.statements[s.index()].order,
        }
    }

    // ── Solution write-back ─────────────────────────────────

    /// Sets or clears the solution value of a variable.
    pub fn set_value(&mut self, v: Variable, value: Option<f64>) {
        self.vars[v.index()].value = value;
    }

    /// Sets or clears the dual value of a constraint.
    pub fn set_dual(&mut self, c: Constraint, value: Option<f64>) {
        self.cons[c.index()].dual = value;
    }

    /// Sets or clears the reported value of an objective.
    pub fn set_objective_value(&mut self, o: Objective, value: Option<f64>) {
        self.objectives[o.index()].value = value;
    }

    /// Sets or clears the reported value of an implicit variable.
    pub fn set_impvar_value(&mut self, v: ImplicitVar, value: Option<f64>) {
        self.impvars[v.index()].value = value;
    }

    // ── Declarative scope ───────────────────────────────────

    /// Runs a closure in a declarative scope. While one is open, including
    /// an entity that was created after the receiving model raises
    /// [`ModelForgeError::OrderingViolation`], since the model's serialized
    /// extent is fixed at its own declaration point.
    pub fn declarative<R>(&mut self, f: impl FnOnce(&mut Session) -> R) -> R {
        self.declarative_depth += 1;
        let out = f(self);
        self.declarative_depth -= 1;
        out
    }

    pub(crate) fn in_declarative(&self) -> bool {
        self.declarative_depth > 0
    }

    // ── Conditions ──────────────────────────────────────────

    /// Runs a closure with an extra membership condition active; every
    /// constraint attached inside inherits it.
    pub fn under_condition<R>(
        &mut self,
        condition: Condition,
        f: impl FnOnce(&mut Session) -> R,
    ) -> R {
        self.conditions.push(condition);
        let out = f(self);
        self.conditions.pop();
        out
    }

    pub(crate) fn active_conditions(&self) -> Vec<Condition> {
        self.conditions.clone()
    }

    // ── Numeric evaluation ──────────────────────────────────

    /// Evaluates an expression against current variable and parameter
    /// values.
    ///
    /// Variables fall back to their `init` value, then to zero. Parameters
    /// without a value and anything still depending on an unbound iterator,
    /// including shadow members, are reported as unresolved.
    pub fn evaluate(&self, expr: &Expression) -> Result<f64> {
        let mut total = expr.constant();
        for (key, coeff) in expr.terms() {
            total += coeff * self.term_value(key)?;
        }
        if let Some(sum) = expr.sums().first() {
            let names: Vec<&str> = sum
                .iterators
                .iter()
                .map(|i| self.iters[i.index()].name.as_str())
                .collect();
            return Err(ModelForgeError::UnresolvedAbstract(format!(
                "sum over {{{}}}",
                names.join(", ")
            )));
        }
        for opaque in expr.opaques() {
            let value = match &opaque.op {
                OpaqueOp::Mul(a, b) => self.evaluate(a)? * self.evaluate(b)?,
                OpaqueOp::Pow(a, n) => self.evaluate(a)?.powi(*n),
            };
            total += opaque.coeff * value;
        }
        Ok(total)
    }

    fn term_value(&self, key: &TermKey) -> Result<f64> {
        match key {
            TermKey::Var(v) => self.var_numeric(*v),
            TermKey::Quad(a, b) => Ok(self.var_numeric(*a)? * self.var_numeric(*b)?),
            TermKey::Iter(i) => Err(ModelForgeError::UnresolvedAbstract(
                self.iters[i.index()].name.clone(),
            )),
            TermKey::Param(p) => {
                let data = &self.params[p.index()];
                data.value.or(data.init).ok_or_else(|| {
                    ModelForgeError::UnresolvedAbstract(data.name.clone())
                })
            }
            TermKey::GroupParam(g, key) => {
                let data = &self.param_groups[g.index()];
                if crate::types::key_is_abstract(key) {
                    return Err(ModelForgeError::UnresolvedAbstract(data.name.clone()));
                }
                data.values
                    .get(key)
                    .copied()
                    .or(data.init)
                    .ok_or_else(|| ModelForgeError::UnresolvedAbstract(data.name.clone()))
            }
            TermKey::ImpVar(v) => self.evaluate(&self.impvars[v.index()].expr),
        }
    }

    fn var_numeric(&self, v: Variable) -> Result<f64> {
        let data = &self.vars[v.index()];
        // A shadow stands for an unbound iterator key; it has no number.
        if data.shadow {
            return Err(ModelForgeError::UnresolvedAbstract(data.display.clone()));
        }
        Ok(data.value.or(data.init).unwrap_or(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::variable::VarSpec;
    use crate::expr::Compare;

    #[test]
    fn test_reset_clears_everything() {
        let mut sess = Session::new();
        let x = sess.add_variable(VarSpec::new().named("x"));
        sess.add_constraint(x.le(5.0), Some("c")).unwrap();
        sess.reset();
        assert!(sess.lookup("x").is_none());
        assert!(sess.lookup("c").is_none());
        assert!(sess.vars.is_empty());
        assert!(sess.cons.is_empty());
    }

    #[test]
    fn test_evaluate_uses_value_then_init_then_zero() {
        let mut sess = Session::new();
        let x = sess.add_variable(VarSpec::new().init(3.0));
        let y = sess.add_variable(VarSpec::new());
        let expr = 2.0 * x + y + 1.0;
        assert_eq!(sess.evaluate(&expr).unwrap(), 7.0);
        sess.var_mut(x).value = Some(5.0);
        assert_eq!(sess.evaluate(&expr).unwrap(), 11.0);
    }

    #[test]
    fn test_evaluate_quadratic() {
        let mut sess = Session::new();
        let x = sess.add_variable(VarSpec::new().init(3.0));
        let y = sess.add_variable(VarSpec::new().init(4.0));
        let expr = x * y;
        assert_eq!(sess.evaluate(&expr).unwrap(), 12.0);
    }

    #[test]
    fn test_evaluate_rejects_shadow_member() {
        let mut sess = Session::new();
        let s = sess.add_set(crate::entity::set::SetSpec::new().named("S"));
        let g = sess.add_variables(
            &[crate::expr::Domain::Set(s)],
            VarSpec::new().named("x").init(1.0),
        );
        let i = sess.iterator(s);
        let v = sess.member(g, &crate::key![i]).unwrap();
        assert!(matches!(
            sess.evaluate(&Expression::from(v)),
            Err(ModelForgeError::UnresolvedAbstract(_))
        ));
        // Squared shadows are just as unresolved.
        assert!(matches!(
            sess.evaluate(&(Expression::from(v) * v)),
            Err(ModelForgeError::UnresolvedAbstract(_))
        ));
    }

    #[test]
    fn test_evaluate_rejects_unbound_iterator() {
        let mut sess = Session::new();
        let s = sess.add_set(crate::entity::set::SetSpec::new().named("S"));
        let i = sess.iterator(s);
        let expr = 2.0 * i;
        assert!(matches!(
            sess.evaluate(&expr),
            Err(ModelForgeError::UnresolvedAbstract(_))
        ));
    }
}
