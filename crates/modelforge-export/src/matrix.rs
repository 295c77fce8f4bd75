//! Sparse-matrix serializer.
//!
//! Flattens a fully concrete linear model into columns, rows, and
//! coefficient triplets for interchange with matrix-based solver APIs.
//! Anything symbolic (unbound iterators, unvalued parameters) or nonlinear
//! is rejected rather than silently dropped.

use std::collections::HashMap;

use tracing::debug;

use modelforge_core::{
    Bound, ConSense, Constraint, EntityRef, Expression, Model, ObjSense, Session, TermKey,
    VarType, Variable,
};

use crate::error::{ExportError, Result};

/// One column (variable) of the matrix form.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixColumn {
    /// Display name (`x[1,'east']` form for group members).
    pub name: String,
    /// Lower bound.
    pub lb: f64,
    /// Upper bound.
    pub ub: f64,
    /// Whether the variable is integer-valued (integer or binary).
    pub integer: bool,
    /// Objective coefficient.
    pub obj: f64,
}

/// One row (constraint) of the matrix form.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixRow {
    /// Constraint name.
    pub name: String,
    /// Relation direction.
    pub sense: ConSense,
    /// Right-hand side.
    pub rhs: f64,
    /// Width of a ranged row.
    pub range: Option<f64>,
}

/// One nonzero coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixEntry {
    /// Row index into [`MatrixProblem::rows`].
    pub row: usize,
    /// Column index into [`MatrixProblem::columns`].
    pub col: usize,
    /// Coefficient value.
    pub value: f64,
}

/// Sparse-matrix interchange form of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixProblem {
    /// Model name.
    pub name: String,
    /// Optimization direction of the active objective.
    pub sense: ObjSense,
    /// Constant offset of the objective.
    pub obj_constant: f64,
    /// Columns in variable creation order.
    pub columns: Vec<MatrixColumn>,
    /// Rows in constraint creation order.
    pub rows: Vec<MatrixRow>,
    /// Nonzero coefficients, row-major.
    pub entries: Vec<MatrixEntry>,
}

fn numeric_bound(sess: &Session, bound: &Bound, owner: &str) -> Result<f64> {
    match bound {
        Bound::Value(v) => Ok(*v),
        Bound::Attr(v, attr) => {
            let target = sess.var(*v);
            let inner = match attr {
                modelforge_core::BoundAttr::Lb => &target.lb,
                modelforge_core::BoundAttr::Ub => &target.ub,
            };
            inner
                .as_value()
                .ok_or_else(|| ExportError::Unresolved(owner.to_owned()))
        }
        Bound::Param(p, key) => {
            let data = sess.param(*p);
            if !key.is_empty() {
                return Err(ExportError::Unresolved(owner.to_owned()));
            }
            data.value
                .or(data.init)
                .ok_or_else(|| ExportError::Unresolved(owner.to_owned()))
        }
    }
}

/// Linear coefficients of an expression, checked concrete and linear.
fn linear_coefficients(expr: &Expression, owner: &str) -> Result<Vec<(Variable, f64)>> {
    if !expr.is_linear() {
        return Err(ExportError::Nonlinear(owner.to_owned()));
    }
    if !expr.sums().is_empty() {
        return Err(ExportError::Unresolved(owner.to_owned()));
    }
    let mut coeffs = Vec::new();
    for (key, coeff) in expr.terms() {
        if coeff == 0.0 {
            continue;
        }
        match key {
            TermKey::Var(v) => coeffs.push((*v, coeff)),
            _ => return Err(ExportError::Unresolved(owner.to_owned())),
        }
    }
    Ok(coeffs)
}

fn model_constraints(sess: &Session, model: Model) -> Vec<Constraint> {
    let mut cons = Vec::new();
    for member in sess.model_members_ordered(model) {
        match member {
            EntityRef::Constraint(c) => cons.push(c),
            EntityRef::ConstraintGroup(g) => {
                let group = sess.con_group(g);
                for key in &group.member_order {
                    if let Some(c) = group.members.get(key) {
                        cons.push(*c);
                    }
                }
            }
            _ => {}
        }
    }
    cons
}

/// Exports a model in sparse-matrix form.
///
/// The objective is the first included objective by creation order; a model
/// without one exports with all-zero objective coefficients.
pub fn to_matrix(sess: &Session, model: Model) -> Result<MatrixProblem> {
    let model_name = sess.model(model).name.clone();

    let variables = sess.model_variables(model);
    let mut col_of: HashMap<Variable, usize> = HashMap::with_capacity(variables.len());
    let mut columns = Vec::with_capacity(variables.len());
    for (idx, v) in variables.iter().enumerate() {
        let data = sess.var(*v);
        col_of.insert(*v, idx);
        columns.push(MatrixColumn {
            name: data.display.clone(),
            lb: numeric_bound(sess, &data.lb, &data.display)?,
            ub: numeric_bound(sess, &data.ub, &data.display)?,
            integer: data.vtype != VarType::Continuous,
            obj: 0.0,
        });
    }

    let mut sense = ObjSense::default();
    let mut obj_constant = 0.0;
    if let Some(active) = sess.model_objectives(model).first() {
        let data = sess.objective(*active);
        sense = data.sense;
        obj_constant = data.expr.constant();
        for (v, coeff) in linear_coefficients(&data.expr, &data.name)? {
            let col = col_of
                .get(&v)
                .ok_or_else(|| ExportError::NotInModel(sess.var(v).display.clone()))?;
            columns[*col].obj += coeff;
        }
    }

    let mut rows = Vec::new();
    let mut entries = Vec::new();
    for c in model_constraints(sess, model) {
        let data = sess.con(c);
        if let Some((g, _)) = &data.group {
            if !sess.con_group(*g).iterators.is_empty() {
                return Err(ExportError::Unresolved(data.name.clone()));
            }
        }
        let row = rows.len();
        for (v, coeff) in linear_coefficients(&data.body, &data.name)? {
            let col = col_of
                .get(&v)
                .ok_or_else(|| ExportError::NotInModel(sess.var(v).display.clone()))?;
            entries.push(MatrixEntry {
                row,
                col: *col,
                value: coeff,
            });
        }
        rows.push(MatrixRow {
            name: data.name.clone(),
            sense: data.sense,
            rhs: data.rhs,
            range: data.range,
        });
    }

    debug!(
        model = %model_name,
        columns = columns.len(),
        rows = rows.len(),
        nonzeros = entries.len(),
        "matrix export"
    );
    Ok(MatrixProblem {
        name: model_name,
        sense,
        obj_constant,
        columns,
        rows,
        entries,
    })
}
