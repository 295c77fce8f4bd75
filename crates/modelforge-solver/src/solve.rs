//! Orchestration: serialize, submit, write the solution back.

use tracing::{debug, info, warn};

use modelforge_core::{EntityRef, Model, Session};
use modelforge_export::{to_matrix, to_statements};

use crate::backend::{SolverBackend, SubmitRequest};
use crate::error::Result;
use crate::options::SolverOptions;
use crate::response::SolveResponse;

/// Solves a model through a backend and writes the solution back into the
/// session.
///
/// The model always travels in statement form; when the options request a
/// matrix upload the sparse-matrix form is attached too, which fails early
/// for nonlinear or still-abstract models.
///
/// Primal records resolve by display name, materializing members of
/// abstract groups the server expanded on its side; records naming nothing
/// known are skipped with a warning rather than failing the whole solve.
/// The objective value lands on the model's active objective.
pub fn solve(
    sess: &mut Session,
    model: Model,
    backend: &mut dyn SolverBackend,
    options: &SolverOptions,
) -> Result<SolveResponse> {
    sess.clear_solution(model);
    let statements = to_statements(sess, model);
    let matrix = if options.upload_matrix {
        Some(to_matrix(sess, model)?)
    } else {
        None
    };
    let name = sess.model(model).name.clone();
    debug!(model = %name, backend = backend.name(), bytes = statements.len(), "submitting");
    let response = backend.submit(SubmitRequest {
        name: &name,
        statements: &statements,
        matrix: matrix.as_ref(),
        options,
    })?;
    info!(
        model = %name,
        status = %response.status_text,
        objective = ?response.objective,
        "solve finished"
    );

    if response.status.has_solution() {
        write_back(sess, model, &response);
    }
    Ok(response)
}

fn write_back(sess: &mut Session, model: Model, response: &SolveResponse) {
    for record in &response.primal {
        if let Some(v) = sess.variable_by_name(&record.name) {
            sess.set_value(v, Some(record.value));
        } else if let Some(EntityRef::ImplicitVar(iv)) = sess.lookup(&record.name) {
            sess.set_impvar_value(iv, Some(record.value));
        } else {
            warn!(name = %record.name, "primal record matches no known variable");
        }
    }
    for record in &response.dual {
        if let Some(c) = sess.constraint_by_name(&record.name) {
            sess.set_dual(c, Some(record.value));
        } else {
            warn!(name = %record.name, "dual record matches no known constraint");
        }
    }
    if let Some(value) = response.objective {
        if let Some(active) = sess.model_objectives(model).first().copied() {
            sess.set_objective_value(active, Some(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ConRecord, SolveStatus, VarRecord};
    use modelforge_core::{
        key, Compare, Domain, EntityRef, ObjSense, QueryIndex, SetSpec, VarSpec,
    };

    /// Backend returning a canned response, recording what it was sent.
    struct Scripted {
        response: SolveResponse,
        last_statements: Option<String>,
        last_matrix_columns: Option<usize>,
    }

    impl Scripted {
        fn new(response: SolveResponse) -> Self {
            Self {
                response,
                last_statements: None,
                last_matrix_columns: None,
            }
        }
    }

    impl SolverBackend for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn submit(&mut self, request: SubmitRequest<'_>) -> Result<SolveResponse> {
            self.last_statements = Some(request.statements.to_owned());
            self.last_matrix_columns = request.matrix.map(|m| m.columns.len());
            Ok(self.response.clone())
        }
    }

    #[test]
    fn test_solve_writes_back_primal_and_dual() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x").lb(0.0));
        let obj = sess.add_objective(ObjSense::Max, Some("z"), 3.0 * x);
        let c = sess.add_constraint((2.0 * x).le(8.0), Some("cap")).unwrap();
        sess.include(m, EntityRef::Variable(x)).unwrap();
        sess.include(m, EntityRef::Objective(obj)).unwrap();
        sess.include(m, EntityRef::Constraint(c)).unwrap();

        let mut backend = Scripted::new(SolveResponse {
            status: SolveStatus::Optimal,
            status_text: "optimal".into(),
            objective: Some(12.0),
            primal: vec![VarRecord {
                name: "x".into(),
                value: 4.0,
            }],
            dual: vec![ConRecord {
                name: "cap".into(),
                value: 1.5,
            }],
        });
        let response = solve(&mut sess, m, &mut backend, &SolverOptions::new()).unwrap();
        assert_eq!(response.status, SolveStatus::Optimal);
        assert_eq!(sess.var(x).value, Some(4.0));
        assert_eq!(sess.con(c).dual, Some(1.5));
        assert_eq!(sess.objective(obj).value, Some(12.0));
        assert!(backend.last_statements.unwrap().contains("solve;"));
    }

    #[test]
    fn test_write_back_materializes_abstract_members() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let s = sess.add_set(SetSpec::new().named("S"));
        let g = sess.add_variables(&[Domain::Set(s)], VarSpec::new().named("x").lb(0.0));
        let total = sess.sum_of(g, &[QueryIndex::Wild]);
        let obj = sess.add_objective(ObjSense::Min, Some("z"), total);
        sess.include(m, EntityRef::Set(s)).unwrap();
        sess.include(m, EntityRef::VariableGroup(g)).unwrap();
        sess.include(m, EntityRef::Objective(obj)).unwrap();

        let mut backend = Scripted::new(SolveResponse {
            status: SolveStatus::Optimal,
            status_text: "optimal".into(),
            objective: Some(0.0),
            primal: vec![
                VarRecord {
                    name: "x[1]".into(),
                    value: 0.5,
                },
                VarRecord {
                    name: "x[2]".into(),
                    value: 0.25,
                },
            ],
            dual: vec![],
        });
        solve(&mut sess, m, &mut backend, &SolverOptions::new()).unwrap();
        let v = sess.member(g, &key![1]).unwrap();
        assert_eq!(sess.var(v).value, Some(0.5));
        assert_eq!(sess.var_group(g).member_order.len(), 2);
    }

    #[test]
    fn test_matrix_upload_attaches_matrix() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x").lb(0.0));
        let y = sess.add_variable(VarSpec::new().named("y").lb(0.0));
        let c = sess.add_constraint((x + y).le(4.0), Some("cap")).unwrap();
        sess.include(m, EntityRef::Variable(x)).unwrap();
        sess.include(m, EntityRef::Variable(y)).unwrap();
        sess.include(m, EntityRef::Constraint(c)).unwrap();
        let mut backend = Scripted::new(SolveResponse {
            status: SolveStatus::Optimal,
            status_text: "optimal".into(),
            ..Default::default()
        });
        let options = SolverOptions::new().with_matrix_upload();
        solve(&mut sess, m, &mut backend, &options).unwrap();
        assert_eq!(backend.last_matrix_columns, Some(2));
    }

    #[test]
    fn test_matrix_upload_rejects_nonlinear() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        let obj = sess.add_objective(ObjSense::Min, Some("z"), x * x);
        sess.include(m, EntityRef::Variable(x)).unwrap();
        sess.include(m, EntityRef::Objective(obj)).unwrap();
        let mut backend = Scripted::new(SolveResponse::default());
        let options = SolverOptions::new().with_matrix_upload();
        let err = solve(&mut sess, m, &mut backend, &options);
        assert!(matches!(err, Err(crate::error::SolverError::Export(_))));
    }

    #[test]
    fn test_infeasible_skips_write_back() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        sess.include(m, EntityRef::Variable(x)).unwrap();
        let mut backend = Scripted::new(SolveResponse {
            status: SolveStatus::Infeasible,
            status_text: "infeasible".into(),
            objective: None,
            primal: vec![VarRecord {
                name: "x".into(),
                value: 9.0,
            }],
            dual: vec![],
        });
        let response = solve(&mut sess, m, &mut backend, &SolverOptions::new()).unwrap();
        assert_eq!(response.status, SolveStatus::Infeasible);
        assert_eq!(sess.var(x).value, None);
    }

    #[test]
    fn test_resolve_clears_previous_solution() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        sess.include(m, EntityRef::Variable(x)).unwrap();
        sess.set_value(x, Some(99.0));
        let mut backend = Scripted::new(SolveResponse {
            status: SolveStatus::Failed,
            status_text: "error".into(),
            ..Default::default()
        });
        solve(&mut sess, m, &mut backend, &SolverOptions::new()).unwrap();
        assert_eq!(sess.var(x).value, None);
    }
}
