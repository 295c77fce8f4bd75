//! End-to-end scenarios: build, serialize, solve, write back.

use modelforge::prelude::*;
use modelforge::{
    key, Bound, ConRecord, EntityRef, ReadColumn, ReadData, SolveResponse, SubmitRequest,
    VarRecord,
};

/// Backend that returns a canned response and captures the submission.
struct Scripted {
    response: SolveResponse,
    seen: Vec<String>,
}

impl Scripted {
    fn new(response: SolveResponse) -> Self {
        Self {
            response,
            seen: Vec::new(),
        }
    }
}

impl SolverBackend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn submit(
        &mut self,
        request: SubmitRequest<'_>,
    ) -> Result<SolveResponse, modelforge::SolverError> {
        self.seen.push(request.statements.to_owned());
        Ok(self.response.clone())
    }
}

/// A small production-planning model over concrete data.
#[test]
fn test_concrete_production_model_round_trip() {
    let mut sess = Session::new();
    let m = sess.add_model(Some("prod"));

    let products = ["bands", "coils"];
    let rate = sess.add_parameters(
        &[Domain::values(products)],
        Some("rate"),
        ElementType::Num,
        None,
    );
    sess.set_group_param_value(rate, key!["bands"], 200.0);
    sess.set_group_param_value(rate, key!["coils"], 140.0);

    let make = sess.add_variables(
        &[Domain::values(products)],
        VarSpec::new().named("make").lb(0.0),
    );
    let b = sess.member(make, &key!["bands"]).unwrap();
    let c = sess.member(make, &key!["coils"]).unwrap();

    let profit = sess.add_objective(ObjSense::Max, Some("profit"), 25.0 * b + 30.0 * c);
    let hours = sess
        .add_constraint(
            ((1.0 / 200.0) * b + (1.0 / 140.0) * c).le(40.0),
            Some("hours"),
        )
        .unwrap();

    sess.include(m, EntityRef::ParameterGroup(rate)).unwrap();
    sess.include(m, EntityRef::VariableGroup(make)).unwrap();
    sess.include(m, EntityRef::Objective(profit)).unwrap();
    sess.include(m, EntityRef::Constraint(hours)).unwrap();

    let text = to_statements(&sess, m);
    assert!(text.contains("num rate {{'bands','coils'}};"));
    assert!(text.contains("rate['bands'] = 200;"));
    assert!(text.contains("var make {{'bands','coils'}} >= 0;"));
    assert!(text.contains("max profit = 25 * make['bands'] + 30 * make['coils'];"));
    assert!(text.ends_with("solve;"));

    let matrix = to_matrix(&sess, m).unwrap();
    assert_eq!(matrix.columns.len(), 2);
    assert_eq!(matrix.rows.len(), 1);
    assert_eq!(matrix.entries.len(), 2);
    assert_eq!(matrix.columns[0].obj, 25.0);

    let mut backend = Scripted::new(SolveResponse {
        status: SolveStatus::Optimal,
        status_text: "optimal".into(),
        objective: Some(192000.0),
        primal: vec![
            VarRecord {
                name: "make['bands']".into(),
                value: 6000.0,
            },
            VarRecord {
                name: "make['coils']".into(),
                value: 1400.0,
            },
        ],
        dual: vec![ConRecord {
            name: "hours".into(),
            value: 4900.0,
        }],
    });
    let response = solve(&mut sess, m, &mut backend, &SolverOptions::new()).unwrap();
    assert!(response.status.has_solution());
    assert_eq!(sess.var(b).value, Some(6000.0));
    assert_eq!(sess.con(hours).dual, Some(4900.0));
    assert_eq!(sess.objective(profit).value, Some(192000.0));
}

/// An abstract model whose data only exists server-side.
#[test]
fn test_abstract_model_stays_symbolic() {
    let mut sess = Session::new();
    let m = sess.add_model(Some("transport"));

    let nodes = sess.add_set(SetSpec::new().named("NODES").typed(&[ElementType::Str]));
    let demand = sess.add_parameters(
        &[Domain::Set(nodes)],
        Some("demand"),
        ElementType::Num,
        Some(0.0),
    );
    let load = sess.add_statement(StatementKind::Read(ReadData {
        table: "node_data".into(),
        set: Some(nodes),
        key_columns: vec!["node".into()],
        columns: vec![ReadColumn {
            target: demand,
            column: None,
        }],
    }));

    let ship = sess.add_variables(&[Domain::Set(nodes)], VarSpec::new().named("ship").lb(0.0));
    let cover = sess
        .add_constraints(&[Domain::Set(nodes)], Some("cover"), |sess, key| {
            let v = sess.member(ship, key).unwrap();
            let need = sess.param_ref(demand, key.clone());
            Expression::from(v).ge(need)
        })
        .unwrap();
    let total = sess.sum_of(ship, &[QueryIndex::Wild]);
    let cost = sess.add_objective(ObjSense::Min, Some("cost"), total);

    for member in [
        EntityRef::Set(nodes),
        EntityRef::ParameterGroup(demand),
        EntityRef::Statement(load),
        EntityRef::VariableGroup(ship),
        EntityRef::ConstraintGroup(cover),
        EntityRef::Objective(cost),
    ] {
        sess.include(m, member).unwrap();
    }

    let text = to_statements(&sess, m);
    assert!(text.contains("set <str> NODES;"));
    assert!(text.contains("read data node_data into NODES=[node] demand;"));
    assert!(text.contains("var ship {NODES} >= 0;"));
    assert!(text.contains("con cover {o1 in NODES} : ship[o1] - demand[o1] >= 0;"));
    assert!(text.contains("min cost = sum {o2 in NODES} (ship[o2]);"));

    // Symbolic structure cannot flatten to a matrix.
    assert!(to_matrix(&sess, m).is_err());

    // The server expands the group; write-back materializes its members.
    let mut backend = Scripted::new(SolveResponse {
        status: SolveStatus::Optimal,
        status_text: "optimal".into(),
        objective: Some(11.0),
        primal: vec![
            VarRecord {
                name: "ship['east']".into(),
                value: 4.0,
            },
            VarRecord {
                name: "ship['west']".into(),
                value: 7.0,
            },
        ],
        dual: vec![],
    });
    solve(&mut sess, m, &mut backend, &SolverOptions::new()).unwrap();
    let east = sess.member(ship, &key!["east"]).unwrap();
    assert_eq!(sess.var(east).value, Some(4.0));
    assert_eq!(sess.var_group(ship).member_order.len(), 2);
}

#[test]
fn test_generated_names_and_reset() {
    let mut sess = Session::new();
    for k in 1..=3 {
        let v = sess.add_variable(VarSpec::new());
        assert_eq!(sess.var(v).name, format!("var_{}", k));
    }
    sess.reset();
    let v = sess.add_variable(VarSpec::new());
    assert_eq!(sess.var(v).name, "var_1");
}

#[test]
fn test_multiple_objectives_keep_creation_order() {
    let mut sess = Session::new();
    let m = sess.add_model(Some("m"));
    let x = sess.add_variable(VarSpec::new().named("x").lb(0.0));
    let first = sess.add_objective(ObjSense::Min, Some("primary"), Expression::from(x));
    let second = sess.add_objective(ObjSense::Max, Some("secondary"), 2.0 * x);
    sess.include(m, EntityRef::Variable(x)).unwrap();
    sess.include(m, EntityRef::Objective(second)).unwrap();
    sess.include(m, EntityRef::Objective(first)).unwrap();

    let text = to_statements(&sess, m);
    assert!(text.find("min primary").unwrap() < text.find("max secondary").unwrap());
    // The first objective by creation order drives the matrix sense.
    let matrix = to_matrix(&sess, m).unwrap();
    assert_eq!(matrix.sense, ObjSense::Min);
    assert_eq!(matrix.columns[0].obj, 1.0);
}

#[test]
fn test_drop_statement_and_member_removal() {
    let mut sess = Session::new();
    let m = sess.add_model(Some("m"));
    let g = sess.add_variables(&[Domain::Range(0, 2)], VarSpec::new().named("x").lb(0.0));
    let cg = sess
        .add_constraints(&[Domain::Range(0, 2)], Some("cap"), |sess, key| {
            let v = sess.member(g, key).unwrap();
            Expression::from(v).le(9.0)
        })
        .unwrap();
    sess.include(m, EntityRef::VariableGroup(g)).unwrap();
    sess.include(m, EntityRef::ConstraintGroup(cg)).unwrap();

    let c0 = sess.constraint_member(cg, &key![0]).unwrap();
    sess.drop_constraint(c0).unwrap();

    let text = to_statements(&sess, m);
    assert!(!text.contains("con cap_0"));
    assert!(text.contains("con cap_1"));

    let drop = sess.add_statement(StatementKind::Drop(vec!["cap_1".into()]));
    sess.add_postsolve(m, drop);
    let text = to_statements(&sess, m);
    assert!(text.ends_with("drop cap_1;"));
}

#[test]
fn test_symbolic_bound_renders_attribute() {
    let mut sess = Session::new();
    let m = sess.add_model(Some("m"));
    let x = sess.add_variable(VarSpec::new().named("x").lb(0.0).ub(10.0));
    let y = sess.add_variable(
        VarSpec::new()
            .named("y")
            .lb(0.0)
            .ub(Bound::Attr(x, modelforge::BoundAttr::Ub)),
    );
    sess.include(m, EntityRef::Variable(x)).unwrap();
    sess.include(m, EntityRef::Variable(y)).unwrap();
    let text = to_statements(&sess, m);
    assert!(text.contains("var y >= 0 <= x.ub;"));
}
