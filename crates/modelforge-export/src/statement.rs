//! Statement-language serializer.
//!
//! Turns a model into the concise declarative form the optimization server
//! executes: one declaration per entity, members ordered by creation
//! order, a `solve;` line, then any post-solve statements. Rendering never
//! expands abstract structure; an abstract group serializes as a single
//! qualified declaration and the server resolves it against its own data.

use modelforge_core::{
    Bound, Condition, Domain, EntityRef, Expression, IndexValue, Key, Model, ObjSense, OpaqueOp,
    ReadData, Session, SetIterator, StatementKind, TermKey, VarType,
};

/// Renders a numeric literal; integral values drop the fraction.
pub fn fmt_num(v: f64) -> String {
    if v == f64::INFINITY {
        return "infinity".to_owned();
    }
    if v == f64::NEG_INFINITY {
        return "-infinity".to_owned();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

fn render_index_value(sess: &Session, v: &IndexValue) -> String {
    match v {
        IndexValue::Num(n) => n.to_string(),
        IndexValue::Str(s) => format!("'{}'", s),
        IndexValue::Iter(i) => sess.iter(*i).name.clone(),
    }
}

fn render_key(sess: &Session, key: &Key) -> String {
    key.iter()
        .map(|v| render_index_value(sess, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn render_term_name(sess: &Session, key: &TermKey) -> String {
    match key {
        TermKey::Var(v) => sess.var(*v).display.clone(),
        TermKey::Quad(a, b) => format!("{} * {}", sess.var(*a).display, sess.var(*b).display),
        TermKey::Iter(i) => sess.iter(*i).name.clone(),
        TermKey::Param(p) => sess.param(*p).name.clone(),
        TermKey::GroupParam(g, key) => {
            format!("{}[{}]", sess.param_group(*g).name, render_key(sess, key))
        }
        TermKey::ImpVar(v) => sess.impvar(*v).name.clone(),
    }
}

fn push_piece(out: &mut String, negative: bool, body: &str) {
    if out.is_empty() {
        if negative {
            out.push_str("- ");
        }
    } else if negative {
        out.push_str(" - ");
    } else {
        out.push_str(" + ");
    }
    out.push_str(body);
}

fn maybe_paren(rendered: String) -> String {
    if rendered.contains(' ') {
        format!("({})", rendered)
    } else {
        rendered
    }
}

/// Renders an expression; term order follows entity creation order.
pub fn render_expression(sess: &Session, expr: &Expression) -> String {
    let mut out = String::new();
    for (key, coeff) in expr.terms() {
        if coeff == 0.0 {
            continue;
        }
        let name = render_term_name(sess, key);
        let body = if coeff.abs() == 1.0 {
            name
        } else {
            format!("{} * {}", fmt_num(coeff.abs()), name)
        };
        push_piece(&mut out, coeff < 0.0, &body);
    }
    for sum in expr.sums() {
        let binding = render_binding(sess, &sum.iterators);
        let body = render_expression(sess, &sum.body);
        push_piece(&mut out, false, &format!("sum {{{}}} ({})", binding, body));
    }
    for opaque in expr.opaques() {
        let inner = match &opaque.op {
            OpaqueOp::Mul(a, b) => format!(
                "{} * {}",
                maybe_paren(render_expression(sess, a)),
                maybe_paren(render_expression(sess, b))
            ),
            OpaqueOp::Pow(a, n) => {
                format!("({}) ^ {}", render_expression(sess, a), n)
            }
        };
        let body = if opaque.coeff.abs() == 1.0 {
            inner
        } else {
            format!("{} * {}", fmt_num(opaque.coeff.abs()), inner)
        };
        push_piece(&mut out, opaque.coeff < 0.0, &body);
    }
    let constant = expr.constant();
    if constant != 0.0 || out.is_empty() {
        push_piece(&mut out, constant < 0.0, &fmt_num(constant.abs()));
    }
    out
}

/// Iterator binding list, e.g. `o4 in S` or `<o8, o10> in ARCS`.
fn render_binding(sess: &Session, iterators: &[SetIterator]) -> String {
    let mut parts = Vec::new();
    let mut i = 0;
    while i < iterators.len() {
        let data = sess.iter(iterators[i]);
        let set_name = &sess.set(data.set).name;
        match data.tuple_pos {
            Some((0, arity)) if i + arity <= iterators.len() => {
                let legs: Vec<&str> = iterators[i..i + arity]
                    .iter()
                    .map(|it| sess.iter(*it).name.as_str())
                    .collect();
                parts.push(format!("<{}> in {}", legs.join(", "), set_name));
                i += arity;
            }
            _ => {
                parts.push(format!("{} in {}", data.name, set_name));
                i += 1;
            }
        }
    }
    parts.join(", ")
}

fn render_condition(sess: &Session, cond: &Condition) -> String {
    format!(
        "{} {} {}",
        render_expression(sess, &cond.lhs),
        cond.op.symbol(),
        render_expression(sess, &cond.rhs)
    )
}

fn render_domain(sess: &Session, domain: &Domain) -> String {
    match domain {
        Domain::Set(s) => sess.set(*s).name.clone(),
        Domain::Values(vals) => format!(
            "{{{}}}",
            vals.iter()
                .map(|v| render_index_value(sess, v))
                .collect::<Vec<_>>()
                .join(",")
        ),
        Domain::Range(start, end) => format!("{}..{}", start, end - 1),
    }
}

fn render_domains(sess: &Session, domains: &[Domain]) -> String {
    format!(
        "{{{}}}",
        domains
            .iter()
            .map(|d| render_domain(sess, d))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn render_bound(sess: &Session, bound: &Bound) -> String {
    match bound {
        Bound::Value(v) => fmt_num(*v),
        Bound::Attr(v, attr) => format!("{}{}", sess.var(*v).display, attr.suffix()),
        Bound::Param(p, key) => {
            let name = &sess.param(*p).name;
            if key.is_empty() {
                name.clone()
            } else {
                format!("{}[{}]", name, render_key(sess, key))
            }
        }
    }
}

fn bound_is_default(bound: &Bound, default: f64) -> bool {
    matches!(bound, Bound::Value(v) if *v == default)
}

fn var_decl_suffix(
    sess: &Session,
    vtype: VarType,
    lb: &Bound,
    ub: &Bound,
    init: Option<f64>,
) -> String {
    let mut out = String::new();
    let (dlb, dub) = match vtype {
        VarType::Binary => (0.0, 1.0),
        _ => (f64::NEG_INFINITY, f64::INFINITY),
    };
    match vtype {
        VarType::Binary => out.push_str(" binary"),
        VarType::Integer => out.push_str(" integer"),
        VarType::Continuous => {}
    }
    if !bound_is_default(lb, dlb) {
        out.push_str(&format!(" >= {}", render_bound(sess, lb)));
    }
    if !bound_is_default(ub, dub) {
        out.push_str(&format!(" <= {}", render_bound(sess, ub)));
    }
    if let Some(init) = init {
        out.push_str(&format!(" init {}", fmt_num(init)));
    }
    out
}

fn render_set(sess: &Session, s: modelforge_core::Set, lines: &mut Vec<String>) {
    let data = sess.set(s);
    let mut decl = "set".to_owned();
    let multi = data.etypes.len() > 1
        || data
            .etypes
            .first()
            .is_some_and(|t| *t != modelforge_core::ElementType::Num);
    if multi {
        let kinds: Vec<&str> = data.etypes.iter().map(|t| t.keyword()).collect();
        decl.push_str(&format!(" <{}>", kinds.join(", ")));
    }
    decl.push(' ');
    decl.push_str(&data.name);
    if let Some(members) = &data.members {
        let rendered: Vec<String> = members
            .iter()
            .map(|key| {
                if key.len() == 1 {
                    render_index_value(sess, &key[0])
                } else {
                    format!("<{}>", render_key(sess, key))
                }
            })
            .collect();
        decl.push_str(&format!(" = {{{}}}", rendered.join(",")));
    }
    decl.push(';');
    lines.push(decl);
}

fn render_read_data(sess: &Session, rd: &ReadData) -> String {
    let mut out = format!("read data {} into ", rd.table);
    if let Some(set) = rd.set {
        out.push_str(&sess.set(set).name);
        out.push('=');
    }
    out.push_str(&format!("[{}]", rd.key_columns.join(" ")));
    for col in &rd.columns {
        let target = &sess.param_group(col.target).name;
        match &col.column {
            Some(source) if source != target => {
                out.push_str(&format!(" {}={}", target, source))
            }
            _ => out.push_str(&format!(" {}", target)),
        }
    }
    out.push(';');
    out
}

fn render_constraint_line(sess: &Session, c: modelforge_core::Constraint) -> String {
    let data = sess.con(c);
    let body = render_expression(sess, &data.body);
    let relation = match data.range {
        Some(range) => format!(
            "{} <= {} <= {}",
            fmt_num(data.rhs),
            body,
            fmt_num(data.rhs + range)
        ),
        None => format!("{} {} {}", body, data.sense.symbol(), fmt_num(data.rhs)),
    };
    format!("con {} : {};", data.name, relation)
}

fn render_con_group(sess: &Session, g: modelforge_core::ConstraintGroup, lines: &mut Vec<String>) {
    let data = sess.con_group(g);
    if data.iterators.is_empty() {
        for key in &data.member_order {
            if let Some(c) = data.members.get(key) {
                lines.push(render_constraint_line(sess, *c));
            }
        }
        return;
    }
    // Abstract template: one qualified declaration.
    let Some(key) = data.member_order.first() else {
        return;
    };
    let Some(&c) = data.members.get(key) else {
        return;
    };
    let member = sess.con(c);
    let mut qualifier = render_binding(sess, &data.iterators);
    if !member.filters.is_empty() {
        let conds: Vec<String> = member
            .filters
            .iter()
            .map(|f| render_condition(sess, f))
            .collect();
        qualifier.push_str(&format!(" : {}", conds.join(" and ")));
    }
    let body = render_expression(sess, &member.body);
    let relation = match member.range {
        Some(range) => format!(
            "{} <= {} <= {}",
            fmt_num(member.rhs),
            body,
            fmt_num(member.rhs + range)
        ),
        None => format!("{} {} {}", body, member.sense.symbol(), fmt_num(member.rhs)),
    };
    lines.push(format!("con {} {{{}}} : {};", data.name, qualifier, relation));
}

fn render_var_group(sess: &Session, g: modelforge_core::VariableGroup, lines: &mut Vec<String>) {
    let data = sess.var_group(g);
    let defaults = &data.defaults;
    let (dlb, dub) = defaults.resolved_bounds();
    lines.push(format!(
        "var {} {}{};",
        data.name,
        render_domains(sess, &data.domains),
        var_decl_suffix(sess, defaults.vtype(), &dlb, &dub, defaults.init_value())
    ));
    // Sparse overrides: only members diverging from the group defaults.
    for key in &data.member_order {
        let Some(&v) = data.members.get(key) else {
            continue;
        };
        let member = sess.var(v);
        if member.lb != dlb {
            lines.push(format!(
                "{}.lb = {};",
                member.display,
                render_bound(sess, &member.lb)
            ));
        }
        if member.ub != dub {
            lines.push(format!(
                "{}.ub = {};",
                member.display,
                render_bound(sess, &member.ub)
            ));
        }
        if member.init != defaults.init_value() {
            if let Some(init) = member.init {
                lines.push(format!("{} = {};", member.display, fmt_num(init)));
            }
        }
    }
    // Shadow overrides cover every key at once, guarded by the shadow's
    // iterator binding.
    for key in &data.shadow_order {
        let Some(&v) = data.shadows.get(key) else {
            continue;
        };
        let member = sess.var(v);
        let iterators: Vec<SetIterator> = key
            .iter()
            .filter_map(|value| match value {
                IndexValue::Iter(i) => Some(*i),
                _ => None,
            })
            .collect();
        if iterators.is_empty() {
            continue;
        }
        let binding = render_binding(sess, &iterators);
        if member.lb != dlb {
            lines.push(format!(
                "for {{{}}} {}.lb = {};",
                binding,
                member.display,
                render_bound(sess, &member.lb)
            ));
        }
        if member.ub != dub {
            lines.push(format!(
                "for {{{}}} {}.ub = {};",
                binding,
                member.display,
                render_bound(sess, &member.ub)
            ));
        }
        if member.init != defaults.init_value() {
            if let Some(init) = member.init {
                lines.push(format!(
                    "for {{{}}} {} = {};",
                    binding,
                    member.display,
                    fmt_num(init)
                ));
            }
        }
    }
}

fn render_statement(sess: &Session, kind: &StatementKind) -> String {
    match kind {
        StatementKind::Literal(text) => format!("{};", text),
        StatementKind::Read(rd) => render_read_data(sess, rd),
        StatementKind::Print(names) => format!("print {};", names.join(" ")),
        StatementKind::Drop(names) => format!("drop {};", names.join(" ")),
        StatementKind::Problem { name, members } => {
            format!("problem {} include {};", name, members.join(" "))
        }
    }
}

fn render_member(sess: &Session, member: EntityRef, lines: &mut Vec<String>) {
    match member {
        EntityRef::Set(s) => render_set(sess, s, lines),
        EntityRef::Parameter(p) => {
            let data = sess.param(p);
            let mut decl = format!("{} {}", data.ptype.keyword(), data.name);
            if let Some(init) = data.init {
                decl.push_str(&format!(" init {}", fmt_num(init)));
            }
            decl.push(';');
            lines.push(decl);
            if let Some(value) = data.value {
                lines.push(format!("{} = {};", data.name, fmt_num(value)));
            }
        }
        EntityRef::ParameterGroup(g) => {
            let data = sess.param_group(g);
            let mut decl = format!(
                "{} {} {}",
                data.ptype.keyword(),
                data.name,
                render_domains(sess, &data.domains)
            );
            if let Some(init) = data.init {
                decl.push_str(&format!(" init {}", fmt_num(init)));
            }
            decl.push(';');
            lines.push(decl);
            for key in &data.value_order {
                if let Some(value) = data.values.get(key) {
                    lines.push(format!(
                        "{}[{}] = {};",
                        data.name,
                        render_key(sess, key),
                        fmt_num(*value)
                    ));
                }
            }
        }
        EntityRef::Variable(v) => {
            let data = sess.var(v);
            lines.push(format!(
                "var {}{};",
                data.name,
                var_decl_suffix(sess, data.vtype, &data.lb, &data.ub, data.init)
            ));
        }
        EntityRef::VariableGroup(g) => render_var_group(sess, g, lines),
        EntityRef::ImplicitVar(v) => {
            let data = sess.impvar(v);
            lines.push(format!(
                "impvar {} = {};",
                data.name,
                render_expression(sess, &data.expr)
            ));
        }
        EntityRef::Constraint(c) => lines.push(render_constraint_line(sess, c)),
        EntityRef::ConstraintGroup(g) => render_con_group(sess, g, lines),
        EntityRef::Objective(o) => {
            let data = sess.objective(o);
            lines.push(format!(
                "{} {} = {};",
                data.sense.keyword(),
                data.name,
                render_expression(sess, &data.expr)
            ));
        }
        EntityRef::Statement(s) => lines.push(render_statement(sess, &sess.statement(s).kind)),
        // Models merge into their container at include time and never
        // appear as members; iterators only live inside aggregations.
        EntityRef::Model(_) | EntityRef::SetIterator(_) => {}
    }
}

/// Serializes a model to statement form.
///
/// Declarations come out in creation order regardless of inclusion order,
/// followed by `solve;` and the model's post-solve statements. The sense
/// keyword of the first objective (by creation order) decides the direction
/// the server optimizes.
pub fn to_statements(sess: &Session, model: Model) -> String {
    let mut lines = Vec::new();
    for member in sess.model_members_ordered(model) {
        render_member(sess, member, &mut lines);
    }
    lines.push("solve;".to_owned());
    for statement in &sess.model(model).post_statements {
        lines.push(render_statement(sess, &sess.statement(*statement).kind));
    }
    lines.join("\n")
}

/// Objective sense the serialized model solves with.
pub fn solve_sense(sess: &Session, model: Model) -> ObjSense {
    sess.model_objectives(model)
        .first()
        .map(|o| sess.objective(*o).sense)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelforge_core::{
        key, Compare, Condition, ElementType, QueryIndex, SetSpec, VarSpec,
    };

    #[test]
    fn test_fmt_num_drops_integral_fraction() {
        assert_eq!(fmt_num(2.0), "2");
        assert_eq!(fmt_num(-2.5), "-2.5");
        assert_eq!(fmt_num(f64::INFINITY), "infinity");
    }

    #[test]
    fn test_render_linear_expression() {
        let mut sess = Session::new();
        let x = sess.add_variable(VarSpec::new().named("x"));
        let y = sess.add_variable(VarSpec::new().named("y"));
        let expr = 2.0 * x - y + 5.0;
        assert_eq!(render_expression(&sess, &expr), "2 * x - y + 5");
    }

    #[test]
    fn test_render_zero_expression() {
        let sess = Session::new();
        assert_eq!(render_expression(&sess, &Expression::new()), "0");
    }

    #[test]
    fn test_scalar_entities_render() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x").integer().lb(0.0).ub(10.0));
        let obj = sess.add_objective(ObjSense::Min, Some("total"), 2.0 * x);
        let c = sess.add_constraint(x.ge(1.0), Some("floor")).unwrap();
        sess.include(m, EntityRef::Variable(x)).unwrap();
        sess.include(m, EntityRef::Objective(obj)).unwrap();
        sess.include(m, EntityRef::Constraint(c)).unwrap();
        let out = to_statements(&sess, m);
        assert_eq!(
            out,
            "var x integer >= 0 <= 10;\nmin total = 2 * x;\ncon floor : x >= 1;\nsolve;"
        );
    }

    #[test]
    fn test_inline_domain_group_renders_braced() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let g = sess.add_variables(
            &[Domain::values([0, 1, 2])],
            VarSpec::new().named("x").integer().lb(0.0),
        );
        sess.include(m, EntityRef::VariableGroup(g)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("var x {{0,1,2}} integer >= 0;"));
    }

    #[test]
    fn test_member_override_renders_sparse() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let g = sess.add_variables(
            &[Domain::values(["a", "b"])],
            VarSpec::new().named("x").lb(0.0),
        );
        let v = sess.member(g, &key!["b"]).unwrap();
        sess.set_bounds(v, None, Some(Bound::Value(8.0)));
        sess.include(m, EntityRef::VariableGroup(g)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("var x {{'a','b'}} >= 0;"));
        assert!(out.contains("x['b'].ub = 8;"));
        assert!(!out.contains("x['a']"));
    }

    #[test]
    fn test_abstract_group_renders_qualified_template() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let s = sess.add_set(SetSpec::new().named("S"));
        let g = sess.add_variables(&[Domain::Set(s)], VarSpec::new().named("x").lb(0.0));
        let cg = sess
            .add_constraints(&[Domain::Set(s)], Some("c"), |sess, key| {
                let v = sess.member(g, key).unwrap();
                let i = match &key[0] {
                    IndexValue::Iter(i) => *i,
                    _ => unreachable!(),
                };
                (Expression::from(i) * v)
                    .le(5.0)
                    .filter(Condition::gt(2.0 * i, 1.0))
            })
            .unwrap();
        sess.include(m, EntityRef::Set(s)).unwrap();
        sess.include(m, EntityRef::VariableGroup(g)).unwrap();
        sess.include(m, EntityRef::ConstraintGroup(cg)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("set S;"));
        assert!(out.contains("var x {S} >= 0;"));
        assert!(out.contains("con c {o1 in S : 2 * o1 > 1} : o1 * x[o1] <= 5;"));
    }

    #[test]
    fn test_symbolic_sum_objective() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let s = sess.add_set(SetSpec::new().named("S"));
        let g = sess.add_variables(&[Domain::Set(s)], VarSpec::new().named("x").lb(0.0));
        let total = sess.sum_of(g, &[QueryIndex::Wild]);
        let obj = sess.add_objective(ObjSense::Min, Some("z"), total);
        sess.include(m, EntityRef::Set(s)).unwrap();
        sess.include(m, EntityRef::VariableGroup(g)).unwrap();
        sess.include(m, EntityRef::Objective(obj)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("min z = sum {o1 in S} (x[o1]);"));
    }

    #[test]
    fn test_param_group_with_read_data() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let s = sess.add_set(SetSpec::new().named("CITIES").typed(&[ElementType::Str]));
        let demand = sess.add_parameters(
            &[Domain::Set(s)],
            Some("demand"),
            ElementType::Num,
            Some(0.0),
        );
        let stmt = sess.add_statement(StatementKind::Read(ReadData {
            table: "city_data".into(),
            set: Some(s),
            key_columns: vec!["city".into()],
            columns: vec![modelforge_core::ReadColumn {
                target: demand,
                column: Some("dem".into()),
            }],
        }));
        sess.include(m, EntityRef::Set(s)).unwrap();
        sess.include(m, EntityRef::ParameterGroup(demand)).unwrap();
        sess.include(m, EntityRef::Statement(stmt)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("set <str> CITIES;"));
        assert!(out.contains("num demand {CITIES} init 0;"));
        assert!(out.contains("read data city_data into CITIES=[city] demand=dem;"));
    }

    #[test]
    fn test_ranged_constraint_renders_double_sided() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        let y = sess.add_variable(VarSpec::new().named("y"));
        let c = sess
            .add_constraint((x + y).eq_range(2.0, 8.0), Some("band"))
            .unwrap();
        sess.include(m, EntityRef::Variable(x)).unwrap();
        sess.include(m, EntityRef::Variable(y)).unwrap();
        sess.include(m, EntityRef::Constraint(c)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("con band : 2 <= x + y <= 8;"));
    }

    #[test]
    fn test_postsolve_statements_after_solve() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        sess.include(m, EntityRef::Variable(x)).unwrap();
        let p = sess.add_statement(StatementKind::Print(vec!["x".into()]));
        sess.add_postsolve(m, p);
        let out = to_statements(&sess, m);
        let solve_pos = out.find("solve;").unwrap();
        let print_pos = out.find("print x;").unwrap();
        assert!(print_pos > solve_pos);
    }

    #[test]
    fn test_creation_order_beats_inclusion_order() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        let c = sess.add_constraint(x.le(1.0), Some("c")).unwrap();
        // Included backwards on purpose.
        sess.include(m, EntityRef::Constraint(c)).unwrap();
        sess.include(m, EntityRef::Variable(x)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.find("var x").unwrap() < out.find("con c").unwrap());
    }

    #[test]
    fn test_problem_statement_renders_include_line() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        sess.include(m, EntityRef::Variable(x)).unwrap();
        let stmt = sess.add_statement(StatementKind::Problem {
            name: "inner".into(),
            members: vec!["x".into()],
        });
        sess.include(m, EntityRef::Statement(stmt)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("problem inner include x;"));
    }

    #[test]
    fn test_shadow_override_renders_for_guard() {
        let mut sess = Session::new();
        let m = sess.add_model(Some("m"));
        let s = sess.add_set(SetSpec::new().named("S"));
        let g = sess.add_variables(&[Domain::Set(s)], VarSpec::new().named("x").lb(0.0));
        let i = sess.iterator(s);
        let v = sess.member(g, &key![i]).unwrap();
        sess.set_bounds(v, None, Some(Bound::Value(9.0)));
        sess.include(m, EntityRef::Set(s)).unwrap();
        sess.include(m, EntityRef::VariableGroup(g)).unwrap();
        let out = to_statements(&sess, m);
        assert!(out.contains("var x {S} >= 0;"));
        assert!(out.contains("for {o1 in S} x[o1].ub = 9;"));
    }

    #[test]
    fn test_merged_model_renders_inner_members() {
        let mut sess = Session::new();
        let inner = sess.add_model(Some("inner"));
        let x = sess.add_variable(VarSpec::new().named("x"));
        sess.include(inner, EntityRef::Variable(x)).unwrap();
        let outer = sess.add_model(Some("outer"));
        let y = sess.add_variable(VarSpec::new().named("y"));
        sess.include(outer, EntityRef::Variable(y)).unwrap();
        sess.include(outer, EntityRef::Model(inner)).unwrap();
        let out = to_statements(&sess, outer);
        assert!(out.contains("var x;"));
        assert!(out.contains("var y;"));
    }
}
