//! Decision variables: scalars, index-driven groups, and shadow members.

use std::collections::HashMap;

use tracing::warn;

use crate::error::{ModelForgeError, Result};
use crate::expr::{Domain, Expression, TermKey};
use crate::registry::EntityRef;
use crate::session::{ScopeFrame, Session};
use crate::types::{
    key_is_abstract, Bound, IndexValue, Key, QueryIndex, VarType, Variable, VariableGroup,
};

/// Builder for a new variable or the defaults of a variable group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VarSpec {
    pub(crate) name: Option<String>,
    pub(crate) vtype: VarType,
    pub(crate) lb: Option<Bound>,
    pub(crate) ub: Option<Bound>,
    pub(crate) init: Option<f64>,
}

impl VarSpec {
    /// Continuous, free, unnamed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests an explicit name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Integer variable.
    pub fn integer(mut self) -> Self {
        self.vtype = VarType::Integer;
        self
    }

    /// Binary variable; bounds default to `[0, 1]`.
    pub fn binary(mut self) -> Self {
        self.vtype = VarType::Binary;
        self
    }

    /// Lower bound.
    pub fn lb(mut self, bound: impl Into<Bound>) -> Self {
        self.lb = Some(bound.into());
        self
    }

    /// Upper bound.
    pub fn ub(mut self, bound: impl Into<Bound>) -> Self {
        self.ub = Some(bound.into());
        self
    }

    /// Initial value hint.
    pub fn init(mut self, value: f64) -> Self {
        self.init = Some(value);
        self
    }

    /// Variable type.
    pub fn vtype(&self) -> VarType {
        self.vtype
    }

    /// Initial value hint, if any.
    pub fn init_value(&self) -> Option<f64> {
        self.init
    }

    /// Effective bounds after applying type defaults.
    pub fn resolved_bounds(&self) -> (Bound, Bound) {
        let (dlb, dub) = match self.vtype {
            VarType::Binary => (0.0, 1.0),
            _ => (f64::NEG_INFINITY, f64::INFINITY),
        };
        (
            self.lb.clone().unwrap_or(Bound::Value(dlb)),
            self.ub.clone().unwrap_or(Bound::Value(dub)),
        )
    }
}

/// Stored state of one variable.
#[derive(Debug, Clone)]
pub struct VarData {
    /// Solver-safe name; for members, group name and key joined with `_`.
    pub name: String,
    /// Bracketed display form, e.g. `x[1,'east']`; equals `name` for
    /// scalars.
    pub display: String,
    /// Creation order (group members inherit the group's).
    pub order: u64,
    /// Variable type.
    pub vtype: VarType,
    /// Lower bound.
    pub lb: Bound,
    /// Upper bound.
    pub ub: Bound,
    /// Initial value hint.
    pub init: Option<f64>,
    /// Solution value, once written back.
    pub value: Option<f64>,
    /// Owning group and member key, for members.
    pub group: Option<(VariableGroup, Key)>,
    /// Whether this is a shadow member standing in for an abstract key.
    pub shadow: bool,
}

/// Stored state of a variable group.
#[derive(Debug, Clone)]
pub struct VarGroupData {
    /// Registered name.
    pub name: String,
    /// Creation order.
    pub order: u64,
    /// Index space.
    pub domains: Vec<Domain>,
    /// Defaults applied to every member.
    pub defaults: VarSpec,
    /// Member keys in materialization order.
    pub member_order: Vec<Key>,
    /// Concrete members.
    pub members: HashMap<Key, Variable>,
    /// Shadow members, cached per abstract key so repeated access yields
    /// the same handle.
    pub shadows: HashMap<Key, Variable>,
    /// Shadow keys in creation order.
    pub shadow_order: Vec<Key>,
    /// Whether any dimension lacks a concrete element list.
    pub has_abstract: bool,
}

impl Session {
    /// Declares a scalar decision variable.
    pub fn add_variable(&mut self, spec: VarSpec) -> Variable {
        let name = self.registry_mut().assign_name(spec.name.as_deref(), "var");
        let handle = Variable::from_index(self.vars.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::Variable(handle));
        let (lb, ub) = spec.resolved_bounds();
        self.vars.push(VarData {
            display: name.clone(),
            name,
            order,
            vtype: spec.vtype,
            lb,
            ub,
            init: spec.init,
            value: None,
            group: None,
            shadow: false,
        });
        handle
    }

    /// Declares a variable group over an index space.
    ///
    /// Fully concrete domains materialize every member up front, in
    /// Cartesian order; a group with an abstract dimension materializes
    /// members lazily on access instead.
    pub fn add_variables(&mut self, domains: &[Domain], spec: VarSpec) -> VariableGroup {
        let name = self.registry_mut().assign_name(spec.name.as_deref(), "var");
        let handle = VariableGroup::from_index(self.var_groups.len());
        let order = self
            .registry_mut()
            .register(&name, EntityRef::VariableGroup(handle));
        let has_abstract = domains.iter().any(|d| d.is_abstract(self));
        let mut defaults = spec;
        defaults.name = None;
        self.var_groups.push(VarGroupData {
            name,
            order,
            domains: domains.to_vec(),
            defaults,
            member_order: Vec::new(),
            members: HashMap::new(),
            shadows: HashMap::new(),
            shadow_order: Vec::new(),
            has_abstract,
        });
        if !has_abstract {
            let fragments: Vec<Vec<Key>> = domains
                .iter()
                .map(|d| self.domain_fragments(d))
                .collect();
            for key in crate::expr::sum::cartesian_keys(&fragments) {
                self.materialize_member(handle, key);
            }
        }
        handle
    }

    fn materialize_member(&mut self, g: VariableGroup, key: Key) -> Variable {
        let group = &self.var_groups[g.index()];
        let gname = group.name.clone();
        let order = group.order;
        let defaults = group.defaults.clone();
        let name = format!("{}_{}", gname, self.key_flat(&key));
        let display = format!("{}[{}]", gname, self.key_display(&key));
        let (lb, ub) = defaults.resolved_bounds();
        let handle = Variable::from_index(self.vars.len());
        self.vars.push(VarData {
            name,
            display,
            order,
            vtype: defaults.vtype,
            lb,
            ub,
            init: defaults.init,
            value: None,
            group: Some((g, key.clone())),
            shadow: false,
        });
        let group = &mut self.var_groups[g.index()];
        group.member_order.push(key.clone());
        group.members.insert(key, handle);
        handle
    }

    fn shadow_member(&mut self, g: VariableGroup, key: &Key) -> Variable {
        if let Some(v) = self.var_groups[g.index()].shadows.get(key) {
            return *v;
        }
        let group = &self.var_groups[g.index()];
        let gname = group.name.clone();
        let order = group.order;
        let defaults = group.defaults.clone();
        let display = format!("{}[{}]", gname, self.key_display(key));
        let (lb, ub) = defaults.resolved_bounds();
        let handle = Variable::from_index(self.vars.len());
        self.vars.push(VarData {
            name: display.clone(),
            display,
            order,
            vtype: defaults.vtype,
            lb,
            ub,
            init: defaults.init,
            value: None,
            group: Some((g, key.clone())),
            shadow: true,
        });
        let group = &mut self.var_groups[g.index()];
        group.shadow_order.push(key.clone());
        group.shadows.insert(key.clone(), handle);
        handle
    }

    /// Resolves one member of a variable group.
    ///
    /// Abstract keys (containing a set iterator) resolve to a cached shadow
    /// member; repeated access with an equal key returns the same handle.
    /// Concrete keys resolve to materialized members, creating them on
    /// first access for groups with an abstract dimension.
    pub fn member(&mut self, g: VariableGroup, key: &Key) -> Result<Variable> {
        if key_is_abstract(key) {
            return Ok(self.shadow_member(g, key));
        }
        if let Some(v) = self.var_groups[g.index()].members.get(key) {
            return Ok(*v);
        }
        if self.var_groups[g.index()].has_abstract {
            return Ok(self.materialize_member(g, key.clone()));
        }
        Err(ModelForgeError::NotFound(format!(
            "{}[{}]",
            self.var_groups[g.index()].name,
            self.key_display(key)
        )))
    }

    /// Materialized members matching a partial query, in creation order.
    ///
    /// Shadow members never match; an empty result is reported as a
    /// warning, never an error.
    pub fn select(&self, g: VariableGroup, query: &[QueryIndex]) -> Vec<Variable> {
        let group = &self.var_groups[g.index()];
        let hits: Vec<Variable> = group
            .member_order
            .iter()
            .filter(|key| query_matches(query, key))
            .filter_map(|key| group.members.get(key).copied())
            .collect();
        if hits.is_empty() {
            warn!(group = %group.name, "query matched no members");
        }
        hits
    }

    /// Sums group members matching a partial query.
    ///
    /// Wildcard positions over abstract sets stay symbolic: a fresh
    /// iterator is bound per position and the result is a `sum` node over
    /// the shadow member. Everything else expands eagerly. Omitted trailing
    /// dimensions range over their whole domain, as if queried with a
    /// wildcard.
    pub fn sum_of(&mut self, g: VariableGroup, query: &[QueryIndex]) -> Expression {
        let domains = self.var_groups[g.index()].domains.clone();
        let arity: usize = domains.iter().map(|d| d.arity(self)).sum();
        if query.len() > arity {
            warn!(
                group = %self.var_groups[g.index()].name,
                expected = arity,
                got = query.len(),
                "query has more positions than the group has dimensions"
            );
            return Expression::new();
        }
        let mut query = query.to_vec();
        query.resize(arity, QueryIndex::Wild);
        self.frames.push(ScopeFrame::default());
        let mut fragments: Vec<Vec<Key>> = Vec::new();
        let mut pos = 0;
        for domain in &domains {
            let span = domain.arity(self);
            let slice = &query[pos..pos + span];
            pos += span;
            fragments.push(self.query_fragments(domain, slice));
        }
        let mut total = Expression::new();
        for key in crate::expr::sum::cartesian_keys(&fragments) {
            match self.member(g, &key) {
                Ok(v) => total.add_term(TermKey::Var(v), 1.0),
                Err(_) => warn!(
                    group = %self.var_groups[g.index()].name,
                    "skipping query key outside the group domain"
                ),
            }
        }
        let frame = self.frames.pop().unwrap_or_default();
        if frame.bound.is_empty() {
            total
        } else {
            let mut wrapped = Expression::new();
            wrapped.push_sum(crate::expr::SumExpr {
                iterators: frame.bound,
                body: Box::new(total),
            });
            wrapped
        }
    }

    /// Key fragments one domain contributes under a query slice.
    fn query_fragments(&mut self, domain: &Domain, slice: &[QueryIndex]) -> Vec<Key> {
        if slice.iter().all(|q| matches!(q, QueryIndex::Wild)) {
            return self.domain_fragments(domain);
        }
        match domain {
            Domain::Set(s) if self.set(*s).dim() > 1 => {
                if self.set(*s).is_abstract() {
                    warn!(
                        set = %self.set(*s).name,
                        "partial query over an abstract tuple set is not expandable"
                    );
                    Vec::new()
                } else {
                    self.set(*s)
                        .members
                        .clone()
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|key| query_matches(slice, key))
                        .collect()
                }
            }
            _ => match &slice[0] {
                QueryIndex::One(v) => vec![single(v.clone())],
                QueryIndex::Many(vs) => vs.iter().map(|v| single(v.clone())).collect(),
                QueryIndex::Wild => unreachable!("all-wild handled above"),
            },
        }
    }

    /// Resolves a variable by registered or display name, materializing a
    /// group member if the name uses bracket form.
    pub fn variable_by_name(&mut self, name: &str) -> Option<Variable> {
        if let Some(EntityRef::Variable(v)) = self.lookup(name) {
            return Some(v);
        }
        let open = name.find('[')?;
        if !name.ends_with(']') {
            return None;
        }
        let group = match self.lookup(&name[..open]) {
            Some(EntityRef::VariableGroup(g)) => g,
            _ => return None,
        };
        let key = parse_key(&name[open + 1..name.len() - 1])?;
        self.member(group, &key).ok()
    }

    /// Overrides the bounds of one variable.
    pub fn set_bounds(&mut self, v: Variable, lb: Option<Bound>, ub: Option<Bound>) {
        let data = &mut self.vars[v.index()];
        if let Some(lb) = lb {
            data.lb = lb;
        }
        if let Some(ub) = ub {
            data.ub = ub;
        }
    }

    /// Drops a variable: removes it from the registry (scalars), from its
    /// owning group's iteration, and from every model that included it.
    /// The arena slot stays so existing expressions do not dangle, but the
    /// name is no longer resolvable.
    pub fn drop_variable(&mut self, v: Variable) -> Result<()> {
        let name = self.vars[v.index()].name.clone();
        let group = self.vars[v.index()].group.clone();
        let registered = self.lookup(&name) == Some(EntityRef::Variable(v));
        if !registered && group.is_none() {
            return Err(ModelForgeError::NotFound(name));
        }
        if registered {
            self.registry_mut().remove(&name);
        }
        if let Some((g, key)) = group {
            let gdata = &mut self.var_groups[g.index()];
            gdata.members.remove(&key);
            gdata.shadows.remove(&key);
            gdata.member_order.retain(|k| *k != key);
            gdata.shadow_order.retain(|k| *k != key);
        }
        for model in &mut self.models {
            model.members.retain(|m| *m != EntityRef::Variable(v));
        }
        Ok(())
    }
}

fn single(v: IndexValue) -> Key {
    let mut key = Key::new();
    key.push(v);
    key
}

fn query_matches(query: &[QueryIndex], key: &Key) -> bool {
    if query.len() != key.len() {
        return false;
    }
    query.iter().zip(key.iter()).all(|(q, v)| match q {
        QueryIndex::Wild => true,
        QueryIndex::One(want) => want == v,
        QueryIndex::Many(wants) => wants.contains(v),
    })
}

/// Parses the bracket body of a display name, e.g. `1,'east'`.
fn parse_key(body: &str) -> Option<Key> {
    let mut key = Key::new();
    if body.is_empty() {
        return None;
    }
    let mut rest = body;
    while !rest.is_empty() {
        rest = rest.trim_start();
        let (token, tail) = if let Some(stripped) = rest.strip_prefix('\'') {
            let end = stripped.find('\'')?;
            let tail = stripped[end + 1..].trim_start();
            (
                IndexValue::Str(stripped[..end].to_owned()),
                tail.strip_prefix(',').unwrap_or(tail),
            )
        } else {
            let end = rest.find(',').unwrap_or(rest.len());
            let raw = rest[..end].trim();
            let value = match raw.parse::<i64>() {
                Ok(n) => IndexValue::Num(n),
                Err(_) => IndexValue::Str(raw.to_owned()),
            };
            (value, rest.get(end + 1..).unwrap_or(""))
        };
        key.push(token);
        rest = tail;
    }
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::set::SetSpec;
    use crate::key;

    #[test]
    fn test_binary_defaults_to_unit_bounds() {
        let mut sess = Session::new();
        let v = sess.add_variable(VarSpec::new().binary());
        assert_eq!(sess.var(v).lb, Bound::Value(0.0));
        assert_eq!(sess.var(v).ub, Bound::Value(1.0));
    }

    #[test]
    fn test_continuous_defaults_free() {
        let mut sess = Session::new();
        let v = sess.add_variable(VarSpec::new());
        assert_eq!(sess.var(v).lb, Bound::Value(f64::NEG_INFINITY));
        assert_eq!(sess.var(v).ub, Bound::Value(f64::INFINITY));
    }

    #[test]
    fn test_concrete_group_materializes_all_members() {
        let mut sess = Session::new();
        let g = sess.add_variables(
            &[Domain::values([1, 2]), Domain::values(["a", "b", "c"])],
            VarSpec::new().named("x"),
        );
        assert_eq!(sess.var_group(g).member_order.len(), 6);
        let v = sess.member(g, &key![2, "c"]).unwrap();
        assert_eq!(sess.var(v).name, "x_2_c");
        assert_eq!(sess.var(v).display, "x[2,'c']");
    }

    #[test]
    fn test_missing_concrete_member_is_not_found() {
        let mut sess = Session::new();
        let g = sess.add_variables(&[Domain::values([1, 2])], VarSpec::new().named("x"));
        assert!(matches!(
            sess.member(g, &key![9]),
            Err(ModelForgeError::NotFound(_))
        ));
    }

    #[test]
    fn test_abstract_group_materializes_lazily() {
        let mut sess = Session::new();
        let s = sess.add_set(SetSpec::new().named("S"));
        let g = sess.add_variables(&[Domain::Set(s)], VarSpec::new().named("x"));
        assert!(sess.var_group(g).member_order.is_empty());
        let v = sess.member(g, &key![4]).unwrap();
        assert_eq!(sess.var(v).name, "x_4");
        assert_eq!(sess.var_group(g).member_order.len(), 1);
    }

    #[test]
    fn test_shadow_member_is_identity_stable() {
        let mut sess = Session::new();
        let s = sess.add_set(SetSpec::new().named("S"));
        let g = sess.add_variables(&[Domain::Set(s)], VarSpec::new().named("x"));
        let i = sess.iterator(s);
        let a = sess.member(g, &key![i]).unwrap();
        let b = sess.member(g, &key![i]).unwrap();
        assert_eq!(a, b);
        assert!(sess.var(a).shadow);
        assert_eq!(sess.var(a).display, "x[o1]");
    }

    #[test]
    fn test_select_wildcard_and_fixed() {
        let mut sess = Session::new();
        let g = sess.add_variables(
            &[Domain::values([1, 2]), Domain::values(["a", "b"])],
            VarSpec::new().named("x"),
        );
        let all = sess.select(g, &[QueryIndex::Wild, QueryIndex::Wild]);
        assert_eq!(all.len(), 4);
        let row = sess.select(g, &[QueryIndex::from(2), QueryIndex::Wild]);
        assert_eq!(row.len(), 2);
        assert_eq!(sess.var(row[0]).display, "x[2,'a']");
        // A miss on a concrete group warns and comes back empty.
        assert!(sess.select(g, &[QueryIndex::from(9), QueryIndex::Wild]).is_empty());
    }

    #[test]
    fn test_sum_of_concrete_counts_members() {
        let mut sess = Session::new();
        let g = sess.add_variables(&[Domain::Range(0, 5)], VarSpec::new().named("x"));
        let total = sess.sum_of(g, &[QueryIndex::Wild]);
        assert_eq!(total.terms().count(), 5);
    }

    #[test]
    fn test_sum_of_abstract_is_symbolic() {
        let mut sess = Session::new();
        let s = sess.add_set(SetSpec::new().named("S"));
        let g = sess.add_variables(&[Domain::Set(s)], VarSpec::new().named("x"));
        let total = sess.sum_of(g, &[QueryIndex::Wild]);
        assert!(total.sums().len() == 1);
        assert_eq!(total.sums()[0].body.terms().count(), 1);
    }

    #[test]
    fn test_sum_of_pads_omitted_dimensions() {
        let mut sess = Session::new();
        let g = sess.add_variables(
            &[Domain::values([1, 2]), Domain::values(["a", "b", "c"])],
            VarSpec::new().named("x"),
        );
        let total = sess.sum_of(g, &[QueryIndex::from(2)]);
        assert_eq!(total.terms().count(), 3);
    }

    #[test]
    fn test_drop_group_member() {
        let mut sess = Session::new();
        let g = sess.add_variables(&[Domain::values([1, 2, 3])], VarSpec::new().named("x"));
        let v = sess.member(g, &key![2]).unwrap();
        sess.drop_variable(v).unwrap();
        assert_eq!(sess.var_group(g).member_order.len(), 2);
        assert!(sess.variable_by_name("x[2]").is_none());
        assert!(sess.variable_by_name("x[1]").is_some());
    }

    #[test]
    fn test_drop_scalar_removes_name() {
        let mut sess = Session::new();
        let v = sess.add_variable(VarSpec::new().named("x"));
        sess.drop_variable(v).unwrap();
        assert!(sess.lookup("x").is_none());
        assert!(matches!(
            sess.drop_variable(v),
            Err(ModelForgeError::NotFound(_))
        ));
    }

    #[test]
    fn test_variable_by_name_parses_bracket_form() {
        let mut sess = Session::new();
        let g = sess.add_variables(
            &[Domain::values([1]), Domain::values(["east"])],
            VarSpec::new().named("ship"),
        );
        let v = sess.variable_by_name("ship[1,'east']").unwrap();
        assert_eq!(sess.var(v).group.as_ref().unwrap().0, g);
        assert!(sess.variable_by_name("ship[9,'nowhere']").is_none());
    }

    #[test]
    fn test_parse_key_tokens() {
        assert_eq!(parse_key("1,'a b',x"), Some(key![1, "a b", "x"]));
        assert_eq!(parse_key(""), None);
    }
}
