//! The entity model: sets, parameters, variables, constraints, implicit
//! variables, and objectives, each stored in a session arena and addressed
//! by a `Copy` handle.

pub mod constraint;
pub mod impvar;
pub mod objective;
pub mod parameter;
pub mod set;
pub mod variable;

use crate::session::Session;
use crate::types::{IndexValue, Key};

impl Session {
    /// Solver-safe flat form of a key, for member names (`x_1_east`).
    pub fn key_flat(&self, key: &Key) -> String {
        key.iter()
            .map(|v| match v {
                IndexValue::Num(n) => n.to_string(),
                IndexValue::Str(s) => s.replace([' ', '\''], "_"),
                IndexValue::Iter(i) => self.iter(*i).name.clone(),
            })
            .collect::<Vec<_>>()
            .join("_")
    }

    /// Bracket-form key body, for display names (`x[1,'east']`).
    pub fn key_display(&self, key: &Key) -> String {
        key.iter()
            .map(|v| match v {
                IndexValue::Num(n) => n.to_string(),
                IndexValue::Str(s) => format!("'{}'", s),
                IndexValue::Iter(i) => self.iter(*i).name.clone(),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}
