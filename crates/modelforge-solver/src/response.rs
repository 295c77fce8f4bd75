//! Solve responses: status, objective, and solution records.

use serde::{Deserialize, Serialize};

/// Outcome category of a solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// Proven optimal.
    Optimal,
    /// Proven infeasible.
    Infeasible,
    /// Proven unbounded.
    Unbounded,
    /// Stopped at the time limit with a feasible solution.
    TimeLimit,
    /// Stopped at the iteration limit.
    IterationLimit,
    /// The solve failed.
    Failed,
    /// Anything the backend did not classify.
    #[default]
    Unknown,
}

impl SolveStatus {
    /// Maps a backend status string onto a category; unrecognized strings
    /// become [`SolveStatus::Unknown`] and keep their raw text in the
    /// response.
    pub fn parse(text: &str) -> Self {
        match text.to_ascii_lowercase().as_str() {
            "optimal" | "ok" => SolveStatus::Optimal,
            "infeasible" => SolveStatus::Infeasible,
            "unbounded" => SolveStatus::Unbounded,
            "time_limit" | "timelimit" | "timeout" => SolveStatus::TimeLimit,
            "iteration_limit" | "iterationlimit" => SolveStatus::IterationLimit,
            "failed" | "error" => SolveStatus::Failed,
            _ => SolveStatus::Unknown,
        }
    }

    /// Whether the response carries a usable primal solution.
    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::TimeLimit)
    }
}

/// One primal record: a variable (or implicit variable) and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarRecord {
    /// Display name, bracket form for group members.
    pub name: String,
    /// Solution value.
    pub value: f64,
}

/// One dual record: a constraint and its dual value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConRecord {
    /// Constraint name.
    pub name: String,
    /// Dual value.
    pub value: f64,
}

/// A backend's answer to a submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    /// Parsed status category.
    pub status: SolveStatus,
    /// Raw backend status text.
    pub status_text: String,
    /// Objective value, if the backend reported one.
    pub objective: Option<f64>,
    /// Primal solution records.
    pub primal: Vec<VarRecord>,
    /// Dual solution records.
    pub dual: Vec<ConRecord>,
}
