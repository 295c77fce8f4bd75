//! Solver options, loadable from TOML or YAML.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// Options forwarded to the backend alongside the serialized model.
///
/// Every field is optional; an unset field leaves the backend default in
/// place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverOptions {
    /// Wall-clock limit in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<f64>,
    /// Iteration limit for iterative algorithms.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u64>,
    /// Relative optimality gap at which to stop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_gap: Option<f64>,
    /// Backend-specific algorithm selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    /// Random seed for backends that use one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Whether to request dual values in the response.
    pub with_duals: bool,
    /// Whether to also hand the backend the sparse-matrix form of the
    /// model; requires a fully concrete linear model.
    pub upload_matrix: bool,
}

impl SolverOptions {
    /// All-defaults options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wall-clock limit in seconds.
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    /// Sets the iteration limit.
    pub fn with_max_iterations(mut self, iterations: u64) -> Self {
        self.max_iterations = Some(iterations);
        self
    }

    /// Sets the relative optimality gap.
    pub fn with_relative_gap(mut self, gap: f64) -> Self {
        self.relative_gap = Some(gap);
        self
    }

    /// Selects a backend algorithm.
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = Some(algorithm.into());
        self
    }

    /// Sets the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Requests dual values in the response.
    pub fn with_duals(mut self) -> Self {
        self.with_duals = true;
        self
    }

    /// Also submits the sparse-matrix form of the model.
    pub fn with_matrix_upload(mut self) -> Self {
        self.upload_matrix = true;
        self
    }

    /// Parses options from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SolverError::Options(e.to_string()))
    }

    /// Parses options from a YAML document.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        serde_yaml::from_str(s).map_err(|e| SolverError::Options(e.to_string()))
    }
}
