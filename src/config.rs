use serde::{Deserialize, Serialize};

use crate::error::{GateError, Result};

/// How a gate built from a basis-state evaluator is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    /// Keep the evaluator and call it on demand.
    #[default]
    Functional,
    /// Evaluate every basis state up front and store the dense matrix.
    Matrix,
}

/// Construction options shared by [`Gate::from_eval_bs`](crate::Gate::from_eval_bs)
/// and the composite builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Representation of gates produced by evaluator-based constructors.
    pub representation: Representation,
    /// Basis size from which materialization evaluates columns on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            representation: Representation::Functional,
            parallel_threshold: 256,
        }
    }
}

impl GateConfig {
    /// Config producing functional (lazy) gates.
    pub fn functional() -> Self {
        GateConfig::default()
    }

    /// Config producing matrix (eager) gates.
    pub fn matrix() -> Self {
        GateConfig {
            representation: Representation::Matrix,
            ..GateConfig::default()
        }
    }

    pub fn with_representation(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }

    pub fn with_parallel_threshold(mut self, parallel_threshold: usize) -> Self {
        self.parallel_threshold = parallel_threshold;
        self
    }

    /// Parse a config from JSON. Missing fields take their default values.
    ///
    /// # Example
    /// ```
    /// use qgates::config::{GateConfig, Representation};
    /// let config = GateConfig::from_json(r#"{"representation": "matrix"}"#).unwrap();
    /// assert_eq!(config.representation, Representation::Matrix);
    /// assert_eq!(config.parallel_threshold, 256);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| GateError::Config(e.to_string()))
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| GateError::Config(e.to_string()))
    }
}
