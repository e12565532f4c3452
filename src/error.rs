//! Error types for gate construction and evaluation.

use thiserror::Error;

/// Errors raised while building or evaluating gates and states.
///
/// All variants describe programmer errors: they are reported at the first
/// boundary where an invariant is broken and are never retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GateError {
    /// Duplicate, overlapping or out-of-range qubit positions.
    #[error("invalid gate specification: {reason}")]
    InvalidGateSpecification { reason: String },

    /// Operands (gates or states) live in spaces of different size.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Basis state outside `[0, basis_size)`.
    #[error("basis state {index} is out of range for basis size {basis_size}")]
    InvalidIndex { index: usize, basis_size: usize },

    /// State length or basis size that is not a non-zero power of two.
    #[error("invalid dimension {dimension}, expected a non-zero power of 2")]
    InvalidDimension { dimension: usize },

    /// Register whose basis size does not fit in a `usize` index.
    #[error("{qubit_count} qubits exceed the {max}-qubit register limit")]
    RegisterTooLarge { qubit_count: usize, max: usize },

    /// Gate configuration could not be parsed.
    #[error("invalid gate configuration: {0}")]
    Config(String),
}

impl GateError {
    pub(crate) fn spec(reason: impl Into<String>) -> Self {
        GateError::InvalidGateSpecification {
            reason: reason.into(),
        }
    }
}

/// Result type for gate operations.
pub type Result<T> = std::result::Result<T, GateError>;
