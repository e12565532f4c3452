//! Eager construction of dense operator matrices from basis-state evaluators.

use ndarray::Array2;
use num_complex::Complex64;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{GateError, Result};
use crate::gate::BasisEvaluator;
use crate::state::{basis_size_for, State};

/// Qubit count above which materialization logs a resource warning.
///
/// A dense gate on n qubits stores 4^n complex entries (16 bytes each), and
/// multiplying two of them costs O(8^n).
pub const MATERIALIZE_WARN_QUBITS: usize = 12;

fn evaluate_column(evaluator: &dyn BasisEvaluator, k: usize, basis_size: usize) -> Result<State> {
    let column = evaluator.eval(k)?;
    if column.basis_size() != basis_size {
        return Err(GateError::DimensionMismatch {
            expected: basis_size,
            actual: column.basis_size(),
        });
    }
    Ok(column)
}

/// Evaluate `evaluator` at every basis state and stack the images as columns.
///
/// Columns are independent, so when `basis_size >= parallel_threshold` they
/// are computed on the rayon pool. The result does not depend on the path
/// taken.
///
/// # Errors
/// `RegisterTooLarge` if `2^qubit_count` does not fit in a `usize`, the
/// first error returned by the evaluator, or `DimensionMismatch` if an
/// image does not have `2^qubit_count` amplitudes.
///
/// # Example
/// ```
/// use qgates::materialize::materialize_columns;
/// use qgates::State;
/// let not = |k: usize| State::from_basis_state(2, 1 - k);
/// let m = materialize_columns(1, &not, usize::MAX).unwrap();
/// assert_eq!(m[[1, 0]].re, 1.0);
/// assert_eq!(m[[0, 1]].re, 1.0);
/// assert_eq!(m[[0, 0]].re, 0.0);
/// ```
#[tracing::instrument(level = "debug", skip(evaluator))]
pub fn materialize_columns(
    qubit_count: usize,
    evaluator: &dyn BasisEvaluator,
    parallel_threshold: usize,
) -> Result<Array2<Complex64>> {
    let basis_size = basis_size_for(qubit_count)?;
    if qubit_count > MATERIALIZE_WARN_QUBITS {
        warn!(
            qubit_count,
            bytes = basis_size
                .saturating_mul(basis_size)
                .saturating_mul(std::mem::size_of::<Complex64>()),
            "materializing a large dense gate"
        );
    }

    let parallel = basis_size >= parallel_threshold;
    debug!(basis_size, parallel, "materializing gate columns");

    let columns: Vec<State> = if parallel {
        (0..basis_size)
            .into_par_iter()
            .map(|k| evaluate_column(evaluator, k, basis_size))
            .collect::<Result<_>>()?
    } else {
        (0..basis_size)
            .map(|k| evaluate_column(evaluator, k, basis_size))
            .collect::<Result<_>>()?
    };

    let mut matrix = Array2::zeros((basis_size, basis_size));
    for (k, column) in columns.iter().enumerate() {
        matrix.column_mut(k).assign(column.amplitudes());
    }
    Ok(matrix)
}
