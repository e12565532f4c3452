use std::ops::{Add, Index};

use ndarray::Array1;
use num_complex::Complex64;

use crate::error::{GateError, Result};

/// Amplitude vector of a qubit register.
///
/// Index `k` holds the amplitude of the basis state in which qubit `i` has
/// the value of bit `i` of `k`. The length is always a non-zero power of two;
/// normalization is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    amplitudes: Array1<Complex64>,
}

/// Largest register whose basis states can be indexed by a `usize`.
pub const MAX_QUBITS: usize = usize::BITS as usize - 1;

/// `2^qubit_count`, or `RegisterTooLarge` past [`MAX_QUBITS`].
pub(crate) fn basis_size_for(qubit_count: usize) -> Result<usize> {
    if qubit_count > MAX_QUBITS {
        return Err(GateError::RegisterTooLarge {
            qubit_count,
            max: MAX_QUBITS,
        });
    }
    Ok(1 << qubit_count)
}

pub(crate) fn check_basis_size(basis_size: usize) -> Result<()> {
    if basis_size.is_power_of_two() {
        Ok(())
    } else {
        Err(GateError::InvalidDimension {
            dimension: basis_size,
        })
    }
}

impl State {
    /// Wrap a raw amplitude vector.
    ///
    /// # Errors
    /// `InvalidDimension` if the length is not a non-zero power of two.
    pub fn from_amplitudes(amplitudes: Array1<Complex64>) -> Result<Self> {
        check_basis_size(amplitudes.len())?;
        Ok(State { amplitudes })
    }

    /// Creates the basis state |k> in a space of `basis_size` states.
    ///
    /// # Example
    /// ```
    /// use num_complex::Complex64;
    /// use qgates::State;
    /// let state = State::from_basis_state(4, 2).unwrap();
    /// assert_eq!(state[2], Complex64::new(1.0, 0.0));
    /// assert_eq!(state[0], Complex64::new(0.0, 0.0));
    /// ```
    pub fn from_basis_state(basis_size: usize, basis_state: usize) -> Result<Self> {
        check_basis_size(basis_size)?;
        if basis_state >= basis_size {
            return Err(GateError::InvalidIndex {
                index: basis_state,
                basis_size,
            });
        }
        let mut amplitudes = Array1::zeros(basis_size);
        amplitudes[basis_state] = Complex64::new(1.0, 0.0);
        Ok(State { amplitudes })
    }

    /// Creates |0...0> on `qubit_count` qubits.
    ///
    /// # Errors
    /// `RegisterTooLarge` if `qubit_count` exceeds [`MAX_QUBITS`].
    pub fn zero_state(qubit_count: usize) -> Result<Self> {
        State::from_basis_state(basis_size_for(qubit_count)?, 0)
    }

    pub(crate) fn from_array_unchecked(amplitudes: Array1<Complex64>) -> Self {
        debug_assert!(amplitudes.len().is_power_of_two());
        State { amplitudes }
    }

    pub fn amplitudes(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    pub fn into_amplitudes(self) -> Array1<Complex64> {
        self.amplitudes
    }

    /// Number of basis states (length of the amplitude vector).
    pub fn basis_size(&self) -> usize {
        self.amplitudes.len()
    }

    pub fn qubit_count(&self) -> usize {
        self.amplitudes.len().trailing_zeros() as usize
    }

    pub fn get(&self, basis_state: usize) -> Option<Complex64> {
        self.amplitudes.get(basis_state).copied()
    }

    /// L2 norm of the state vector
    pub fn norm(&self) -> f64 {
        self.amplitudes.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt()
    }

    /// Probability of measuring each basis state, assuming a normalized state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(|c| c.norm_sqr()).collect()
    }

    /// Multiply every amplitude by `factor`.
    pub fn scaled(&self, factor: Complex64) -> State {
        State {
            amplitudes: &self.amplitudes * factor,
        }
    }

    /// Checked superposition `self + other`.
    ///
    /// # Errors
    /// `DimensionMismatch` if the two states have different lengths.
    pub fn superpose(&self, other: &State) -> Result<State> {
        if self.basis_size() != other.basis_size() {
            return Err(GateError::DimensionMismatch {
                expected: self.basis_size(),
                actual: other.basis_size(),
            });
        }
        Ok(State {
            amplitudes: &self.amplitudes + &other.amplitudes,
        })
    }
}

impl Index<usize> for State {
    type Output = Complex64;

    fn index(&self, basis_state: usize) -> &Complex64 {
        &self.amplitudes[basis_state]
    }
}

/// Unchecked superposition.
///
/// # Panics
/// Panics if the states have different lengths; use [`State::superpose`]
/// for a checked version.
impl Add<&State> for &State {
    type Output = State;

    fn add(self, rhs: &State) -> State {
        assert_eq!(
            self.basis_size(),
            rhs.basis_size(),
            "cannot add states of different basis size"
        );
        State {
            amplitudes: &self.amplitudes + &rhs.amplitudes,
        }
    }
}

impl Add for State {
    type Output = State;

    fn add(self, rhs: State) -> State {
        &self + &rhs
    }
}
