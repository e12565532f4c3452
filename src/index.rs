//! Bit-index algebra between the full register and a sub-register.
//!
//! A sub-register is an ordered list of qubit positions. Its local basis
//! index follows the *list order*: bit `i` of the local index is the value of
//! qubit `qubits[i]`. With `qubits = [3, 1]`, qubit 3 is the least
//! significant local bit and qubit 1 the next one.

use std::collections::HashSet;

use ndarray::Array1;
use num_complex::Complex64;

use crate::error::{GateError, Result};
use crate::state::{check_basis_size, State};

/// Whether bit `bit` of `value` is 1. Bits past the width of `usize` are 0.
#[inline]
pub fn is_set(bit: usize, value: usize) -> bool {
    u32::try_from(bit)
        .ok()
        .and_then(|b| value.checked_shr(b))
        .map_or(false, |v| v & 1 == 1)
}

fn bit(position: usize) -> Result<usize> {
    u32::try_from(position)
        .ok()
        .and_then(|p| 1usize.checked_shl(p))
        .ok_or_else(|| {
            GateError::spec(format!(
                "bit position {} exceeds the {}-bit basis index",
                position,
                usize::BITS
            ))
        })
}

/// Bitmask with a 1 at every position in `qubits`.
///
/// # Errors
/// `InvalidGateSpecification` if a position does not fit in a `usize`.
pub fn qubit_mask(qubits: &[usize]) -> Result<usize> {
    qubits.iter().try_fold(0, |mask, &q| Ok(mask | bit(q)?))
}

/// Project a global basis state onto the sub-register `qubits`.
///
/// # Errors
/// `InvalidGateSpecification` if a position, or the length of `qubits`,
/// does not fit in a `usize` index.
///
/// # Example
/// ```
/// use qgates::index::extract_sub_basis;
/// // qubit 3 = 1, qubit 1 = 0 -> local bit 0 = 1, local bit 1 = 0
/// assert_eq!(extract_sub_basis(0b1000, &[3, 1]).unwrap(), 0b01);
/// assert_eq!(extract_sub_basis(0b0010, &[3, 1]).unwrap(), 0b10);
/// ```
pub fn extract_sub_basis(basis_state: usize, qubits: &[usize]) -> Result<usize> {
    qubits.iter().enumerate().try_fold(0, |local, (i, &q)| {
        if basis_state & bit(q)? != 0 {
            Ok(local | bit(i)?)
        } else {
            Ok(local)
        }
    })
}

/// Place the bits of a local basis index at their global positions.
///
/// Inverse of [`extract_sub_basis`] on the bits in `qubits`; every other bit
/// of the result is zero.
///
/// # Errors
/// `InvalidGateSpecification` if a position does not fit in a `usize`.
///
/// # Example
/// ```
/// use qgates::index::scatter_sub_basis;
/// assert_eq!(scatter_sub_basis(0b01, &[3, 1]).unwrap(), 0b1000);
/// assert_eq!(scatter_sub_basis(0b11, &[3, 1]).unwrap(), 0b1010);
/// ```
pub fn scatter_sub_basis(local: usize, qubits: &[usize]) -> Result<usize> {
    qubits.iter().enumerate().try_fold(0, |global, (i, &q)| {
        let target = bit(q)?;
        Ok(if is_set(i, local) { global | target } else { global })
    })
}

/// `basis_state` with every bit listed in `qubits` forced to zero.
pub fn clear_bits(basis_state: usize, qubits: &[usize]) -> Result<usize> {
    Ok(basis_state & !qubit_mask(qubits)?)
}

/// Scatter a sub-register superposition back into the full space.
///
/// The untouched qubits keep the values they have in `basis_state`; local
/// index `k` of `local_amplitudes` lands at
/// `clear_bits(basis_state, qubits) | scatter_sub_basis(k, qubits)`.
///
/// # Arguments
/// * `basis_size` - Size of the full space (power of two)
/// * `basis_state` - Global basis state providing the untouched-qubit context
/// * `local_amplitudes` - Superposition over the sub-register, length `2^qubits.len()`
/// * `qubits` - Ordered sub-register positions
///
/// # Errors
/// `InvalidDimension` for a bad `basis_size`, `InvalidIndex` if
/// `basis_state` is outside it, `InvalidGateSpecification` for repeated
/// positions or positions outside the register, and `DimensionMismatch` if
/// `local_amplitudes` does not have `2^qubits.len()` entries.
///
/// # Example
/// ```
/// use num_complex::Complex64;
/// use qgates::index::insert_sub_superposition;
/// let s2 = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
/// // |0>+|1> on qubit 1, with qubit 0 set in the context
/// let state = insert_sub_superposition(8, 0b001, &[s2, s2], &[1]).unwrap();
/// assert_eq!(state[0b001], s2);
/// assert_eq!(state[0b011], s2);
/// ```
pub fn insert_sub_superposition(
    basis_size: usize,
    basis_state: usize,
    local_amplitudes: &[Complex64],
    qubits: &[usize],
) -> Result<State> {
    check_basis_size(basis_size)?;
    if basis_state >= basis_size {
        return Err(GateError::InvalidIndex {
            index: basis_state,
            basis_size,
        });
    }
    // bounds every position below the width of `basis_size`
    validate_qubits(qubits, basis_size.trailing_zeros() as usize, "sub-register")?;

    let local_size = 1usize << qubits.len();
    if local_amplitudes.len() != local_size {
        return Err(GateError::DimensionMismatch {
            expected: local_size,
            actual: local_amplitudes.len(),
        });
    }

    let context = clear_bits(basis_state, qubits)?;
    let mut amplitudes = Array1::zeros(basis_size);
    for (k, &amp) in local_amplitudes.iter().enumerate() {
        amplitudes[context | scatter_sub_basis(k, qubits)?] = amp;
    }
    Ok(State::from_array_unchecked(amplitudes))
}

/// Check that `qubits` are distinct positions inside a `qubit_count` register.
///
/// `role` names the list in the error message ("apply", "control", ...).
pub fn validate_qubits(qubits: &[usize], qubit_count: usize, role: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(qubits.len());
    for &q in qubits {
        if q >= qubit_count {
            return Err(GateError::spec(format!(
                "{} qubit {} is out of range for {} qubits",
                role, q, qubit_count
            )));
        }
        if !seen.insert(q) {
            return Err(GateError::spec(format!(
                "{} qubit {} is listed more than once",
                role, q
            )));
        }
    }
    Ok(())
}
