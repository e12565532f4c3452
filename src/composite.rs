//! Full-register gates assembled from gates on a few qubits.
//!
//! Both builders validate their qubit lists when called and return a gate
//! whose evaluator is one of the structs below. The sub-gate is shared
//! read-only by the evaluator.

use std::collections::HashSet;

use num_complex::Complex64;
use tracing::debug;

use crate::config::GateConfig;
use crate::error::{GateError, Result};
use crate::gate::{BasisEvaluator, Gate};
use crate::index::{extract_sub_basis, insert_sub_superposition, qubit_mask, validate_qubits};
use crate::state::{basis_size_for, State};

/// Evaluator of [`multi_gate`]: `gate` on each group of `apply_qubits`.
#[derive(Debug, Clone)]
pub struct MultiGateEvaluator {
    basis_size: usize,
    gate: Gate,
    apply_qubits: Vec<usize>,
}

impl MultiGateEvaluator {
    fn group_width(&self) -> usize {
        self.gate.qubit_count()
    }
}

impl BasisEvaluator for MultiGateEvaluator {
    fn eval(&self, basis_state: usize) -> Result<State> {
        let width = self.group_width();
        let outputs: Vec<State> = self
            .apply_qubits
            .chunks(width)
            .map(|group| self.gate.eval_bs(extract_sub_basis(basis_state, group)?))
            .collect::<Result<_>>()?;

        // Kronecker product in basis form: group i owns local bits
        // [i * width, (i + 1) * width).
        let group_mask = (1usize << width) - 1;
        let combined: Vec<Complex64> = (0..1usize << self.apply_qubits.len())
            .map(|k| {
                outputs
                    .iter()
                    .enumerate()
                    .map(|(i, out)| out[(k >> (i * width)) & group_mask])
                    .product()
            })
            .collect();

        insert_sub_superposition(self.basis_size, basis_state, &combined, &self.apply_qubits)
    }
}

/// Apply the same gate independently to consecutive groups of qubits.
///
/// `apply_qubits` is split into groups of `gate.qubit_count()` positions
/// (single qubits for a one-qubit gate) and `gate` acts on every group. The
/// result is the Kronecker product of the per-group actions, with the
/// significance order of `apply_qubits`. Every listed qubit takes part;
/// unlisted qubits are left unchanged.
///
/// # Errors
/// `RegisterTooLarge` if `qubit_count` exceeds `MAX_QUBITS`;
/// `InvalidGateSpecification` if a position is repeated or out of range,
/// if `gate` acts on zero qubits, or if the number of positions is not a
/// multiple of `gate.qubit_count()`.
///
/// # Example
/// ```
/// use ndarray::array;
/// use num_complex::Complex64;
/// use qgates::{multi_gate, Gate, GateConfig, State};
/// let zero = Complex64::new(0.0, 0.0);
/// let one = Complex64::new(1.0, 0.0);
/// let x = Gate::matrix(1, array![[zero, one], [one, zero]]).unwrap();
/// let xx = multi_gate(3, &x, &[0, 2], &GateConfig::default()).unwrap();
/// assert_eq!(xx.eval_bs(0b000).unwrap(), State::from_basis_state(8, 0b101).unwrap());
/// ```
pub fn multi_gate(
    qubit_count: usize,
    gate: &Gate,
    apply_qubits: &[usize],
    config: &GateConfig,
) -> Result<Gate> {
    let basis_size = basis_size_for(qubit_count)?;
    validate_qubits(apply_qubits, qubit_count, "apply")?;
    let width = gate.qubit_count();
    if width == 0 {
        return Err(GateError::spec("multi_gate needs a gate acting on at least one qubit"));
    }
    if apply_qubits.len() % width != 0 {
        return Err(GateError::spec(format!(
            "{} apply qubits cannot be split into groups of {}",
            apply_qubits.len(),
            width
        )));
    }

    debug!(qubit_count, ?apply_qubits, width, "building multi gate");
    let evaluator = MultiGateEvaluator {
        basis_size,
        gate: gate.clone(),
        apply_qubits: apply_qubits.to_vec(),
    };
    Gate::from_eval_bs(qubit_count, evaluator, config)
}

/// Evaluator of [`controlled_u`].
#[derive(Debug, Clone)]
pub struct ControlledEvaluator {
    basis_size: usize,
    u: Gate,
    apply_qubits: Vec<usize>,
    control_mask: usize,
}

impl BasisEvaluator for ControlledEvaluator {
    fn eval(&self, basis_state: usize) -> Result<State> {
        if basis_state & self.control_mask != self.control_mask {
            // identity; `u` is not evaluated
            return State::from_basis_state(self.basis_size, basis_state);
        }
        let local = extract_sub_basis(basis_state, &self.apply_qubits)?;
        let image = self.u.eval_bs(local)?;
        let amplitudes = image.amplitudes().to_vec();
        insert_sub_superposition(self.basis_size, basis_state, &amplitudes, &self.apply_qubits)
    }
}

/// Gate applying `u` to `apply_qubits` when every control qubit is 1.
///
/// `u` is written in the computational basis of `apply_qubits` in list
/// order: `apply_qubits[0]` is its least significant bit. Basis states with
/// any control qubit at 0 are left unchanged. An empty control list applies
/// `u` unconditionally.
///
/// # Arguments
/// * `qubit_count` - Register size of the resulting gate
/// * `u` - Gate on `apply_qubits.len()` qubits
/// * `apply_qubits` - Target positions
/// * `control_qubits` - Control positions
/// * `config` - Representation of the resulting gate
///
/// # Errors
/// `RegisterTooLarge` if `qubit_count` exceeds `MAX_QUBITS`;
/// `InvalidGateSpecification` for repeated, out-of-range or overlapping
/// positions; `DimensionMismatch` if `u` does not act on
/// `apply_qubits.len()` qubits. Both are reported here, never during
/// evaluation.
///
/// # Example
/// ```
/// use ndarray::array;
/// use num_complex::Complex64;
/// use qgates::{controlled_u, Gate, GateConfig, State};
/// let zero = Complex64::new(0.0, 0.0);
/// let one = Complex64::new(1.0, 0.0);
/// let x = Gate::matrix(1, array![[zero, one], [one, zero]]).unwrap();
/// let cnot = controlled_u(2, &x, &[1], &[0], &GateConfig::matrix()).unwrap();
/// assert_eq!(cnot.eval_bs(0b01).unwrap(), State::from_basis_state(4, 0b11).unwrap());
/// assert_eq!(cnot.eval_bs(0b10).unwrap(), State::from_basis_state(4, 0b10).unwrap());
/// ```
pub fn controlled_u(
    qubit_count: usize,
    u: &Gate,
    apply_qubits: &[usize],
    control_qubits: &[usize],
    config: &GateConfig,
) -> Result<Gate> {
    let basis_size = basis_size_for(qubit_count)?;
    validate_qubits(control_qubits, qubit_count, "control")?;
    validate_qubits(apply_qubits, qubit_count, "apply")?;

    let apply_set: HashSet<usize> = apply_qubits.iter().copied().collect();
    let mut overlapping: Vec<usize> = control_qubits
        .iter()
        .copied()
        .filter(|q| apply_set.contains(q))
        .collect();
    if !overlapping.is_empty() {
        overlapping.sort_unstable();
        return Err(GateError::spec(format!(
            "apply and control qubits overlap at {:?}",
            overlapping
        )));
    }

    if u.qubit_count() != apply_qubits.len() {
        return Err(GateError::DimensionMismatch {
            expected: apply_qubits.len(),
            actual: u.qubit_count(),
        });
    }

    debug!(qubit_count, ?apply_qubits, ?control_qubits, "building controlled gate");
    let evaluator = ControlledEvaluator {
        basis_size,
        u: u.clone(),
        apply_qubits: apply_qubits.to_vec(),
        control_mask: qubit_mask(control_qubits)?,
    };
    Gate::from_eval_bs(qubit_count, evaluator, config)
}

/// Embed `u` on `apply_qubits` of a larger register, unconditionally.
pub fn embed(
    qubit_count: usize,
    u: &Gate,
    apply_qubits: &[usize],
    config: &GateConfig,
) -> Result<Gate> {
    controlled_u(qubit_count, u, apply_qubits, &[], config)
}
