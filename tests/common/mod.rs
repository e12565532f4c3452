//! Shared test utilities for qgates integration tests.

use std::f64::consts::FRAC_1_SQRT_2;

use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use num_complex::Complex64;

use qgates::{Gate, State};

pub fn c(re: f64) -> Complex64 {
    Complex64::new(re, 0.0)
}

#[allow(dead_code)]
pub fn hadamard_matrix() -> Array2<Complex64> {
    let s = c(FRAC_1_SQRT_2);
    array![[s, s], [s, -s]]
}

#[allow(dead_code)]
pub fn hadamard() -> Gate {
    Gate::matrix(1, hadamard_matrix()).unwrap()
}

#[allow(dead_code)]
pub fn pauli_x() -> Gate {
    Gate::matrix(1, array![[c(0.0), c(1.0)], [c(1.0), c(0.0)]]).unwrap()
}

#[allow(dead_code)]
pub fn pauli_z() -> Gate {
    Gate::matrix(1, array![[c(1.0), c(0.0)], [c(0.0), c(-1.0)]]).unwrap()
}

/// Functional gate flipping the sign of every basis state for which
/// `negate` holds.
#[allow(dead_code)]
pub fn sign_flip<F>(qubit_count: usize, negate: F) -> Gate
where
    F: Fn(usize) -> bool + Send + Sync + 'static,
{
    let basis_size = 1 << qubit_count;
    Gate::functional(qubit_count, move |k: usize| -> qgates::Result<State> {
        let state = State::from_basis_state(basis_size, k)?;
        Ok(if negate(k) { state.scaled(c(-1.0)) } else { state })
    })
    .unwrap()
}

/// n-fold Kronecker power of a square matrix.
#[allow(dead_code)]
pub fn kron_power(m: &Array2<Complex64>, n: usize) -> Array2<Complex64> {
    let mut result = array![[c(1.0)]];
    for _ in 0..n {
        result = ndarray::linalg::kron(&result, m);
    }
    result
}

#[allow(dead_code)]
pub fn assert_matrix_close(a: &Array2<Complex64>, b: &Array2<Complex64>, tol: f64) {
    assert_eq!(a.dim(), b.dim(), "matrix shapes differ");
    for ((i, j), x) in a.indexed_iter() {
        let y = b[[i, j]];
        assert!(
            (x - y).norm() < tol,
            "entry ({}, {}) differs: {} vs {}",
            i,
            j,
            x,
            y
        );
    }
}

#[allow(dead_code)]
pub fn assert_state_close(a: &State, b: &State, tol: f64) {
    assert_eq!(a.basis_size(), b.basis_size(), "state sizes differ");
    for (x, y) in a.amplitudes().iter().zip(b.amplitudes().iter()) {
        assert_abs_diff_eq!(x.re, y.re, epsilon = tol);
        assert_abs_diff_eq!(x.im, y.im, epsilon = tol);
    }
}

/// Route `tracing` output through the test harness.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
