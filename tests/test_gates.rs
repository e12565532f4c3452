mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::Array2;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::{assert_matrix_close, assert_state_close, c, hadamard, pauli_x, pauli_z, sign_flip};
use qgates::{apply, compose, Gate, GateConfig, GateError, Representation, State};

fn random_matrix(rng: &mut StdRng, qubit_count: usize) -> Array2<Complex64> {
    let n = 1 << qubit_count;
    Array2::from_shape_fn((n, n), |_| {
        Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    })
}

fn random_state(rng: &mut StdRng, qubit_count: usize) -> State {
    let n = 1 << qubit_count;
    let amps = (0..n)
        .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    State::from_amplitudes(amps).unwrap()
}

/// Functional wrapper around a matrix gate, so both variants can be mixed.
fn lazy(gate: &Gate) -> Gate {
    let inner = gate.clone();
    Gate::functional(gate.qubit_count(), move |k: usize| inner.eval_bs(k)).unwrap()
}

#[test]
fn test_eval_bs_out_of_range() {
    for gate in [hadamard(), lazy(&hadamard())] {
        assert_eq!(
            gate.eval_bs(2).unwrap_err(),
            GateError::InvalidIndex { index: 2, basis_size: 2 }
        );
    }
}

#[test]
fn test_apply_dimension_mismatch() {
    for gate in [hadamard(), lazy(&hadamard())] {
        assert_eq!(
            gate.apply(&State::zero_state(2).unwrap()).unwrap_err(),
            GateError::DimensionMismatch { expected: 2, actual: 4 }
        );
    }
}

#[test]
fn test_compose_dimension_mismatch() {
    let one = hadamard();
    let two = Gate::matrix(2, Array2::eye(4)).unwrap();
    assert_eq!(
        compose(&one, &two).unwrap_err(),
        GateError::DimensionMismatch { expected: 1, actual: 2 }
    );
    assert!(one.difference(&two, &GateConfig::default()).is_err());
}

#[test]
fn test_compose_applies_right_operand_first() {
    // X then Z: |0> -> |1> -> -|1>;  Z then X: |0> -> |0> -> |1>
    let x = pauli_x();
    let z = pauli_z();
    let minus_one = State::from_basis_state(2, 1).unwrap().scaled(c(-1.0));
    let pairs = [
        (z.clone(), x.clone()),
        (lazy(&z), x.clone()),
        (z.clone(), lazy(&x)),
        (lazy(&z), lazy(&x)),
    ];
    for (outer, inner) in pairs {
        let zx = compose(&outer, &inner).unwrap();
        assert_state_close(&zx.eval_bs(0).unwrap(), &minus_one, 1e-12);
    }
    let xz = compose(&x, &z).unwrap();
    assert_state_close(&xz.eval_bs(0).unwrap(), &State::from_basis_state(2, 1).unwrap(), 1e-12);
}

#[test]
fn test_compose_representation_rules() {
    let h = hadamard();
    assert_eq!(compose(&h, &h).unwrap().representation(), Representation::Matrix);
    assert_eq!(compose(&lazy(&h), &h).unwrap().representation(), Representation::Functional);
    assert_eq!(compose(&h, &lazy(&h)).unwrap().representation(), Representation::Functional);
    assert_eq!(
        compose(&lazy(&h), &lazy(&h)).unwrap().representation(),
        Representation::Functional
    );
}

#[test]
fn test_matrix_compose_is_matrix_product() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = random_matrix(&mut rng, 2);
    let b = random_matrix(&mut rng, 2);
    let ga = Gate::matrix(2, a.clone()).unwrap();
    let gb = Gate::matrix(2, b.clone()).unwrap();
    let ab = compose(&ga, &gb).unwrap();
    assert_matrix_close(ab.as_matrix().unwrap().matrix(), &a.dot(&b), 1e-12);
}

#[test]
fn test_composition_equals_functional_chaining() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..5 {
        let g1 = Gate::matrix(3, random_matrix(&mut rng, 3)).unwrap();
        let g2 = Gate::matrix(3, random_matrix(&mut rng, 3)).unwrap();
        for (a, b) in [(g1.clone(), g2.clone()), (lazy(&g1), g2.clone()), (g1.clone(), lazy(&g2))] {
            let product = compose(&a, &b).unwrap();
            for k in 0..8 {
                let expected = a.apply(&b.eval_bs(k).unwrap()).unwrap();
                assert_state_close(&product.eval_bs(k).unwrap(), &expected, 1e-10);
            }
        }
    }
}

#[test]
fn test_apply_is_linear_extension() {
    let mut rng = StdRng::seed_from_u64(99);
    let m = Gate::matrix(2, random_matrix(&mut rng, 2)).unwrap();
    let f = lazy(&m);
    let state = random_state(&mut rng, 2);
    let by_matrix = m.apply(&state).unwrap();
    let by_function = f.apply(&state).unwrap();
    assert_state_close(&by_matrix, &by_function, 1e-12);

    let mut sum = State::from_amplitudes(ndarray::Array1::zeros(4)).unwrap();
    for k in 0..4 {
        sum = &sum + &m.eval_bs(k).unwrap().scaled(state[k]);
    }
    assert_state_close(&by_matrix, &sum, 1e-12);
}

#[test]
fn test_from_eval_bs_variants_agree() {
    let flip = |k: usize| -> qgates::Result<State> {
        // reverse the 3 bits and attach a phase depending on parity
        let r = ((k & 1) << 2) | (k & 2) | ((k >> 2) & 1);
        let phase = if k.count_ones() % 2 == 0 { c(1.0) } else { Complex64::new(0.0, 1.0) };
        Ok(State::from_basis_state(8, r)?.scaled(phase))
    };
    let functional = Gate::from_eval_bs(3, flip, &GateConfig::functional()).unwrap();
    let matrix = Gate::from_eval_bs(3, flip, &GateConfig::matrix()).unwrap();
    let eager_parallel = GateConfig::matrix().with_parallel_threshold(0);
    let parallel = Gate::from_eval_bs(3, flip, &eager_parallel).unwrap();
    assert_eq!(functional.representation(), Representation::Functional);
    assert_eq!(matrix.representation(), Representation::Matrix);
    for k in 0..8 {
        assert_eq!(functional.eval_bs(k).unwrap(), matrix.eval_bs(k).unwrap());
    }
    assert_eq!(matrix.as_matrix(), parallel.as_matrix());
}

#[test]
fn test_materialize_functional_gate() {
    let oracle = sign_flip(2, |k| k == 3);
    let config = GateConfig::default();
    let m = oracle.materialize(&config).unwrap();
    let mut expected = Array2::eye(4);
    expected[[3, 3]] = c(-1.0);
    assert_matrix_close(m.matrix(), &expected, 1e-12);
    let diff = oracle.difference(&Gate::Matrix(m), &config).unwrap();
    assert!(diff.iter().all(|z| z.norm() < 1e-12));
}

/// Functional gate counting how many of its evaluations ran on a rayon
/// worker thread.
fn counting_identity(qubit_count: usize, on_pool: Arc<AtomicUsize>) -> Gate {
    let basis_size = 1 << qubit_count;
    Gate::functional(qubit_count, move |k: usize| {
        if rayon::current_thread_index().is_some() {
            on_pool.fetch_add(1, Ordering::SeqCst);
        }
        State::from_basis_state(basis_size, k)
    })
    .unwrap()
}

#[test]
fn test_materialize_honours_parallel_threshold() {
    let on_pool = Arc::new(AtomicUsize::new(0));
    let gate = counting_identity(3, on_pool.clone());

    let serial = gate.to_matrix(&GateConfig::default().with_parallel_threshold(usize::MAX));
    assert_eq!(on_pool.load(Ordering::SeqCst), 0);

    let parallel = gate.to_matrix(&GateConfig::default().with_parallel_threshold(0));
    assert_eq!(on_pool.load(Ordering::SeqCst), 8);
    assert_eq!(serial.unwrap(), parallel.unwrap());

    let eager = gate.materialize(&GateConfig::default().with_parallel_threshold(0)).unwrap();
    assert_eq!(on_pool.load(Ordering::SeqCst), 16);
    assert_eq!(eager.into_matrix(), Array2::<Complex64>::eye(8));
}

#[test]
fn test_free_apply_matches_method() {
    let mut rng = StdRng::seed_from_u64(5);
    let m = Gate::matrix(2, random_matrix(&mut rng, 2)).unwrap();
    let state = random_state(&mut rng, 2);
    for gate in [m.clone(), lazy(&m)] {
        assert_state_close(&apply(&gate, &state).unwrap(), &gate.apply(&state).unwrap(), 1e-12);
    }
    assert!(apply(&m, &State::zero_state(1).unwrap()).is_err());
}

#[test]
fn test_matrix_gate_column_view_aliases_storage() {
    let h = hadamard();
    let m = h.as_matrix().unwrap();
    let view = m.column(1).unwrap();
    assert_eq!(view.as_ptr(), m.matrix().column(1).as_ptr());
    assert_eq!(view.to_owned(), m.eval_bs(1).unwrap().into_amplitudes());
}
