use std::fmt;
use std::sync::Arc;

use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;

use crate::config::{GateConfig, Representation};
use crate::error::{GateError, Result};
use crate::materialize::materialize_columns;
use crate::state::{basis_size_for, State};

/// Image of a single basis state under an operator.
///
/// Implemented for closures `Fn(usize) -> Result<State>` and for the
/// evaluator structs built by the composite constructors. Evaluators are
/// shared read-only between gates and threads.
pub trait BasisEvaluator: Send + Sync {
    fn eval(&self, basis_state: usize) -> Result<State>;
}

impl<F> BasisEvaluator for F
where
    F: Fn(usize) -> Result<State> + Send + Sync,
{
    fn eval(&self, basis_state: usize) -> Result<State> {
        self(basis_state)
    }
}

fn check_basis_state(basis_state: usize, basis_size: usize) -> Result<()> {
    if basis_state < basis_size {
        Ok(())
    } else {
        Err(GateError::InvalidIndex {
            index: basis_state,
            basis_size,
        })
    }
}

fn check_state_len(state: &State, basis_size: usize) -> Result<()> {
    if state.basis_size() == basis_size {
        Ok(())
    } else {
        Err(GateError::DimensionMismatch {
            expected: basis_size,
            actual: state.basis_size(),
        })
    }
}

/// Gate stored as a basis-state evaluator, evaluated lazily on every call.
#[derive(Clone)]
pub struct FunctionalGate {
    qubit_count: usize,
    evaluator: Arc<dyn BasisEvaluator>,
}

impl fmt::Debug for FunctionalGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionalGate")
            .field("qubit_count", &self.qubit_count)
            .finish_non_exhaustive()
    }
}

impl FunctionalGate {
    /// # Errors
    /// `RegisterTooLarge` if `2^qubit_count` does not fit in a `usize`.
    pub fn new<E: BasisEvaluator + 'static>(qubit_count: usize, evaluator: E) -> Result<Self> {
        basis_size_for(qubit_count)?;
        Ok(FunctionalGate {
            qubit_count,
            evaluator: Arc::new(evaluator),
        })
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    pub fn basis_size(&self) -> usize {
        1 << self.qubit_count
    }

    /// Evaluate the wrapped function at `basis_state`.
    ///
    /// # Errors
    /// `InvalidIndex` for a basis state outside the register, and
    /// `DimensionMismatch` if the function returns a state of the wrong size.
    pub fn eval_bs(&self, basis_state: usize) -> Result<State> {
        let basis_size = self.basis_size();
        check_basis_state(basis_state, basis_size)?;
        let image = self.evaluator.eval(basis_state)?;
        check_state_len(&image, basis_size)?;
        Ok(image)
    }

    /// Linear extension of `eval_bs`: `sum_k state[k] * eval_bs(k)`.
    ///
    /// Basis states with a zero amplitude contribute nothing and are not
    /// evaluated.
    pub fn apply(&self, state: &State) -> Result<State> {
        let basis_size = self.basis_size();
        check_state_len(state, basis_size)?;
        let zero = Complex64::new(0.0, 0.0);
        let mut out = Array1::zeros(basis_size);
        for (k, &amp) in state.amplitudes().iter().enumerate() {
            if amp == zero {
                continue;
            }
            let image = self.eval_bs(k)?;
            out.zip_mut_with(image.amplitudes(), |acc, &c| *acc += amp * c);
        }
        Ok(State::from_array_unchecked(out))
    }
}

/// Gate stored as a dense `basis_size x basis_size` matrix.
///
/// Column `k` is the image of basis state `k`. Memory grows as 4^n and a
/// product of two matrix gates costs O(8^n), which bounds the practical
/// qubit count.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixGate {
    qubit_count: usize,
    matrix: Array2<Complex64>,
}

impl MatrixGate {
    /// # Errors
    /// `RegisterTooLarge` for a register past `MAX_QUBITS`, and
    /// `DimensionMismatch` unless `matrix` is `2^qubit_count` square.
    pub fn new(qubit_count: usize, matrix: Array2<Complex64>) -> Result<Self> {
        let basis_size = basis_size_for(qubit_count)?;
        for side in [matrix.nrows(), matrix.ncols()] {
            if side != basis_size {
                return Err(GateError::DimensionMismatch {
                    expected: basis_size,
                    actual: side,
                });
            }
        }
        Ok(MatrixGate {
            qubit_count,
            matrix,
        })
    }

    pub fn qubit_count(&self) -> usize {
        self.qubit_count
    }

    pub fn basis_size(&self) -> usize {
        1 << self.qubit_count
    }

    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.matrix
    }

    /// Take the stored matrix out of the gate.
    ///
    /// # Example
    /// ```
    /// use ndarray::Array2;
    /// use num_complex::Complex64;
    /// use qgates::MatrixGate;
    /// let identity = Array2::<Complex64>::eye(4);
    /// let gate = MatrixGate::new(2, identity.clone()).unwrap();
    /// assert_eq!(gate.into_matrix(), identity);
    /// ```
    pub fn into_matrix(self) -> Array2<Complex64> {
        self.matrix
    }

    /// Column `basis_state` as a view into the stored matrix (no copy).
    ///
    /// The view aliases the gate's storage; it is read-only and cannot
    /// outlive the gate. Use [`MatrixGate::eval_bs`] for an owned state.
    pub fn column(&self, basis_state: usize) -> Result<ArrayView1<'_, Complex64>> {
        check_basis_state(basis_state, self.basis_size())?;
        Ok(self.matrix.column(basis_state))
    }

    /// Copy of column `basis_state`.
    pub fn eval_bs(&self, basis_state: usize) -> Result<State> {
        let column = self.column(basis_state)?;
        Ok(State::from_array_unchecked(column.to_owned()))
    }

    /// Matrix-vector product.
    pub fn apply(&self, state: &State) -> Result<State> {
        check_state_len(state, self.basis_size())?;
        Ok(State::from_array_unchecked(self.matrix.dot(state.amplitudes())))
    }

    /// Raw difference `self - other` of the two matrices.
    ///
    /// Meant for comparing gates up to a numerical tolerance.
    pub fn difference(&self, other: &MatrixGate) -> Result<Array2<Complex64>> {
        if self.qubit_count != other.qubit_count {
            return Err(GateError::DimensionMismatch {
                expected: self.qubit_count,
                actual: other.qubit_count,
            });
        }
        Ok(&self.matrix - &other.matrix)
    }
}

/// Operator on a register of `qubit_count` qubits.
///
/// Both variants represent the same kind of object: `eval_bs(k)` is always
/// column `k` of the operator. They differ only in when the work happens.
#[derive(Debug, Clone)]
pub enum Gate {
    /// Lazy: the evaluator runs on every `eval_bs`.
    Functional(FunctionalGate),
    /// Eager: every column is stored.
    Matrix(MatrixGate),
}

impl From<FunctionalGate> for Gate {
    fn from(gate: FunctionalGate) -> Self {
        Gate::Functional(gate)
    }
}

impl From<MatrixGate> for Gate {
    fn from(gate: MatrixGate) -> Self {
        Gate::Matrix(gate)
    }
}

impl Gate {
    /// Matrix gate from an explicit matrix.
    ///
    /// # Example
    /// ```
    /// use ndarray::array;
    /// use num_complex::Complex64;
    /// use qgates::{Gate, State};
    /// let zero = Complex64::new(0.0, 0.0);
    /// let one = Complex64::new(1.0, 0.0);
    /// let x = Gate::matrix(1, array![[zero, one], [one, zero]]).unwrap();
    /// let flipped = x.eval_bs(0).unwrap();
    /// assert_eq!(flipped, State::from_basis_state(2, 1).unwrap());
    /// ```
    pub fn matrix(qubit_count: usize, matrix: Array2<Complex64>) -> Result<Gate> {
        Ok(Gate::Matrix(MatrixGate::new(qubit_count, matrix)?))
    }

    /// Functional gate wrapping `evaluator`.
    ///
    /// # Errors
    /// `RegisterTooLarge` if `2^qubit_count` does not fit in a `usize`.
    pub fn functional<E: BasisEvaluator + 'static>(
        qubit_count: usize,
        evaluator: E,
    ) -> Result<Gate> {
        Ok(Gate::Functional(FunctionalGate::new(qubit_count, evaluator)?))
    }

    /// Build a gate from its action on basis states, in the representation
    /// selected by `config`.
    ///
    /// A functional gate keeps `evaluator` as is. A matrix gate evaluates it
    /// at every basis state now (O(2^n) evaluations, O(4^n) storage).
    ///
    /// # Example
    /// ```
    /// use qgates::{Gate, GateConfig, State};
    /// // cyclic shift |k> -> |k+1 mod 4>
    /// let shift = |k: usize| State::from_basis_state(4, (k + 1) % 4);
    /// let lazy = Gate::from_eval_bs(2, shift, &GateConfig::functional()).unwrap();
    /// let eager = Gate::from_eval_bs(2, shift, &GateConfig::matrix()).unwrap();
    /// for k in 0..4 {
    ///     assert_eq!(lazy.eval_bs(k).unwrap(), eager.eval_bs(k).unwrap());
    /// }
    /// ```
    pub fn from_eval_bs<E: BasisEvaluator + 'static>(
        qubit_count: usize,
        evaluator: E,
        config: &GateConfig,
    ) -> Result<Gate> {
        match config.representation {
            Representation::Functional => Gate::functional(qubit_count, evaluator),
            Representation::Matrix => {
                let matrix =
                    materialize_columns(qubit_count, &evaluator, config.parallel_threshold)?;
                Gate::matrix(qubit_count, matrix)
            }
        }
    }

    pub fn qubit_count(&self) -> usize {
        match self {
            Gate::Functional(g) => g.qubit_count(),
            Gate::Matrix(g) => g.qubit_count(),
        }
    }

    pub fn basis_size(&self) -> usize {
        1 << self.qubit_count()
    }

    pub fn representation(&self) -> Representation {
        match self {
            Gate::Functional(_) => Representation::Functional,
            Gate::Matrix(_) => Representation::Matrix,
        }
    }

    pub fn as_matrix(&self) -> Option<&MatrixGate> {
        match self {
            Gate::Matrix(g) => Some(g),
            Gate::Functional(_) => None,
        }
    }

    /// Image of basis state `basis_state`.
    ///
    /// # Errors
    /// `InvalidIndex` if `basis_state >= basis_size`.
    pub fn eval_bs(&self, basis_state: usize) -> Result<State> {
        match self {
            Gate::Functional(g) => g.eval_bs(basis_state),
            Gate::Matrix(g) => g.eval_bs(basis_state),
        }
    }

    /// Apply the gate to `state`.
    ///
    /// # Errors
    /// `DimensionMismatch` if `state` does not have `basis_size` amplitudes.
    pub fn apply(&self, state: &State) -> Result<State> {
        match self {
            Gate::Functional(g) => g.apply(state),
            Gate::Matrix(g) => g.apply(state),
        }
    }

    /// Gate that applies `inner` first, then `self`.
    ///
    /// Two matrix gates multiply out to a matrix gate `self * inner`. Any
    /// pairing involving a functional gate stays lazy and yields a
    /// functional gate evaluating `self.apply(inner.eval_bs(k))`.
    ///
    /// # Errors
    /// `DimensionMismatch` if the qubit counts differ.
    pub fn compose(&self, inner: &Gate) -> Result<Gate> {
        if self.qubit_count() != inner.qubit_count() {
            return Err(GateError::DimensionMismatch {
                expected: self.qubit_count(),
                actual: inner.qubit_count(),
            });
        }
        match (self, inner) {
            (Gate::Matrix(outer), Gate::Matrix(inner)) => Gate::matrix(
                outer.qubit_count(),
                outer.matrix().dot(inner.matrix()),
            ),
            _ => Gate::functional(
                self.qubit_count(),
                Composition {
                    outer: self.clone(),
                    inner: inner.clone(),
                },
            ),
        }
    }

    /// Dense matrix of the operator, evaluating a functional gate column by
    /// column. The columns run on the rayon pool once the basis reaches
    /// `config.parallel_threshold`.
    pub fn to_matrix(&self, config: &GateConfig) -> Result<Array2<Complex64>> {
        match self {
            Gate::Matrix(g) => Ok(g.matrix().clone()),
            Gate::Functional(g) => {
                materialize_columns(g.qubit_count(), g, config.parallel_threshold)
            }
        }
    }

    /// Matrix form of this gate.
    pub fn materialize(&self, config: &GateConfig) -> Result<MatrixGate> {
        match self {
            Gate::Matrix(g) => Ok(g.clone()),
            Gate::Functional(_) => MatrixGate::new(self.qubit_count(), self.to_matrix(config)?),
        }
    }

    /// Raw matrix difference `self - other`, materializing functional gates
    /// with `config`.
    ///
    /// # Errors
    /// `DimensionMismatch` if the qubit counts differ.
    pub fn difference(&self, other: &Gate, config: &GateConfig) -> Result<Array2<Complex64>> {
        if self.qubit_count() != other.qubit_count() {
            return Err(GateError::DimensionMismatch {
                expected: self.qubit_count(),
                actual: other.qubit_count(),
            });
        }
        match (self, other) {
            (Gate::Matrix(a), Gate::Matrix(b)) => a.difference(b),
            _ => Ok(self.to_matrix(config)? - other.to_matrix(config)?),
        }
    }
}

impl BasisEvaluator for FunctionalGate {
    fn eval(&self, basis_state: usize) -> Result<State> {
        self.eval_bs(basis_state)
    }
}

impl BasisEvaluator for Gate {
    fn eval(&self, basis_state: usize) -> Result<State> {
        self.eval_bs(basis_state)
    }
}

/// Lazy product of two gates: `outer` applied to the image under `inner`.
#[derive(Debug, Clone)]
pub struct Composition {
    outer: Gate,
    inner: Gate,
}

impl BasisEvaluator for Composition {
    fn eval(&self, basis_state: usize) -> Result<State> {
        let intermediate = self.inner.eval_bs(basis_state)?;
        self.outer.apply(&intermediate)
    }
}

/// `outer.compose(inner)`: apply `inner`, then `outer`.
pub fn compose(outer: &Gate, inner: &Gate) -> Result<Gate> {
    outer.compose(inner)
}

/// `gate.apply(state)`.
///
/// # Example
/// ```
/// use qgates::{apply, Gate, State};
/// let not = Gate::functional(1, |k: usize| State::from_basis_state(2, 1 - k)).unwrap();
/// let zero = State::zero_state(1).unwrap();
/// assert_eq!(apply(&not, &zero).unwrap(), State::from_basis_state(2, 1).unwrap());
/// ```
pub fn apply(gate: &Gate, state: &State) -> Result<State> {
    gate.apply(state)
}
