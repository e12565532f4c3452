//! Gate abstraction layer for state-vector quantum circuit simulation.
//!
//! An n-qubit register is a [`State`] of 2^n complex amplitudes. A [`Gate`]
//! is an operator on such a register, stored either lazily as a basis-state
//! evaluator or eagerly as a dense matrix. Gates declared on a few qubits are
//! lifted to the full register with [`multi_gate`] and [`controlled_u`], and
//! chained with [`compose`].

pub mod composite;
pub mod config;
pub mod error;
pub mod gate;
pub mod index;
pub mod materialize;
pub mod state;

pub use composite::{controlled_u, embed, multi_gate};
pub use config::{GateConfig, Representation};
pub use error::{GateError, Result};
pub use gate::{apply, compose, BasisEvaluator, FunctionalGate, Gate, MatrixGate};
pub use state::{State, MAX_QUBITS};
