//! Vortex transaction assembly
//!
//! Turns unspent notes, a target amount and the current tree into the
//! structured input of the external Groth16 prover.
//!
//! ```text
//! unspent notes ──► selection ──► InputWitness ×2 ─┐
//!                                                  ├─► ProofInputBuilder ──► ProofInput (JSON)
//! recipient / change ──────────► OutputWitness ×2 ─┘                              │
//!                                                                        Prover::prove
//!                                                                                 ▼
//!                                                                          ProofOutput
//! ```

pub mod constants;
pub mod error;
pub mod proof;
pub mod prover_inputs;
pub mod selection;
pub mod witness;
pub mod witness_builder;

pub use error::{ProverError, Result};
pub use proof::{ProofOutput, Prover, prove_input};
pub use prover_inputs::ProofInput;
pub use selection::{Selection, select_inputs, total_amount};
pub use witness::{InputWitness, OutputWitness};
pub use witness_builder::{ProofInputBuilder, public_amount};
