//! Accounting core of a shielded, multi-asset transaction pool.
//!
//! Value lives in unlinkable notes (UTXOs), is consumed via one-time
//! nullifiers, and is re-created via commitments appended to a fixed-height
//! Merkle accumulator. A zero-knowledge proving system, injected behind
//! the [`Prover`] trait, attests that a transaction is balanced and
//! well-formed without revealing note contents.
//!
//! This crate owns the note model, the client-side accumulator mirror, the
//! ext-data binder, the fee policy, and the assembly of the proof input;
//! ledger submission and the circuit itself are external collaborators.
//!
//! Lifecycle: select up to two spendable notes → [`assembler::assemble`]
//! pads to fixed arity, fetches witnesses and derives nullifiers and
//! commitments → the prover returns proof plus public signals → the caller
//! submits to the ledger → on confirmation the mirror is advanced with
//! [`MerkleAccumulator::insert`] in exactly the ledger's order.

pub mod assembler;
pub mod error;
pub mod ext_data;
pub mod fees;
pub mod field;
pub mod hasher;
pub mod merkle;
pub mod note;

pub use assembler::{
    assemble, check_public_amount, ProofBundle, ProofInput, Prover, PublicSignals,
    TransactionSpec, NUM_INPUT_NOTES, NUM_OUTPUT_NOTES, NUM_PUBLIC_SIGNALS,
};
pub use error::{
    AssembleError, FeeError, HashError, MerkleError, NoteError, PoolError, ProverError,
};
pub use ext_data::{Address, ExtData};
pub use fees::{
    deposit_fee, validate_fee, withdrawal_fee, DEPOSIT_FEE_RATE, FEE_ERROR_MARGIN,
    RATE_DENOMINATOR, WITHDRAW_FEE_RATE,
};
pub use merkle::{
    verify_path, MerkleAccumulator, MerklePath, DEFAULT_TREE_LEVELS, ROOT_HISTORY_SIZE,
};
pub use note::{Keypair, Note};
