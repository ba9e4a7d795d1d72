//! Typed errors for the pool accounting core.
//!
//! Construction failures identify the note/field that caused them and never
//! leave partial state behind: the accumulator is only mutated by explicit
//! `insert` calls after ledger confirmation.

use thiserror::Error;

/// Field-hashing failures (invalid Poseidon width, input out of field).
#[derive(Debug, Error)]
pub enum HashError {
    #[error("poseidon: {0}")]
    Poseidon(#[from] light_poseidon::PoseidonError),
}

/// Merkle accumulator failures.
#[derive(Debug, Error)]
pub enum MerkleError {
    /// The tree already holds 2^levels leaves.
    #[error("merkle tree is full ({capacity} leaves)")]
    CapacityExceeded { capacity: u64 },

    /// `path` was asked for a leaf that has not been inserted.
    #[error("leaf index {index} out of range (leaf count {leaf_count})")]
    IndexOutOfRange { index: u64, leaf_count: u64 },

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Note derivation failures.
#[derive(Debug, Error)]
pub enum NoteError {
    /// A real (non-zero-amount) note cannot produce a nullifier before its
    /// commitment is confirmed in the accumulator at a known index.
    #[error("note has no confirmed leaf index")]
    MissingLeafIndex,

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Fee policy violations.
#[derive(Debug, Error)]
pub enum FeeError {
    #[error("provided fee {provided} below minimum acceptable fee {minimum}")]
    BelowPolicy { provided: u64, minimum: u64 },

    #[error("fee arithmetic overflow")]
    Overflow,
}

/// Transaction assembly failures.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("too many input notes: {0} (max 2)")]
    TooManyInputs(usize),

    #[error("too many output notes: {0} (max 2)")]
    TooManyOutputs(usize),

    /// A real input's commitment could not be located in the local
    /// accumulator mirror. Assembly fails here rather than proceeding with
    /// a witness for the wrong leaf.
    #[error("input {input} commitment not found in local merkle mirror")]
    MissingMerkleWitness { input: usize },

    /// A note references an asset that is not one of the transaction's two
    /// declared asset slots.
    #[error("{side} note {index} asset does not match a declared asset slot")]
    AssetMismatch { side: &'static str, index: usize },

    /// The inputs plus the public contribution of a slot would go negative.
    /// Caught before field reduction can wrap it into a huge valid value.
    #[error("insufficient input value for asset slot {slot}")]
    InsufficientInputValue { slot: usize },

    /// Inputs plus public contribution do not equal outputs for a slot.
    #[error("unbalanced transaction for asset slot {slot}")]
    Unbalanced { slot: usize },

    #[error("invalid external amount")]
    InvalidExtAmount,

    #[error(transparent)]
    Note(#[from] NoteError),

    #[error(transparent)]
    Merkle(#[from] MerkleError),

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Failures reported by an external proving backend.
#[derive(Debug, Error)]
pub enum ProverError {
    #[error("proving backend: {0}")]
    Backend(String),

    #[error("malformed public signals: expected {expected}, got {got}")]
    MalformedSignals { expected: usize, got: usize },
}

/// Umbrella error for callers that do not care which stage failed.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error(transparent)]
    Merkle(#[from] MerkleError),
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error(transparent)]
    Fee(#[from] FeeError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error(transparent)]
    Prover(#[from] ProverError),
}
