//! External-data binder.
//!
//! All public transaction metadata is canonicalized into one byte string
//! and hashed to a single field element that the circuit reproduces from
//! its own public-input copy of the fields. This hash is the only linkage
//! between off-circuit metadata and the proof; any post-proof tampering
//! with recipient, amount or fee changes it and invalidates the proof.
//!
//! The serialization order is protocol version: recipient, signed external
//! amount, encrypted memo (length-prefixed), fee, fee recipient, asset A,
//! asset B.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

use crate::field;

/// A 32-byte ledger address (recipient, fee recipient, token mint).
pub type Address = [u8; 32];

/// Public, non-hidden metadata of a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtData {
    /// Who receives withdrawn funds.
    pub recipient: Address,
    /// Positive = deposit, negative = withdrawal, zero only for pure swaps
    /// where the exchanged amount rides in the slot-1 contribution.
    pub ext_amount: i64,
    /// Opaque encrypted memo (note ciphertext for the recipient's wallet).
    pub encrypted_output: Vec<u8>,
    /// Fee bound into the balance equation.
    pub fee: u64,
    /// Who receives the fee.
    pub fee_recipient: Address,
    /// Asset slot 0 mint.
    pub mint_a: Address,
    /// Asset slot 1 mint. Equal to `mint_a` unless the transaction is a
    /// cross-asset swap.
    pub mint_b: Address,
}

impl ExtData {
    /// Canonical byte serialization. Integers are little-endian; the memo
    /// carries a u32 length prefix so field boundaries cannot shift.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(32 * 4 + 8 + 8 + 4 + self.encrypted_output.len());
        bytes.extend_from_slice(&self.recipient);
        bytes.extend_from_slice(&self.ext_amount.to_le_bytes());
        bytes.extend_from_slice(&(self.encrypted_output.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&self.encrypted_output);
        bytes.extend_from_slice(&self.fee.to_le_bytes());
        bytes.extend_from_slice(&self.fee_recipient);
        bytes.extend_from_slice(&self.mint_a);
        bytes.extend_from_slice(&self.mint_b);
        bytes
    }

    /// Hash the metadata into a field element.
    pub fn hash(&self) -> Fr {
        let mut keccak = Keccak::v256();
        keccak.update(&self.canonical_bytes());
        let mut digest = [0u8; 32];
        keccak.finalize(&mut digest);
        field::from_be_bytes_mod_order(&digest)
    }
}
