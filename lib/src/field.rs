//! BN254 scalar-field helpers.
//!
//! Every identifier in the pool (commitments, nullifiers, the root, the
//! ext-data hash) is an element of the BN254 scalar field. Arithmetic that
//! can leave the field, in particular the signed public amount of a
//! withdrawal, must go through [`reduce_signed`] rather than relying on
//! integer wraparound.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

/// Decimal string of the field modulus, for documentation and debugging.
/// This is the BN254 scalar field order (a.k.a. the circom `FIELD_SIZE`).
pub const FIELD_SIZE_DEC: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// Encode a field element as 32 big-endian bytes.
///
/// This is the byte layout used for every public signal and proof-input
/// field.
pub fn to_be_bytes(value: &Fr) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Decode 32 big-endian bytes into a field element, reducing mod the field
/// order. Used for public signals and for folding 32-byte ledger addresses
/// (which may exceed the modulus) into asset identifiers.
pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Fr {
    Fr::from_be_bytes_mod_order(bytes)
}

/// Reduce a signed 128-bit quantity into the field.
///
/// Negative values map to `FIELD_SIZE - |v|`, which is how a withdrawal's
/// negative public amount is represented without a separate sign bit. This
/// is the *only* sanctioned way to put a signed quantity into the field;
/// callers must check for true insolvency before calling it.
pub fn reduce_signed(value: i128) -> Fr {
    if value >= 0 {
        Fr::from(value as u128)
    } else {
        -Fr::from(value.unsigned_abs())
    }
}
