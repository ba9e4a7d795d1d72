//! Poseidon field hasher.
//!
//! All pool identifiers are produced by Poseidon over BN254 in the circom
//! parameterization, so client-side derivations match the circuit's
//! constraints bit for bit:
//!
//!   pubkey     = H1(privkey)
//!   commitment = H4(amount, pubkey, assetId, blinding)
//!   signature  = H3(privkey, commitment, index)
//!   nullifier  = H3(commitment, index, signature)
//!   node       = H2(left, right)

use ark_bn254::Fr;
use light_poseidon::{Poseidon, PoseidonHasher};

use crate::error::HashError;

/// Hash a slice of field elements with the circom Poseidon parameters for
/// that arity.
pub fn poseidon(inputs: &[Fr]) -> Result<Fr, HashError> {
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len()).map_err(HashError::Poseidon)?;
    hasher.hash(inputs).map_err(HashError::Poseidon)
}

/// Hash a pair of sibling nodes into their parent.
pub fn hash_pair(left: &Fr, right: &Fr) -> Result<Fr, HashError> {
    poseidon(&[*left, *right])
}
