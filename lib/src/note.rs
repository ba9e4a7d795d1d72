//! Notes (UTXOs) and spending keypairs.
//!
//! A note is a private record of value: amount, asset identifier, spending
//! keypair and a random blinding factor. Its public face is the commitment
//! `H4(amount, pubkey, assetId, blinding)`; once the commitment is confirmed
//! in the accumulator at index `i`, spending it publishes the nullifier
//! `H3(commitment, i, sig)` where `sig = H3(privkey, commitment, i)`.
//!
//! Ownership is exclusively with whoever holds `privkey` and `blinding`.

use ark_bn254::Fr;
use ark_ff::UniformRand;
use rand::Rng;

use crate::error::{HashError, NoteError};
use crate::hasher::poseidon;

/// A spending keypair. The public key is derived, never stored
/// independently: `pubkey = H1(privkey)`.
#[derive(Clone, PartialEq, Eq)]
pub struct Keypair {
    privkey: Fr,
    pubkey: Fr,
}

impl Keypair {
    pub fn new(privkey: Fr) -> Result<Self, HashError> {
        let pubkey = poseidon(&[privkey])?;
        Ok(Keypair { privkey, pubkey })
    }

    pub fn random<R: Rng>(rng: &mut R) -> Result<Self, HashError> {
        Keypair::new(Fr::rand(rng))
    }

    pub fn pubkey(&self) -> Fr {
        self.pubkey
    }

    pub fn privkey(&self) -> Fr {
        self.privkey
    }

    /// Sign a `(commitment, index)` pair. The signature feeds the nullifier
    /// derivation, binding the spend to this exact leaf.
    pub fn sign(&self, commitment: Fr, index: u64) -> Result<Fr, HashError> {
        poseidon(&[self.privkey, commitment, Fr::from(index)])
    }
}

// Keep the spending key out of debug output.
impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey)
            .finish_non_exhaustive()
    }
}

/// A shielded note.
#[derive(Clone, Debug)]
pub struct Note {
    /// Token amount. Zero marks a padding note.
    pub amount: u64,
    /// Field encoding of the token/mint identifier.
    pub asset_id: Fr,
    /// Spending keypair of the owner.
    pub keypair: Keypair,
    /// Random blinding factor; makes equal-amount commitments unlinkable.
    pub blinding: Fr,
    /// Leaf position in the accumulator. `None` until the commitment is
    /// confirmed inserted on-chain.
    pub index: Option<u64>,
}

impl Note {
    /// Create a note with a freshly sampled blinding factor.
    pub fn new<R: Rng>(
        amount: u64,
        asset_id: Fr,
        keypair: Keypair,
        rng: &mut R,
    ) -> Result<Self, HashError> {
        Ok(Note {
            amount,
            asset_id,
            keypair,
            blinding: Fr::rand(rng),
            index: None,
        })
    }

    /// A zero-value padding note. Its nullifier is still computed and
    /// consumed, but it carries no value; used to satisfy the fixed
    /// two-in/two-out arity.
    pub fn padding<R: Rng>(asset_id: Fr, rng: &mut R) -> Result<Self, HashError> {
        let keypair = Keypair::random(rng)?;
        Note::new(0, asset_id, keypair, rng)
    }

    /// Mark the note live at a confirmed leaf index.
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    /// `H4(amount, pubkey, assetId, blinding)`, deterministic for fixed
    /// fields.
    pub fn commitment(&self) -> Result<Fr, HashError> {
        poseidon(&[
            Fr::from(self.amount),
            self.keypair.pubkey(),
            self.asset_id,
            self.blinding,
        ])
    }

    /// Nullifier at the note's confirmed index.
    ///
    /// Padding notes (amount zero) nullify at index 0 with the zero
    /// witness; a real note without a confirmed index cannot be spent.
    pub fn nullifier(&self) -> Result<Fr, NoteError> {
        let index = match self.index {
            Some(i) => i,
            None if self.amount == 0 => 0,
            None => return Err(NoteError::MissingLeafIndex),
        };
        Ok(self.nullifier_at(index)?)
    }

    /// Nullifier as if the note sat at `index`. Deterministic for fixed
    /// `(commitment, index, privkey)`; replay detection relies on this.
    pub fn nullifier_at(&self, index: u64) -> Result<Fr, HashError> {
        let commitment = self.commitment()?;
        let signature = self.keypair.sign(commitment, index)?;
        poseidon(&[commitment, Fr::from(index), signature])
    }
}
