//! Transaction assembler.
//!
//! Composes two input notes and two output notes (fixed arity, zero-value
//! padding) plus the ext-data hash and the accumulator root into the full
//! public/private proof input, enforcing the balance equation per asset
//! slot *before* anything is reduced into the field. Also decodes the
//! proving system's public signals back into named fields in the exact
//! order the circuit publishes them.
//!
//! Balance law, per asset slot (slot 0 mandatory, slot 1 for swaps):
//!
//!   sum(inputAmounts of slot asset) + publicAmount
//!       == sum(outputAmounts of slot asset)
//!
//! where `publicAmount` for slot 0 is `extAmount - fee` and for slot 1 the
//! incoming swap amount, each reduced into the field only after the signed
//! check passes.

use ark_bn254::Fr;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AssembleError, ProverError};
use crate::ext_data::ExtData;
use crate::field;
use crate::merkle::{MerkleAccumulator, MerklePath};
use crate::note::Note;

/// Fixed transaction arity.
pub const NUM_INPUT_NOTES: usize = 2;
pub const NUM_OUTPUT_NOTES: usize = 2;

/// Number of public signals the circuit publishes.
pub const NUM_PUBLIC_SIGNALS: usize = 8;

/// Caller-selected pieces of a transaction, before padding.
#[derive(Clone, Debug)]
pub struct TransactionSpec {
    /// Up to two notes to spend. Fewer are padded with zero-value notes.
    pub inputs: Vec<Note>,
    /// Up to two notes to create. Fewer are padded with zero-value notes.
    pub outputs: Vec<Note>,
    /// Public metadata; `ext_data.ext_amount` and `ext_data.fee` feed the
    /// slot-0 public amount.
    pub ext_data: ExtData,
    /// Slot-1 public contribution: the incoming amount of a cross-asset
    /// swap, zero for everything else.
    pub ext_amount1: i64,
}

/// The full input record handed to the proving system. All field elements
/// are 32-byte big-endian.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofInput {
    // Public.
    pub root: [u8; 32],
    pub input_nullifiers: [[u8; 32]; 2],
    pub output_commitments: [[u8; 32]; 2],
    pub public_amount0: [u8; 32],
    pub public_amount1: [u8; 32],
    pub ext_data_hash: [u8; 32],
    /// Field encodings of the two asset mints; the verifier re-supplies
    /// these from its own accounts.
    pub mint_address: [[u8; 32]; 2],
    // Private, per input note.
    pub in_amount: [u64; 2],
    pub in_asset_id: [[u8; 32]; 2],
    pub in_private_key: [[u8; 32]; 2],
    pub in_blinding: [[u8; 32]; 2],
    pub in_path_indices: [u64; 2],
    pub in_path_elements: [Vec<[u8; 32]>; 2],
    // Private, per output note.
    pub out_amount: [u64; 2],
    pub out_asset_id: [[u8; 32]; 2],
    pub out_pubkey: [[u8; 32]; 2],
    pub out_blinding: [[u8; 32]; 2],
}

impl ProofInput {
    /// The public signals an honest circuit publishes for this input, in
    /// decode order. Mock provers and tests derive their output from this.
    pub fn to_public_signals(&self) -> PublicSignals {
        PublicSignals {
            root: self.root,
            public_amount0: self.public_amount0,
            public_amount1: self.public_amount1,
            ext_data_hash: self.ext_data_hash,
            input_nullifiers: self.input_nullifiers,
            output_commitments: self.output_commitments,
        }
    }
}

/// Public signals in the circuit's publish order:
/// root, publicAmount0, publicAmount1, extDataHash, nullifiers, commitments.
/// The order is a protocol constant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicSignals {
    pub root: [u8; 32],
    pub public_amount0: [u8; 32],
    pub public_amount1: [u8; 32],
    pub ext_data_hash: [u8; 32],
    pub input_nullifiers: [[u8; 32]; 2],
    pub output_commitments: [[u8; 32]; 2],
}

impl PublicSignals {
    /// Decode an ordered signal sequence into named fields.
    pub fn decode(signals: &[[u8; 32]]) -> Result<Self, ProverError> {
        if signals.len() != NUM_PUBLIC_SIGNALS {
            return Err(ProverError::MalformedSignals {
                expected: NUM_PUBLIC_SIGNALS,
                got: signals.len(),
            });
        }
        Ok(PublicSignals {
            root: signals[0],
            public_amount0: signals[1],
            public_amount1: signals[2],
            ext_data_hash: signals[3],
            input_nullifiers: [signals[4], signals[5]],
            output_commitments: [signals[6], signals[7]],
        })
    }

    /// Inverse of [`PublicSignals::decode`].
    pub fn encode(&self) -> Vec<[u8; 32]> {
        vec![
            self.root,
            self.public_amount0,
            self.public_amount1,
            self.ext_data_hash,
            self.input_nullifiers[0],
            self.input_nullifiers[1],
            self.output_commitments[0],
            self.output_commitments[1],
        ]
    }
}

/// Proof bytes plus the ordered public signals, as returned by a backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofBundle {
    pub proof: Vec<u8>,
    pub public_signals: Vec<[u8; 32]>,
}

/// The external proving system, injected as a capability. The core depends
/// only on this interface, not on any particular backend.
pub trait Prover {
    fn prove(&self, input: &ProofInput) -> Result<ProofBundle, ProverError>;
}

/// Verifier-side check that a claimed 32-byte public amount equals
/// `extAmount - fee` under field arithmetic. Rejects `i64::MIN` and
/// deposits that do not clear their fee.
pub fn check_public_amount(ext_amount: i64, fee: u64, public_amount: &[u8; 32]) -> bool {
    if ext_amount == i64::MIN {
        return false;
    }
    if ext_amount >= 0 && (ext_amount as u64) <= fee {
        return false;
    }
    let expected = field::reduce_signed(ext_amount as i128 - fee as i128);
    field::from_be_bytes_mod_order(public_amount) == expected
}

/// Assemble a full proof input from caller-selected notes.
///
/// The accumulator is read-only here; it is advanced by the caller only
/// after the ledger confirms the transaction, in the ledger's order.
pub fn assemble<R: Rng>(
    tree: &MerkleAccumulator,
    spec: &TransactionSpec,
    rng: &mut R,
) -> Result<ProofInput, AssembleError> {
    if spec.inputs.len() > NUM_INPUT_NOTES {
        return Err(AssembleError::TooManyInputs(spec.inputs.len()));
    }
    if spec.outputs.len() > NUM_OUTPUT_NOTES {
        return Err(AssembleError::TooManyOutputs(spec.outputs.len()));
    }
    if spec.ext_data.ext_amount == i64::MIN || spec.ext_amount1 == i64::MIN {
        return Err(AssembleError::InvalidExtAmount);
    }

    let asset0 = field::from_be_bytes_mod_order(&spec.ext_data.mint_a);
    let asset1 = field::from_be_bytes_mod_order(&spec.ext_data.mint_b);

    // Pad to fixed arity. Padding notes are ordinary zero-value notes of
    // the slot-0 asset, not a special case.
    let mut inputs = spec.inputs.clone();
    while inputs.len() < NUM_INPUT_NOTES {
        inputs.push(Note::padding(asset0, rng)?);
    }
    let mut outputs = spec.outputs.clone();
    while outputs.len() < NUM_OUTPUT_NOTES {
        outputs.push(Note::padding(asset0, rng)?);
    }

    for (i, note) in inputs.iter().enumerate() {
        if note.asset_id != asset0 && note.asset_id != asset1 {
            return Err(AssembleError::AssetMismatch {
                side: "input",
                index: i,
            });
        }
    }
    for (i, note) in outputs.iter().enumerate() {
        if note.asset_id != asset0 && note.asset_id != asset1 {
            return Err(AssembleError::AssetMismatch {
                side: "output",
                index: i,
            });
        }
    }

    // Balance law per slot, in signed 128-bit arithmetic. Insolvency must
    // fail here; reducing first would wrap it into a huge valid field
    // element.
    let public0 = spec.ext_data.ext_amount as i128 - spec.ext_data.fee as i128;
    let public1 = spec.ext_amount1 as i128;
    for (slot, (slot_asset, public)) in [(asset0, public0), (asset1, public1)]
        .into_iter()
        .enumerate()
    {
        // With a single asset, slot 1 is inert and must contribute nothing.
        if slot == 1 && asset1 == asset0 {
            if public1 != 0 {
                return Err(AssembleError::Unbalanced { slot });
            }
            continue;
        }
        let sum_in: i128 = inputs
            .iter()
            .filter(|n| n.asset_id == slot_asset)
            .map(|n| n.amount as i128)
            .sum();
        let sum_out: i128 = outputs
            .iter()
            .filter(|n| n.asset_id == slot_asset)
            .map(|n| n.amount as i128)
            .sum();
        let available = sum_in + public;
        if available < 0 {
            return Err(AssembleError::InsufficientInputValue { slot });
        }
        if available != sum_out {
            return Err(AssembleError::Unbalanced { slot });
        }
    }

    // Witnesses and nullifiers. Real inputs must be locatable in the
    // mirror; silently witnessing the wrong leaf is never an option.
    let mut input_nullifiers = [Fr::from(0u64); 2];
    let mut paths: Vec<MerklePath> = Vec::with_capacity(NUM_INPUT_NOTES);
    for (i, note) in inputs.iter().enumerate() {
        let commitment = note.commitment()?;
        let path = if note.amount > 0 {
            let index = tree
                .index_of(commitment)
                .ok_or(AssembleError::MissingMerkleWitness { input: i })?;
            tree.path(index)?
        } else {
            MerklePath::zero(tree.levels())
        };
        input_nullifiers[i] = note.nullifier_at(path.leaf_index)?;
        paths.push(path);
    }

    let mut output_commitments = [Fr::from(0u64); 2];
    for (i, note) in outputs.iter().enumerate() {
        output_commitments[i] = note.commitment()?;
    }

    let ext_data_hash = spec.ext_data.hash();
    let root = tree.root();

    debug!(
        in_index0 = paths[0].leaf_index,
        in_index1 = paths[1].leaf_index,
        ext_amount = spec.ext_data.ext_amount,
        fee = spec.ext_data.fee,
        "assembled transaction proof input"
    );

    let path_bytes = |path: &MerklePath| -> Vec<[u8; 32]> {
        path.siblings.iter().map(field::to_be_bytes).collect()
    };

    Ok(ProofInput {
        root: field::to_be_bytes(&root),
        input_nullifiers: [
            field::to_be_bytes(&input_nullifiers[0]),
            field::to_be_bytes(&input_nullifiers[1]),
        ],
        output_commitments: [
            field::to_be_bytes(&output_commitments[0]),
            field::to_be_bytes(&output_commitments[1]),
        ],
        public_amount0: field::to_be_bytes(&field::reduce_signed(public0)),
        public_amount1: field::to_be_bytes(&field::reduce_signed(public1)),
        ext_data_hash: field::to_be_bytes(&ext_data_hash),
        mint_address: [
            field::to_be_bytes(&asset0),
            field::to_be_bytes(&asset1),
        ],
        in_amount: [inputs[0].amount, inputs[1].amount],
        in_asset_id: [
            field::to_be_bytes(&inputs[0].asset_id),
            field::to_be_bytes(&inputs[1].asset_id),
        ],
        in_private_key: [
            field::to_be_bytes(&inputs[0].keypair.privkey()),
            field::to_be_bytes(&inputs[1].keypair.privkey()),
        ],
        in_blinding: [
            field::to_be_bytes(&inputs[0].blinding),
            field::to_be_bytes(&inputs[1].blinding),
        ],
        in_path_indices: [paths[0].leaf_index, paths[1].leaf_index],
        in_path_elements: [path_bytes(&paths[0]), path_bytes(&paths[1])],
        out_amount: [outputs[0].amount, outputs[1].amount],
        out_asset_id: [
            field::to_be_bytes(&outputs[0].asset_id),
            field::to_be_bytes(&outputs[1].asset_id),
        ],
        out_pubkey: [
            field::to_be_bytes(&outputs[0].keypair.pubkey()),
            field::to_be_bytes(&outputs[1].keypair.pubkey()),
        ],
        out_blinding: [
            field::to_be_bytes(&outputs[0].blinding),
            field::to_be_bytes(&outputs[1].blinding),
        ],
    })
}
