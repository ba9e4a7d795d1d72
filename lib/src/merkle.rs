//! Client-side Merkle accumulator.
//!
//! A fixed-height, append-only tree of note commitments that mirrors the
//! on-chain accumulator. Leaves must be inserted in exactly the order the
//! ledger finalized them, or every witness generated afterwards references
//! a root the ledger does not recognize. A bounded history of recent roots
//! stays valid so a proof built against a slightly stale mirror is still
//! accepted.

use ark_bn254::Fr;
use ark_ff::Zero;
use tracing::{debug, trace};

use crate::error::MerkleError;
use crate::hasher::hash_pair;

/// Default protocol tree height.
pub const DEFAULT_TREE_LEVELS: usize = 20;

/// Number of recent roots that remain valid for proof verification.
pub const ROOT_HISTORY_SIZE: usize = 100;

/// The value an unfilled leaf slot hashes as.
pub fn zero_leaf() -> Fr {
    Fr::zero()
}

/// A Merkle membership witness: ordered sibling hashes from leaf to root,
/// plus the leaf index whose bits select left/right at each level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    pub leaf_index: u64,
    pub siblings: Vec<Fr>,
}

impl MerklePath {
    /// The all-zero witness used for notes that are not in the tree (new
    /// outputs and zero-value padding inputs). Only sound because the
    /// assembler forces such notes' public-amount contribution to zero and
    /// the circuit skips the membership check for zero-amount notes.
    pub fn zero(levels: usize) -> Self {
        MerklePath {
            leaf_index: 0,
            siblings: vec![Fr::zero(); levels],
        }
    }

    /// Whether the node is the left child at the given level.
    pub fn is_left(&self, level: usize) -> bool {
        (self.leaf_index >> level) & 1 == 0
    }
}

/// Recompute the root from a leaf and its witness with the standard
/// sibling-recombination walk.
pub fn verify_path(leaf: Fr, path: &MerklePath, expected_root: Fr) -> Result<bool, MerkleError> {
    let mut current = leaf;
    for (level, sibling) in path.siblings.iter().enumerate() {
        current = if path.is_left(level) {
            hash_pair(&current, sibling)?
        } else {
            hash_pair(sibling, &current)?
        };
    }
    Ok(current == expected_root)
}

/// Append-only accumulator with every layer stored explicitly.
///
/// `layers[0]` holds the inserted leaves in order; `layers[levels]` holds
/// the single root node. Unfilled siblings hash as the per-level zero
/// values, so the tree never stores placeholder leaves.
#[derive(Clone, Debug)]
pub struct MerkleAccumulator {
    levels: usize,
    layers: Vec<Vec<Fr>>,
    zeros: Vec<Fr>,
    roots: Vec<Fr>,
    current_root_index: usize,
}

impl MerkleAccumulator {
    /// Create an empty tree of the given height.
    pub fn new(levels: usize) -> Result<Self, MerkleError> {
        // zeros[k] is the hash of an empty subtree of height k;
        // zeros[levels] is the root of the empty tree.
        let mut zeros = Vec::with_capacity(levels + 1);
        zeros.push(zero_leaf());
        for k in 0..levels {
            let z = hash_pair(&zeros[k], &zeros[k])?;
            zeros.push(z);
        }

        let mut roots = vec![Fr::zero(); ROOT_HISTORY_SIZE];
        roots[0] = zeros[levels];

        Ok(MerkleAccumulator {
            levels,
            layers: vec![Vec::new(); levels + 1],
            zeros,
            roots,
            current_root_index: 0,
        })
    }

    /// Tree height.
    pub fn levels(&self) -> usize {
        self.levels
    }

    /// Number of leaves inserted so far.
    pub fn leaf_count(&self) -> u64 {
        self.layers[0].len() as u64
    }

    /// Maximum number of leaves.
    pub fn capacity(&self) -> u64 {
        1u64 << self.levels
    }

    /// Per-level zero values, `zeros[0]` = zero leaf.
    pub fn zeros(&self) -> &[Fr] {
        &self.zeros
    }

    /// Current root.
    pub fn root(&self) -> Fr {
        self.layers[self.levels]
            .first()
            .copied()
            .unwrap_or(self.zeros[self.levels])
    }

    /// Whether `root` is the current root or one of the recent
    /// `ROOT_HISTORY_SIZE` roots.
    pub fn is_known_root(&self, root: Fr) -> bool {
        if root.is_zero() {
            return false;
        }
        let mut i = self.current_root_index;
        loop {
            if self.roots[i] == root {
                return true;
            }
            if i == 0 {
                i = ROOT_HISTORY_SIZE;
            }
            i -= 1;
            if i == self.current_root_index {
                break;
            }
        }
        false
    }

    /// Append one leaf at the next free position, recomputing the ancestor
    /// hashes up to the root. Returns the leaf index.
    pub fn insert(&mut self, leaf: Fr) -> Result<u64, MerkleError> {
        let index = self.layers[0].len() as u64;
        if index >= self.capacity() {
            return Err(MerkleError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }

        self.layers[0].push(leaf);

        let mut current = leaf;
        let mut idx = index as usize;
        for level in 0..self.levels {
            // Appending at the next free slot means a right sibling never
            // exists yet along the insertion path.
            current = if idx % 2 == 0 {
                hash_pair(&current, &self.zeros[level])?
            } else {
                hash_pair(&self.layers[level][idx - 1], &current)?
            };
            idx /= 2;
            if idx < self.layers[level + 1].len() {
                self.layers[level + 1][idx] = current;
            } else {
                self.layers[level + 1].push(current);
            }
        }

        self.current_root_index = (self.current_root_index + 1) % ROOT_HISTORY_SIZE;
        self.roots[self.current_root_index] = current;

        debug!(index, "inserted commitment into accumulator");
        Ok(index)
    }

    /// Locate a commitment's leaf position.
    pub fn index_of(&self, commitment: Fr) -> Option<u64> {
        self.layers[0]
            .iter()
            .position(|leaf| *leaf == commitment)
            .map(|i| i as u64)
    }

    /// Merkle witness for the leaf at `index`.
    pub fn path(&self, index: u64) -> Result<MerklePath, MerkleError> {
        if index >= self.leaf_count() {
            return Err(MerkleError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            });
        }

        let mut siblings = Vec::with_capacity(self.levels);
        let mut idx = index as usize;
        for level in 0..self.levels {
            let sibling_idx = idx ^ 1;
            let sibling = self.layers[level]
                .get(sibling_idx)
                .copied()
                .unwrap_or(self.zeros[level]);
            siblings.push(sibling);
            idx /= 2;
        }

        trace!(index, "fetched merkle witness");
        Ok(MerklePath {
            leaf_index: index,
            siblings,
        })
    }
}
