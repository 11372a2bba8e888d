//! Authentication paths: compact proofs that a lookup index is bound to
//! a leaf or absent from the tree, verifiable against the root digest
//! alone.

use super::bits::{bit_at, prefix_matches};
use super::node::{empty_hash, interior_hash, leaf_hash};
use crate::constant::INDEX_BITS;
use crate::crypto::{vrf::VrfError, Commitment};
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What an authentication path claims about its lookup index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// The index is bound to the value carried by the terminal leaf.
    Inclusion,
    /// The index is absent: the walk ended on an empty branch, or on a
    /// leaf with a different index occupying the shared prefix.
    Exclusion,
}

/// The commitment material carried by a [`ProofNode`]. The salt is
/// withheld when the node proves absence by prefix collision, since the
/// colliding entry must stay hidden.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafCommitment {
    pub salt: Option<B256>,
    pub value: B256,
}

/// The terminal node of an authentication path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofNode {
    /// Depth of the terminal node; the root is level 0.
    pub level: u32,
    /// The node's index: the full lookup index for a leaf, or the packed
    /// bit prefix for an empty branch.
    pub index: Vec<u8>,
    /// The stored value, present only on inclusion.
    pub value: Option<Vec<u8>>,
    /// Whether the walk terminated on an empty branch.
    pub is_empty: bool,
    /// Commitment material, absent for empty branches.
    pub commitment: Option<LeafCommitment>,
}

/// An inclusion-or-absence proof: the sibling hashes along the walk from
/// the root to the terminal node, plus the terminal node itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationPath {
    /// The tree's domain separation nonce.
    pub tree_nonce: B256,
    /// The index that was looked up.
    pub lookup_index: B256,
    /// Sibling hashes from the root down to the terminal node's level.
    pub pruned_tree: Vec<B256>,
    /// The terminal node.
    pub leaf: ProofNode,
}

/// Error type for proof verification.
#[derive(Debug, Error)]
pub enum ProofError {
    /// The proof is of the opposite type to the requested check.
    #[error("mismatched proof type")]
    TypeMismatch,
    /// The proof's pieces are inconsistent with each other.
    #[error("malformed proof: {0}")]
    Malformed(&'static str),
    /// The commitment does not bind the claimed key and value.
    #[error("commitment does not bind the claimed entry")]
    CommitmentMismatch,
    /// Folding the sibling hashes did not reproduce the expected root.
    #[error("reconstructed root does not match the commitment")]
    RootMismatch,
    /// The VRF output in the proof does not match the lookup index.
    #[error("VRF output does not match the lookup index")]
    IndexMismatch,
    /// The VRF proof itself failed to parse or verify.
    #[error(transparent)]
    Vrf(#[from] VrfError),
}

impl AuthenticationPath {
    /// Classifies the proof from the shape of its terminal node.
    pub fn proof_type(&self) -> ProofType {
        if !self.leaf.is_empty
            && self.leaf.value.is_some()
            && self.leaf.index == self.lookup_index.as_slice()
        {
            ProofType::Inclusion
        } else {
            ProofType::Exclusion
        }
    }

    /// Verifies the path against `expected_root`.
    ///
    /// For inclusion, the commitment digest is recomputed from the
    /// caller-supplied `key` and `value` and checked against the stored
    /// commitment before the terminal hash is formed. For exclusion, the
    /// terminal hash is rebuilt from the carried material alone, after
    /// checking that the terminal node actually lies on the lookup
    /// path. Either way the sibling hashes are then folded bit by bit
    /// along the lookup index and the result compared to
    /// `expected_root`.
    pub fn verify(&self, key: &[u8], value: &[u8], expected_root: &B256) -> Result<(), ProofError> {
        let leaf = &self.leaf;
        let level = leaf.level as usize;
        if level > INDEX_BITS {
            return Err(ProofError::Malformed("leaf level exceeds the index width"));
        }
        if self.pruned_tree.len() != level {
            return Err(ProofError::Malformed(
                "sibling count does not match the leaf level",
            ));
        }
        if leaf.index.len() * 8 < level {
            return Err(ProofError::Malformed("leaf index shorter than its level"));
        }

        let terminal_hash = match self.proof_type() {
            ProofType::Inclusion => {
                let commitment = leaf
                    .commitment
                    .as_ref()
                    .ok_or(ProofError::Malformed("inclusion without a commitment"))?;
                let salt = commitment
                    .salt
                    .ok_or(ProofError::Malformed("inclusion without a salt"))?;
                if Commitment::bind(&salt, &[key, value]) != commitment.value {
                    return Err(ProofError::CommitmentMismatch);
                }
                leaf_hash(&self.tree_nonce, &leaf.index, leaf.level, &commitment.value)
            }
            ProofType::Exclusion => {
                if !prefix_matches(&leaf.index, self.lookup_index.as_slice(), level) {
                    return Err(ProofError::Malformed(
                        "terminal node is not on the lookup path",
                    ));
                }
                if leaf.is_empty {
                    empty_hash(&self.tree_nonce, &leaf.index, leaf.level)
                } else {
                    // A leaf at the looked-up index cannot prove its own
                    // absence, whatever material was stripped from it.
                    if leaf.index == self.lookup_index.as_slice() {
                        return Err(ProofError::Malformed(
                            "exclusion terminates at the looked-up leaf",
                        ));
                    }
                    let commitment = leaf
                        .commitment
                        .as_ref()
                        .ok_or(ProofError::Malformed("colliding leaf without a commitment"))?;
                    leaf_hash(&self.tree_nonce, &leaf.index, leaf.level, &commitment.value)
                }
            }
        };

        let mut hash = terminal_hash;
        for depth in (0..level).rev() {
            let sibling = &self.pruned_tree[depth];
            hash = if bit_at(self.lookup_index.as_slice(), depth) {
                interior_hash(sibling, &hash)
            } else {
                interior_hash(&hash, sibling)
            };
        }
        if hash != *expected_root {
            return Err(ProofError::RootMismatch);
        }
        Ok(())
    }
}
