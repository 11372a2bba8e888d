//! Node storage for the Merkle prefix tree.
//!
//! Nodes live in a flat arena owned by the tree; children refer to each
//! other by [`NodeId`]. The three variants are a closed sum: an empty
//! branch standing in for an absent subtree, an interior node with
//! exactly two children, and a user leaf carrying a committed value.

use crate::constant::{EMPTY_BRANCH_TAG, LEAF_TAG};
use crate::crypto::{digest, Commitment};
use alloy_primitives::B256;

/// Index of a node inside its tree's arena.
pub(crate) type NodeId = usize;

/// Arena slot of the root interior node.
pub(crate) const ROOT: NodeId = 0;

#[derive(Clone, Debug)]
pub(crate) enum Node {
    /// An absent subtree. Still hashes, so that the position of every
    /// present leaf is authenticated against every absent sibling.
    Empty {
        level: u32,
        /// The bit prefix reaching this branch, packed MSB-first into
        /// `ceil(level / 8)` bytes.
        index: Vec<u8>,
    },
    Interior {
        level: u32,
        left: NodeId,
        right: NodeId,
        /// Cached child hashes; cleared along the path of every mutation
        /// and refilled on the next root hash computation.
        left_hash: Option<B256>,
        right_hash: Option<B256>,
    },
    Leaf {
        level: u32,
        /// The full lookup index; its first `level` bits equal the path
        /// from the root to this slot.
        index: B256,
        value: Vec<u8>,
        commitment: Commitment,
    },
}

/// Hash of an empty branch: `digest('E', nonce, index, level)`.
pub(crate) fn empty_hash(nonce: &B256, index: &[u8], level: u32) -> B256 {
    digest(&[
        &[EMPTY_BRANCH_TAG],
        nonce.as_slice(),
        index,
        &level.to_le_bytes(),
    ])
}

/// Hash of a user leaf: `digest('L', nonce, index, level, commitment)`.
/// The leaf's value never enters the node hash directly; it is bound
/// through the commitment digest.
pub(crate) fn leaf_hash(nonce: &B256, index: &[u8], level: u32, commitment: &B256) -> B256 {
    digest(&[
        &[LEAF_TAG],
        nonce.as_slice(),
        index,
        &level.to_le_bytes(),
        commitment.as_slice(),
    ])
}

/// Hash of an interior node over its two child hashes.
#[inline]
pub(crate) fn interior_hash(left: &B256, right: &B256) -> B256 {
    digest(&[left.as_slice(), right.as_slice()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_separation_between_variants() {
        let nonce = B256::repeat_byte(0xaa);
        let index = [0x80u8];
        // An empty branch and a leaf at the same position must never
        // collide, whatever the commitment happens to be.
        let empty = empty_hash(&nonce, &index, 1);
        let leaf = leaf_hash(&nonce, &index, 1, &B256::ZERO);
        assert_ne!(empty, leaf);
    }

    #[test]
    fn test_nonce_separates_trees() {
        let index = [0x00u8];
        assert_ne!(
            empty_hash(&B256::repeat_byte(1), &index, 1),
            empty_hash(&B256::repeat_byte(2), &index, 1),
        );
    }

    #[test]
    fn test_level_and_index_enter_the_hash() {
        let nonce = B256::ZERO;
        assert_ne!(
            empty_hash(&nonce, &[0x00], 1),
            empty_hash(&nonce, &[0x00], 2)
        );
        assert_ne!(
            empty_hash(&nonce, &[0x00], 1),
            empty_hash(&nonce, &[0x80], 1)
        );
    }

    #[test]
    fn test_interior_hash_is_ordered() {
        let l = B256::repeat_byte(3);
        let r = B256::repeat_byte(4);
        assert_ne!(interior_hash(&l, &r), interior_hash(&r, &l));
    }
}
