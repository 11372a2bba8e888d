//! This module implements [`MerkleTree`].

use super::bits::{bit_at, prefix_with_bit};
use super::node::{empty_hash, interior_hash, leaf_hash, Node, NodeId, ROOT};
use super::proof::{AuthenticationPath, LeafCommitment, ProofNode};
use super::TreeError;
use crate::constant::INDEX_BITS;
use crate::crypto::{make_rand, Commitment};
use alloy_primitives::B256;

/// A Merkle prefix tree over fixed-width lookup indices.
///
/// The tree is created empty and grows monotonically through
/// [`MerkleTree::set`]; leaves can be replaced but never removed. Every
/// node hash mixes in a per-tree random nonce, so two trees over the
/// same entries still commit to different roots.
///
/// Node hashes are cached and recomputed lazily: a mutation clears the
/// cached hashes along its path, and the next [`MerkleTree::root_hash`]
/// walks only the subtrees whose caches were cleared. Operations that
/// read hashes ([`MerkleTree::get`], serialization) finalize the caches
/// first, which is why they take `&mut self`.
#[derive(Clone, Debug)]
pub struct MerkleTree {
    /// Random tree-specific nonce, fixed for the tree's lifetime.
    pub(crate) nonce: B256,
    /// Arena holding every node; [`ROOT`] is always an interior node.
    pub(crate) nodes: Vec<Node>,
    /// Cached root digest; `None` after any mutation.
    pub(crate) hash: Option<B256>,
}

impl MerkleTree {
    /// Creates an empty tree with a fresh random nonce. The root is an
    /// interior node whose children are two empty branches at level 1.
    pub fn new_empty() -> Result<Self, TreeError> {
        Ok(Self::with_nonce(make_rand()?))
    }

    pub(crate) fn with_nonce(nonce: B256) -> Self {
        let nodes = vec![
            Node::Interior {
                level: 0,
                left: 1,
                right: 2,
                left_hash: None,
                right_hash: None,
            },
            Node::Empty {
                level: 1,
                index: vec![0x00],
            },
            Node::Empty {
                level: 1,
                index: vec![0x80],
            },
        ];
        Self {
            nonce,
            nodes,
            hash: None,
        }
    }

    /// The tree's domain separation nonce.
    pub fn nonce(&self) -> B256 {
        self.nonce
    }

    /// Inserts or updates the value stored under `index`, committing to
    /// `(key, value)` under a freshly salted commitment. Updating an
    /// existing index replaces its value and commitment in place, so the
    /// same entry inserted twice yields two distinct leaf hashes.
    pub fn set(&mut self, index: B256, key: &[u8], value: &[u8]) -> Result<(), TreeError> {
        let commitment = Commitment::new(&[key, value])?;
        self.insert_leaf(index, value.to_vec(), commitment)
    }

    pub(crate) fn insert_leaf(
        &mut self,
        index: B256,
        value: Vec<u8>,
        commitment: Commitment,
    ) -> Result<(), TreeError> {
        self.hash = None;
        let mut cursor: NodeId = ROOT;
        let mut depth: u32 = 0;
        loop {
            if depth as usize >= INDEX_BITS {
                return Err(TreeError::InvalidTree("lookup index exhausted"));
            }
            let direction = bit_at(index.as_slice(), depth as usize);
            let child = match &mut self.nodes[cursor] {
                Node::Interior {
                    left,
                    right,
                    left_hash,
                    right_hash,
                    ..
                } => {
                    // Invalidate the cache on the side we are descending.
                    if direction {
                        *right_hash = None;
                        *right
                    } else {
                        *left_hash = None;
                        *left
                    }
                }
                _ => return Err(TreeError::InvalidTree("walk reached a non-interior node")),
            };

            match &self.nodes[child] {
                Node::Empty { .. } => {
                    self.nodes[child] = Node::Leaf {
                        level: depth + 1,
                        index,
                        value,
                        commitment,
                    };
                    return Ok(());
                }
                Node::Leaf {
                    index: existing, ..
                } => {
                    if *existing == index {
                        // Same index: replace value and commitment,
                        // keeping the leaf's position.
                        if let Node::Leaf {
                            value: slot_value,
                            commitment: slot_commitment,
                            ..
                        } = &mut self.nodes[child]
                        {
                            *slot_value = value;
                            *slot_commitment = commitment;
                        }
                        return Ok(());
                    }
                    // A different leaf occupies this position: grow an
                    // interior node here, push the occupant one level
                    // down, and retry from the new interior. The loop
                    // repeats this until the two indices diverge.
                    let existing = *existing;
                    self.split_leaf(child, depth + 1, &existing);
                    cursor = child;
                    depth += 1;
                }
                Node::Interior { .. } => {
                    cursor = child;
                    depth += 1;
                }
            }
        }
    }

    /// Replaces the leaf in `slot` with an interior node at `level` whose
    /// children are two fresh empty branches, then re-installs the old
    /// leaf one level deeper on its own side.
    fn split_leaf(&mut self, slot: NodeId, level: u32, existing_index: &B256) {
        let left = self.alloc(Node::Empty {
            level: level + 1,
            index: prefix_with_bit(existing_index.as_slice(), level as usize, false),
        });
        let right = self.alloc(Node::Empty {
            level: level + 1,
            index: prefix_with_bit(existing_index.as_slice(), level as usize, true),
        });
        let mut occupant = std::mem::replace(
            &mut self.nodes[slot],
            Node::Interior {
                level,
                left,
                right,
                left_hash: None,
                right_hash: None,
            },
        );
        if let Node::Leaf {
            level: occupant_level,
            ..
        } = &mut occupant
        {
            *occupant_level = level + 1;
        }
        let side = if bit_at(existing_index.as_slice(), level as usize) {
            right
        } else {
            left
        };
        self.nodes[side] = occupant;
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Returns the root digest, recomputing any node hashes invalidated
    /// since the last call.
    pub fn root_hash(&mut self) -> B256 {
        if let Some(hash) = self.hash {
            return hash;
        }
        let hash = self.compute_hash(ROOT);
        self.hash = Some(hash);
        hash
    }

    fn compute_hash(&mut self, id: NodeId) -> B256 {
        match &self.nodes[id] {
            Node::Empty { level, index } => empty_hash(&self.nonce, index, *level),
            Node::Leaf {
                level,
                index,
                commitment,
                ..
            } => leaf_hash(&self.nonce, index.as_slice(), *level, &commitment.value),
            Node::Interior {
                left,
                right,
                left_hash,
                right_hash,
                ..
            } => {
                let (left, right) = (*left, *right);
                let (cached_left, cached_right) = (*left_hash, *right_hash);
                let lh = match cached_left {
                    Some(hash) => hash,
                    None => self.compute_hash(left),
                };
                let rh = match cached_right {
                    Some(hash) => hash,
                    None => self.compute_hash(right),
                };
                if let Node::Interior {
                    left_hash,
                    right_hash,
                    ..
                } = &mut self.nodes[id]
                {
                    *left_hash = Some(lh);
                    *right_hash = Some(rh);
                }
                interior_hash(&lh, &rh)
            }
        }
    }

    /// Extracts an inclusion-or-absence proof for `lookup_index`.
    ///
    /// The walk records the sibling hash at every interior node it
    /// passes and terminates at a leaf or an empty branch:
    ///
    /// - a leaf whose index equals `lookup_index` proves inclusion and
    ///   carries the stored value and full commitment;
    /// - a leaf with a different index proves absence by prefix
    ///   collision; its value and commitment salt are withheld so the
    ///   colliding entry stays private;
    /// - an empty branch proves absence outright.
    pub fn get(&mut self, lookup_index: B256) -> Result<AuthenticationPath, TreeError> {
        // Populate every cache on the path before extracting siblings.
        self.root_hash();

        let mut pruned_tree = Vec::new();
        let mut cursor: NodeId = ROOT;
        let mut depth: usize = 0;
        loop {
            match &self.nodes[cursor] {
                Node::Interior {
                    left,
                    right,
                    left_hash,
                    right_hash,
                    ..
                } => {
                    if depth >= INDEX_BITS {
                        return Err(TreeError::InvalidTree("lookup index exhausted"));
                    }
                    let (next, sibling) = if bit_at(lookup_index.as_slice(), depth) {
                        (*right, *left_hash)
                    } else {
                        (*left, *right_hash)
                    };
                    pruned_tree.push(
                        sibling
                            .ok_or(TreeError::InvalidTree("sibling hash missing after finalize"))?,
                    );
                    cursor = next;
                    depth += 1;
                }
                Node::Empty { level, index } => {
                    return Ok(AuthenticationPath {
                        tree_nonce: self.nonce,
                        lookup_index,
                        pruned_tree,
                        leaf: ProofNode {
                            level: *level,
                            index: index.clone(),
                            value: None,
                            is_empty: true,
                            commitment: None,
                        },
                    });
                }
                Node::Leaf {
                    level,
                    index,
                    value,
                    commitment,
                } => {
                    let mut leaf = ProofNode {
                        level: *level,
                        index: index.as_slice().to_vec(),
                        value: Some(value.clone()),
                        is_empty: false,
                        commitment: Some(LeafCommitment {
                            salt: Some(commitment.salt),
                            value: commitment.value,
                        }),
                    };
                    if *index != lookup_index {
                        // A different entry shares the traversed prefix.
                        // Its leaf hash is still needed to rebuild the
                        // root, but the entry itself stays hidden.
                        leaf.value = None;
                        if let Some(leaf_commitment) = leaf.commitment.as_mut() {
                            leaf_commitment.salt = None;
                        }
                    }
                    return Ok(AuthenticationPath {
                        tree_nonce: self.nonce,
                        lookup_index,
                        pruned_tree,
                        leaf,
                    });
                }
            }
        }
    }
}
