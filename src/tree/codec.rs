//! Deterministic binary serialization of the tree.
//!
//! Layout: `nonce (32)` | `root hash (32)` | pre-order node stream. Each
//! node record starts with a one-byte tag and a little-endian `u32`
//! level; empty branches and leaves follow with length-prefixed fields
//! (8-byte little-endian lengths), and leaves additionally carry their
//! commitment salt at fixed width. The stored root hash is recomputed on
//! load and the stream rejected on disagreement.

use super::node::{Node, NodeId, ROOT};
use super::tree::MerkleTree;
use super::TreeError;
use crate::constant::{EMPTY_BRANCH_TAG, HASH_SIZE, INDEX_BITS, INTERIOR_TAG, LEAF_TAG};
use crate::crypto::Commitment;
use alloy_primitives::B256;
use std::io::{Read, Write};

impl MerkleTree {
    /// Serializes the tree. The hash caches are finalized first so the
    /// emitted root hash matches the node stream.
    pub fn write_internal<W: Write>(&mut self, writer: &mut W) -> Result<(), TreeError> {
        let root_hash = self.root_hash();
        write_bytes(writer, self.nonce.as_slice())?;
        write_bytes(writer, root_hash.as_slice())?;
        self.write_node(ROOT, writer)
    }

    fn write_node<W: Write>(&self, id: NodeId, writer: &mut W) -> Result<(), TreeError> {
        match &self.nodes[id] {
            Node::Empty { level, index } => {
                write_bytes(writer, &[EMPTY_BRANCH_TAG])?;
                write_bytes(writer, &level.to_le_bytes())?;
                write_len_prefixed(writer, index)
            }
            Node::Interior {
                level, left, right, ..
            } => {
                write_bytes(writer, &[INTERIOR_TAG])?;
                write_bytes(writer, &level.to_le_bytes())?;
                self.write_node(*left, writer)?;
                self.write_node(*right, writer)
            }
            Node::Leaf {
                level,
                index,
                value,
                commitment,
            } => {
                write_bytes(writer, &[LEAF_TAG])?;
                write_bytes(writer, &level.to_le_bytes())?;
                write_len_prefixed(writer, index.as_slice())?;
                write_len_prefixed(writer, value)?;
                write_bytes(writer, commitment.salt.as_slice())?;
                write_len_prefixed(writer, commitment.value.as_slice())
            }
        }
    }

    /// Loads a tree serialized by [`MerkleTree::write_internal`],
    /// recomputing the root hash and failing if it disagrees with the
    /// stored one.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, TreeError> {
        let nonce = read_b256(reader)?;
        let stored = read_b256(reader)?;

        let mut nodes = Vec::new();
        read_node(reader, &mut nodes, 0)?;
        if !matches!(nodes[ROOT], Node::Interior { .. }) {
            return Err(TreeError::MalformedStream("root is not an interior node"));
        }

        let mut tree = MerkleTree {
            nonce,
            nodes,
            hash: None,
        };
        let computed = tree.root_hash();
        if computed != stored {
            tracing::debug!(%stored, %computed, "discarding tree with mismatched root hash");
            return Err(TreeError::HashMismatch { stored, computed });
        }
        Ok(tree)
    }
}

fn read_node<R: Read>(
    reader: &mut R,
    nodes: &mut Vec<Node>,
    depth: usize,
) -> Result<NodeId, TreeError> {
    if depth > INDEX_BITS {
        return Err(TreeError::MalformedStream(
            "node stream deeper than the index width",
        ));
    }
    let tag = read_u8(reader)?;
    let level = read_u32(reader)?;
    // Levels are redundant with the node's position in the pre-order
    // stream; interior levels are not covered by any hash, so this is
    // the only check that catches tampering with them.
    if level as usize != depth {
        return Err(TreeError::MalformedStream(
            "node level does not match its stream depth",
        ));
    }
    match tag {
        EMPTY_BRANCH_TAG => {
            let index = read_len_prefixed(reader)?;
            nodes.push(Node::Empty { level, index });
            Ok(nodes.len() - 1)
        }
        INTERIOR_TAG => {
            let id = nodes.len();
            nodes.push(Node::Interior {
                level,
                left: 0,
                right: 0,
                left_hash: None,
                right_hash: None,
            });
            let left = read_node(reader, nodes, depth + 1)?;
            let right = read_node(reader, nodes, depth + 1)?;
            if let Node::Interior {
                left: left_slot,
                right: right_slot,
                ..
            } = &mut nodes[id]
            {
                *left_slot = left;
                *right_slot = right;
            }
            Ok(id)
        }
        LEAF_TAG => {
            let index = read_len_prefixed(reader)?;
            if index.len() != HASH_SIZE {
                return Err(TreeError::MalformedStream("leaf index has the wrong width"));
            }
            let value = read_len_prefixed(reader)?;
            let salt = read_b256(reader)?;
            let commitment_value = read_len_prefixed(reader)?;
            if commitment_value.len() != HASH_SIZE {
                return Err(TreeError::MalformedStream(
                    "commitment value has the wrong width",
                ));
            }
            nodes.push(Node::Leaf {
                level,
                index: B256::from_slice(&index),
                value,
                commitment: Commitment {
                    salt,
                    value: B256::from_slice(&commitment_value),
                },
            });
            Ok(nodes.len() - 1)
        }
        tag => Err(TreeError::UnknownTag { tag }),
    }
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<(), TreeError> {
    writer.write_all(bytes).map_err(TreeError::Write)
}

fn write_len_prefixed<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<(), TreeError> {
    write_bytes(writer, &(bytes.len() as u64).to_le_bytes())?;
    write_bytes(writer, bytes)
}

fn read_u8<R: Read>(reader: &mut R) -> Result<u8, TreeError> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf).map_err(TreeError::Read)?;
    Ok(buf[0])
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32, TreeError> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(TreeError::Read)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_b256<R: Read>(reader: &mut R) -> Result<B256, TreeError> {
    let mut buf = B256::ZERO;
    reader
        .read_exact(buf.as_mut_slice())
        .map_err(TreeError::Read)?;
    Ok(buf)
}

/// Reads an 8-byte length prefix followed by that many bytes. The buffer
/// grows with the stream rather than with the prefix, so a corrupt
/// length cannot force a huge allocation.
fn read_len_prefixed<R: Read>(reader: &mut R) -> Result<Vec<u8>, TreeError> {
    let mut len_bytes = [0u8; 8];
    reader.read_exact(&mut len_bytes).map_err(TreeError::Read)?;
    let expected = u64::from_le_bytes(len_bytes);

    let mut buf = Vec::new();
    let got = reader
        .by_ref()
        .take(expected)
        .read_to_end(&mut buf)
        .map_err(TreeError::Read)? as u64;
    if got != expected {
        return Err(TreeError::Truncated { expected, got });
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(byte: u8) -> B256 {
        let mut out = B256::ZERO;
        out.0[0] = byte;
        out
    }

    fn serialized(tree: &mut MerkleTree) -> Vec<u8> {
        let mut buf = Vec::new();
        tree.write_internal(&mut buf).unwrap();
        buf
    }

    fn populated_tree() -> MerkleTree {
        let mut tree = MerkleTree::new_empty().unwrap();
        for i in 0u8..10 {
            tree.set(
                index(i.wrapping_mul(37)),
                format!("key{i}").as_bytes(),
                format!("value{i}").as_bytes(),
            )
            .unwrap();
        }
        tree
    }

    #[test]
    fn test_roundtrip_is_byte_identical() {
        let mut tree = populated_tree();
        let first = serialized(&mut tree);

        let mut reloaded = MerkleTree::from_reader(&mut first.as_slice()).unwrap();
        assert_eq!(reloaded.root_hash(), tree.root_hash());
        assert_eq!(reloaded.nonce(), tree.nonce());

        let second = serialized(&mut reloaded);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_tree_roundtrip() {
        let mut tree = MerkleTree::new_empty().unwrap();
        let bytes = serialized(&mut tree);
        let mut reloaded = MerkleTree::from_reader(&mut bytes.as_slice()).unwrap();
        assert_eq!(reloaded.root_hash(), tree.root_hash());
    }

    #[test]
    fn test_proofs_survive_reload() {
        let mut tree = populated_tree();
        let bytes = serialized(&mut tree);
        let mut reloaded = MerkleTree::from_reader(&mut bytes.as_slice()).unwrap();
        let root = reloaded.root_hash();

        for i in 0u8..10 {
            let path = reloaded.get(index(i.wrapping_mul(37))).unwrap();
            path.verify(
                format!("key{i}").as_bytes(),
                format!("value{i}").as_bytes(),
                &root,
            )
            .unwrap();
        }
    }

    #[test]
    fn test_every_flip_in_empty_tree_detected() {
        // An empty tree's serialization consists solely of authenticated
        // material (nonce, stored hash, tags, levels, prefix indices),
        // so any single bit flip must fail the load.
        let mut tree = MerkleTree::new_empty().unwrap();
        let bytes = serialized(&mut tree);
        for position in 0..bytes.len() {
            for bit in 0..8 {
                let mut corrupted = bytes.clone();
                corrupted[position] ^= 1 << bit;
                assert!(
                    MerkleTree::from_reader(&mut corrupted.as_slice()).is_err(),
                    "flip at byte {position} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn test_tampered_commitment_detected() {
        let mut tree = populated_tree();
        let bytes = serialized(&mut tree);
        // The commitment value is the trailing field of a leaf record.
        let mut corrupted = bytes.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0x01;
        assert!(matches!(
            MerkleTree::from_reader(&mut corrupted.as_slice()),
            Err(TreeError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_tampered_stored_hash_detected() {
        let mut tree = populated_tree();
        let mut bytes = serialized(&mut tree);
        bytes[HASH_SIZE] ^= 0x80; // first byte of the stored root hash
        assert!(matches!(
            MerkleTree::from_reader(&mut bytes.as_slice()),
            Err(TreeError::HashMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let mut tree = populated_tree();
        let bytes = serialized(&mut tree);
        for cut in [1, HASH_SIZE, 2 * HASH_SIZE + 3, bytes.len() - 1] {
            assert!(MerkleTree::from_reader(&mut bytes[..cut].as_ref()).is_err());
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let mut tree = MerkleTree::new_empty().unwrap();
        let mut bytes = serialized(&mut tree);
        bytes[2 * HASH_SIZE] = b'X'; // the root's tag byte
        assert!(matches!(
            MerkleTree::from_reader(&mut bytes.as_slice()),
            Err(TreeError::UnknownTag { tag: b'X' })
        ));
    }

    #[test]
    fn test_oversized_length_prefix_rejected() {
        let mut tree = MerkleTree::new_empty().unwrap();
        let mut bytes = serialized(&mut tree);
        // The first empty node's index length prefix sits right after
        // the root record (tag + level) and its own tag + level.
        let offset = 2 * HASH_SIZE + 5 + 5;
        bytes[offset..offset + 8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(
            MerkleTree::from_reader(&mut bytes.as_slice()),
            Err(TreeError::Truncated { .. })
        ));
    }
}
