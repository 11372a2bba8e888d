//! The Merkle prefix tree that authenticates the recorded key-value
//! pairs: a sparse binary trie addressed by the bits of a fixed-width
//! lookup index, with domain-separated hashing, lazily recomputed node
//! hashes, and a deterministic, self-verifying binary serialization.

use crate::crypto::EntropyError;
use alloy_primitives::B256;
use std::io;
use thiserror::Error;

pub(crate) mod bits;
pub mod codec;
pub(crate) mod node;
pub mod proof;
#[allow(clippy::module_inception)]
pub mod tree;

pub use proof::{AuthenticationPath, ProofError, ProofNode, ProofType};
pub use tree::MerkleTree;

/// Error type for tree construction, mutation and (de)serialization.
#[derive(Debug, Error)]
pub enum TreeError {
    /// A structural invariant was violated during traversal. This is a
    /// bug or corrupted in-memory state, not an input defect.
    #[error("invalid tree: {0}")]
    InvalidTree(&'static str),
    /// Fresh randomness could not be drawn for a nonce or a commitment.
    #[error(transparent)]
    Entropy(#[from] EntropyError),
    /// The destination stream rejected part of the serialization.
    #[error("tree serialization failed")]
    Write(#[source] io::Error),
    /// The source stream ended early or failed mid-read.
    #[error("tree deserialization failed")]
    Read(#[source] io::Error),
    /// A node record started with an unrecognized tag byte.
    #[error("unknown node tag {tag:#04x}")]
    UnknownTag { tag: u8 },
    /// A length prefix promised more bytes than the stream holds.
    #[error("length prefix expects {expected} bytes, stream holds {got}")]
    Truncated { expected: u64, got: u64 },
    /// A parsed field had an impossible shape for its position.
    #[error("malformed node stream: {0}")]
    MalformedStream(&'static str),
    /// The root hash recomputed after loading disagrees with the stored
    /// one; the loaded tree is discarded.
    #[error("root hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch { stored: B256, computed: B256 },
}
