//! This crate implements a verifiable key-value recorder: it ingests
//! opaque key-value pairs, commits to the whole dataset with one short
//! hash, and later proves that any given key is bound to a specific
//! value or absent altogether. A third party holding only the public
//! commitment checks these proofs without ever seeing the dataset.
//! Typical use is attesting the contents of a training dataset or a
//! configuration snapshot.
//!
//! Internally the crate layers four components:
//!
//! - the `crypto` module provides the SHAKE-128 digest, salted
//!   commitments, and the VRF used to derive tree positions;
//! - the `tree` module implements a Merkle prefix tree: a sparse binary
//!   trie addressed by the bits of a 32-byte index, with per-tree nonce
//!   domain separation, lazily recomputed node hashes, and a
//!   deterministic, self-verifying serialization;
//! - the `pad` module binds the two into a persistent authenticated
//!   dictionary: user keys are mapped to tree indices through the VRF,
//!   so the physical position of a key stays hidden until a proof for
//!   it is issued, and every proof couples the tree's authentication
//!   path with the VRF proof for the index;
//! - the [`Recorder`] / [`Prover`] / [`Verifier`] facade splits the
//!   lifecycle: a recorder ingests entries and serializes a versioned
//!   container, a prover answers queries over a finalized snapshot, and
//!   a verifier checks proofs against the public bundle alone.
//!
//! Values are never hashed into the tree directly. Each leaf stores a
//! salted commitment to its key and value, so the recorded entries stay
//! hidden from anyone holding just the commitment, while a proof opens
//! exactly one entry. Two recorders over the same data still produce
//! different roots: the tree nonce and the per-leaf salts are drawn
//! fresh every time.
//!
//! Nothing here is safe for concurrent mutation; shard by recorder
//! instance if parallel ingestion is needed.

pub mod constant;
pub mod crypto;
pub mod pad;
pub mod prover;
pub mod recorder;
pub mod tree;
pub mod verifier;

pub use crypto::{vrf, Commitment};
pub use pad::{Pad, Proof, Public};
pub use prover::Prover;
pub use recorder::{Recorder, RecorderError};
pub use tree::{AuthenticationPath, MerkleTree, ProofError, ProofNode, ProofType, TreeError};
pub use verifier::Verifier;
