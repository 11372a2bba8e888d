//! The persistent authenticated dictionary: a Merkle prefix tree whose
//! positions are derived from user keys through a VRF, so that the
//! location of a key inside the tree stays secret until a proof for it
//! is issued.

use crate::constant::HASH_SIZE;
use crate::crypto::vrf;
use crate::tree::{AuthenticationPath, MerkleTree, ProofError, TreeError};
use alloy_primitives::B256;
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// A dictionary binding user keys to values under a single short
/// commitment, with proofs of inclusion and absence.
#[derive(Clone, Debug)]
pub struct Pad {
    vrf_key: vrf::PrivateKey,
    tree: MerkleTree,
}

/// A combined proof: the tree's authentication path for the derived
/// index, plus the VRF proof that the index belongs to the queried key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    path: AuthenticationPath,
    vrf_proof: Vec<u8>,
}

impl Proof {
    /// The authentication path over the tree.
    pub fn path(&self) -> &AuthenticationPath {
        &self.path
    }

    /// The VRF proof tying the path's lookup index to the queried key.
    pub fn vrf_proof(&self) -> &[u8] {
        &self.vrf_proof
    }

    #[cfg(test)]
    pub(crate) fn corrupt_vrf_proof(&mut self) {
        self.vrf_proof[0] ^= 1;
    }
}

/// The public bytes a verifier needs: the tree root hash followed by the
/// VRF verification key.
#[derive(Clone, Debug, PartialEq, Eq, Deref, Serialize, Deserialize)]
pub struct Public(Vec<u8>);

impl Public {
    /// Wraps and validates a public bundle received from a prover.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ProofError> {
        if bytes.len() != HASH_SIZE + vrf::PUBLIC_KEY_SIZE {
            return Err(ProofError::Malformed("public bundle has the wrong width"));
        }
        Ok(Self(bytes))
    }

    /// The root hash of the authenticated tree.
    pub fn tree_hash(&self) -> B256 {
        B256::from_slice(&self.0[..HASH_SIZE])
    }

    /// The serialized VRF verification key.
    pub fn verification_key(&self) -> &[u8] {
        &self.0[HASH_SIZE..]
    }
}

impl Pad {
    /// Creates an empty dictionary owning `vrf_key`.
    pub fn new_empty(vrf_key: vrf::PrivateKey) -> Result<Self, TreeError> {
        Ok(Self {
            vrf_key,
            tree: MerkleTree::new_empty()?,
        })
    }

    /// Loads a dictionary whose tree was serialized with
    /// [`Pad::write_internal`]. The VRF key is supplied out of band; it
    /// is never part of the stream.
    pub fn from_reader<R: Read>(reader: &mut R, vrf_key: vrf::PrivateKey) -> Result<Self, TreeError> {
        Ok(Self {
            vrf_key,
            tree: MerkleTree::from_reader(reader)?,
        })
    }

    /// Serializes the tree. The VRF key is deliberately left out; key
    /// storage policy belongs to the caller.
    pub fn write_internal<W: Write>(&mut self, writer: &mut W) -> Result<(), TreeError> {
        self.tree.write_internal(writer)
    }

    /// The private index the dictionary files `key` under.
    pub fn index(&self, key: &[u8]) -> B256 {
        self.vrf_key.index(key)
    }

    /// Binds `key` to `value` at the key's private index. A repeated
    /// insert replaces the previous value under a fresh commitment.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), TreeError> {
        tracing::trace!(key_len = key.len(), value_len = value.len(), "inserting entry");
        self.tree.set(self.vrf_key.index(key), key, value)
    }

    /// Produces a proof of inclusion or absence for `key`.
    pub fn get(&mut self, key: &[u8]) -> Result<Proof, TreeError> {
        let (lookup_index, vrf_proof) = self.vrf_key.prove(key);
        let path = self.tree.get(lookup_index)?;
        Ok(Proof { path, vrf_proof })
    }

    /// The current root hash of the underlying tree.
    pub fn root_hash(&mut self) -> B256 {
        self.tree.root_hash()
    }

    /// The public bundle for verifying proofs issued by this dictionary.
    pub fn public(&mut self) -> Public {
        let mut bytes = Vec::with_capacity(HASH_SIZE + vrf::PUBLIC_KEY_SIZE);
        bytes.extend_from_slice(self.root_hash().as_slice());
        bytes.extend_from_slice(&self.vrf_key.public().to_bytes());
        Public(bytes)
    }

    /// The VRF private key bytes, for external storage.
    pub fn private(&self) -> [u8; vrf::PRIVATE_KEY_SIZE] {
        self.vrf_key.to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ProofType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_pad() -> Pad {
        let key = vrf::PrivateKey::generate_with(&mut ChaCha20Rng::seed_from_u64(1234));
        Pad::new_empty(key).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut pad = test_pad();
        pad.insert(b"alpha", b"1").unwrap();
        pad.insert(b"beta", b"2").unwrap();

        let proof = pad.get(b"alpha").unwrap();
        assert_eq!(proof.path().proof_type(), ProofType::Inclusion);
        assert_eq!(proof.path().leaf.value.as_deref(), Some(&b"1"[..]));
        assert_eq!(proof.path().lookup_index, pad.index(b"alpha"));

        let absent = pad.get(b"gamma").unwrap();
        assert_eq!(absent.path().proof_type(), ProofType::Exclusion);
        assert!(absent.path().leaf.value.is_none());
    }

    #[test]
    fn test_public_bundle_splits() {
        let mut pad = test_pad();
        pad.insert(b"alpha", b"1").unwrap();
        let public = pad.public();
        assert_eq!(public.len(), HASH_SIZE + vrf::PUBLIC_KEY_SIZE);
        assert_eq!(public.tree_hash(), pad.root_hash());
        assert_eq!(public.verification_key(), pad.vrf_key.public().to_bytes());

        let reparsed = Public::from_bytes(public.to_vec()).unwrap();
        assert_eq!(reparsed, public);
        assert!(Public::from_bytes(vec![0u8; 5]).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut pad = test_pad();
        pad.insert(b"alpha", b"1").unwrap();
        let before = pad.root_hash();

        let mut cloned = pad.clone();
        cloned.insert(b"beta", b"2").unwrap();
        assert_ne!(cloned.root_hash(), before);
        assert_eq!(pad.root_hash(), before);
    }

    #[test]
    fn test_key_survives_reload() {
        let mut pad = test_pad();
        pad.insert(b"alpha", b"1").unwrap();
        let mut buf = Vec::new();
        pad.write_internal(&mut buf).unwrap();

        let restored_key = vrf::PrivateKey::from_bytes(&pad.private()).unwrap();
        let mut reloaded = Pad::from_reader(&mut buf.as_slice(), restored_key).unwrap();
        assert_eq!(reloaded.root_hash(), pad.root_hash());
        assert_eq!(reloaded.public(), pad.public());

        let proof = reloaded.get(b"alpha").unwrap();
        assert_eq!(proof.path().proof_type(), ProofType::Inclusion);
    }
}
