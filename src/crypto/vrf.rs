//! Verifiable random function over sr25519.
//!
//! The recorder maps every user key to its tree position through a VRF so
//! that positions stay pseudo-random and unpredictable to anyone without
//! the private key, while remaining provable to anyone with the public
//! key. Outputs are fixed at [`HASH_SIZE`] bytes and feed the tree as
//! lookup indices.

use crate::constant::HASH_SIZE;
use alloy_primitives::B256;
use once_cell::sync::Lazy;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use schnorrkel::{
    context::SigningContext,
    keys::{ExpansionMode, Keypair, MiniSecretKey},
    signing_context,
    vrf::{VRFPreOut, VRFProof},
};
use thiserror::Error;

/// Width of a serialized private key (the mini secret seed).
pub const PRIVATE_KEY_SIZE: usize = 32;

/// Width of a serialized public key.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Width of the transportable proof material: the 32-byte pre-output
/// followed by the 64-byte DLEQ proof.
pub const PROOF_SIZE: usize = PREOUT_SIZE + DLEQ_SIZE;

const PREOUT_SIZE: usize = 32;
const DLEQ_SIZE: usize = 64;

/// Transcript label binding evaluations to this tree's index derivation.
static INDEX_CONTEXT: Lazy<SigningContext> = Lazy::new(|| signing_context(b"veritree/vrf/index"));

/// Label under which the shared VRF point is squeezed into index bytes.
const OUTPUT_LABEL: &[u8] = b"index";

/// VRF evaluation and proving key.
#[derive(Clone)]
pub struct PrivateKey {
    seed: [u8; PRIVATE_KEY_SIZE],
    keypair: Keypair,
}

/// VRF verification key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey(schnorrkel::PublicKey);

/// A VRF key or proof failed to parse or verify.
#[derive(Debug, Error)]
pub enum VrfError {
    /// Key bytes had the wrong length or were not a valid key.
    #[error("malformed VRF key")]
    MalformedKey,
    /// Proof bytes had the wrong length or were not a valid proof.
    #[error("malformed VRF proof")]
    MalformedProof,
    /// The proof does not check out under this public key and message.
    #[error("VRF proof rejected")]
    Rejected,
}

impl PrivateKey {
    /// Generates a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut OsRng)
    }

    /// Generates a key from the supplied generator. Tests pass a seeded
    /// generator here to obtain stable keys.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        let mini = MiniSecretKey::generate_with(rng);
        Self::from_mini(mini)
    }

    /// Reconstructs a key from the bytes returned by [`PrivateKey::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VrfError> {
        let mini = MiniSecretKey::from_bytes(bytes).map_err(|_| VrfError::MalformedKey)?;
        Ok(Self::from_mini(mini))
    }

    fn from_mini(mini: MiniSecretKey) -> Self {
        Self {
            seed: mini.to_bytes(),
            keypair: mini.expand_to_keypair(ExpansionMode::Ed25519),
        }
    }

    /// Returns the seed bytes this key can be reconstructed from.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.seed
    }

    /// Derives the matching verification key.
    pub fn public(&self) -> PublicKey {
        PublicKey(self.keypair.public)
    }

    /// Evaluates the VRF on `msg` without producing a proof.
    pub fn index(&self, msg: &[u8]) -> B256 {
        let (io, _, _) = self.keypair.vrf_sign(INDEX_CONTEXT.bytes(msg));
        B256::from(io.make_bytes::<[u8; HASH_SIZE]>(OUTPUT_LABEL))
    }

    /// Evaluates the VRF on `msg` and returns the index together with a
    /// proof a third party can check with the public key.
    pub fn prove(&self, msg: &[u8]) -> (B256, Vec<u8>) {
        let (io, dleq, _) = self.keypair.vrf_sign(INDEX_CONTEXT.bytes(msg));
        let index = B256::from(io.make_bytes::<[u8; HASH_SIZE]>(OUTPUT_LABEL));

        let mut proof = Vec::with_capacity(PROOF_SIZE);
        proof.extend_from_slice(&io.to_preout().to_bytes());
        proof.extend_from_slice(&dleq.to_bytes());
        (index, proof)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the seed.
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

impl PublicKey {
    /// Parses a verification key from its serialized bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VrfError> {
        schnorrkel::PublicKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| VrfError::MalformedKey)
    }

    /// Returns the serialized verification key.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    /// Checks `proof` against `msg` and returns the asserted index iff it
    /// is consistent with this key.
    pub fn verify(&self, msg: &[u8], proof: &[u8]) -> Result<B256, VrfError> {
        if proof.len() != PROOF_SIZE {
            return Err(VrfError::MalformedProof);
        }
        let preout =
            VRFPreOut::from_bytes(&proof[..PREOUT_SIZE]).map_err(|_| VrfError::MalformedProof)?;
        let dleq =
            VRFProof::from_bytes(&proof[PREOUT_SIZE..]).map_err(|_| VrfError::MalformedProof)?;

        let (io, _) = self
            .0
            .vrf_verify(INDEX_CONTEXT.bytes(msg), &preout, &dleq)
            .map_err(|_| VrfError::Rejected)?;
        Ok(B256::from(io.make_bytes::<[u8; HASH_SIZE]>(OUTPUT_LABEL)))
    }
}
