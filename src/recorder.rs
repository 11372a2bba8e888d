//! The recorder: the ingestion-phase facade over a [`Pad`], framed on
//! disk by a one-byte container version.

use crate::constant::FORMAT_VERSION;
use crate::crypto::vrf;
use crate::pad::{Pad, Public};
use crate::tree::TreeError;
use rand::{CryptoRng, RngCore};
use std::io::{Read, Write};
use thiserror::Error;

/// Error type for building, loading and storing recorders.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The stream's leading version byte is not one this build reads.
    #[error("unsupported container version {found:#04x}")]
    UnsupportedVersion { found: u8 },
    /// The supplied private key bytes did not parse.
    #[error(transparent)]
    Key(#[from] vrf::VrfError),
    /// The underlying tree failed to build, load or store.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The container framing itself could not be read or written.
    #[error("container framing failed")]
    Io(#[source] std::io::Error),
}

/// Records opaque key-value pairs into a [`Pad`] and commits to the
/// whole dataset through [`Recorder::public`].
#[derive(Clone, Debug)]
pub struct Recorder {
    pad: Pad,
}

impl Recorder {
    /// Creates an empty recorder with a VRF key drawn from the OS CSPRNG.
    pub fn new() -> Result<Self, RecorderError> {
        Ok(Self {
            pad: Pad::new_empty(vrf::PrivateKey::generate())?,
        })
    }

    /// Creates an empty recorder with a VRF key drawn from `rng`.
    /// Deterministic generators make recorders reproducible in tests.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, RecorderError> {
        Ok(Self {
            pad: Pad::new_empty(vrf::PrivateKey::generate_with(rng))?,
        })
    }

    /// Loads a recorder serialized with [`Recorder::write_internal`].
    /// `private` is the VRF key returned by [`Recorder::private`]; it is
    /// stored outside the stream.
    pub fn from_reader<R: Read>(reader: &mut R, private: &[u8]) -> Result<Self, RecorderError> {
        validate_version(reader)?;
        let vrf_key = vrf::PrivateKey::from_bytes(private)?;
        Ok(Self {
            pad: Pad::from_reader(reader, vrf_key)?,
        })
    }

    /// Records `value` under `key`. Re-recording a key replaces its
    /// value.
    pub fn insert(&mut self, key: &[u8], value: &[u8]) -> Result<(), RecorderError> {
        Ok(self.pad.insert(key, value)?)
    }

    /// The public bundle a verifier needs to check proofs over the
    /// recorded dataset.
    pub fn public(&mut self) -> Public {
        self.pad.public()
    }

    /// The VRF private key bytes, for storage outside the container.
    pub fn private(&self) -> [u8; vrf::PRIVATE_KEY_SIZE] {
        self.pad.private()
    }

    /// Serializes the recorder: the container version byte followed by
    /// the dictionary's tree.
    pub fn write_internal<W: Write>(&mut self, writer: &mut W) -> Result<(), RecorderError> {
        write_version(writer)?;
        Ok(self.pad.write_internal(writer)?)
    }

    pub(crate) fn pad(&self) -> &Pad {
        &self.pad
    }

    /// Proof issuance for tests; production callers go through a
    /// [`crate::Prover`].
    #[cfg(test)]
    pub(crate) fn get(&mut self, key: &[u8]) -> Result<crate::pad::Proof, RecorderError> {
        Ok(self.pad.get(key)?)
    }
}

pub(crate) fn write_version<W: Write>(writer: &mut W) -> Result<(), RecorderError> {
    writer
        .write_all(&[FORMAT_VERSION])
        .map_err(RecorderError::Io)
}

pub(crate) fn validate_version<R: Read>(reader: &mut R) -> Result<(), RecorderError> {
    let mut version = [0u8; 1];
    reader.read_exact(&mut version).map_err(RecorderError::Io)?;
    if version[0] != FORMAT_VERSION {
        return Err(RecorderError::UnsupportedVersion { found: version[0] });
    }
    tracing::debug!(version = version[0], "loading recorder container");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ProofType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn test_recorder() -> Recorder {
        Recorder::generate_with(&mut ChaCha20Rng::seed_from_u64(77)).unwrap()
    }

    #[test]
    fn test_version_byte_leads_the_stream() {
        let mut recorder = test_recorder();
        recorder.insert(b"key", b"value").unwrap();
        let mut buf = Vec::new();
        recorder.write_internal(&mut buf).unwrap();
        assert_eq!(buf[0], FORMAT_VERSION);
    }

    #[test]
    fn test_bad_version_rejected() {
        let mut recorder = test_recorder();
        let mut buf = Vec::new();
        recorder.write_internal(&mut buf).unwrap();
        buf[0] = 0x02;
        let private = recorder.private();
        assert!(matches!(
            Recorder::from_reader(&mut buf.as_slice(), &private),
            Err(RecorderError::UnsupportedVersion { found: 0x02 })
        ));
    }

    #[test]
    fn test_roundtrip_preserves_everything() {
        let mut recorder = test_recorder();
        for i in 0u32..10 {
            recorder
                .insert(format!("key{i}").as_bytes(), format!("value{i}").as_bytes())
                .unwrap();
        }
        let mut first = Vec::new();
        recorder.write_internal(&mut first).unwrap();

        let private = recorder.private();
        let mut reloaded = Recorder::from_reader(&mut first.as_slice(), &private).unwrap();
        assert_eq!(reloaded.public(), recorder.public());

        let mut second = Vec::new();
        reloaded.write_internal(&mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_inserted_keys_are_provable() {
        let mut recorder = test_recorder();
        recorder.insert(b"present", b"payload").unwrap();
        let proof = recorder.get(b"present").unwrap();
        assert_eq!(proof.path().proof_type(), ProofType::Inclusion);
        let absent = recorder.get(b"missing").unwrap();
        assert_eq!(absent.path().proof_type(), ProofType::Exclusion);
    }

    #[test]
    fn test_empty_stream_rejected() {
        let private = test_recorder().private();
        assert!(matches!(
            Recorder::from_reader(&mut std::io::empty(), &private),
            Err(RecorderError::Io(_))
        ));
    }
}
