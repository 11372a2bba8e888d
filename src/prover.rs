//! The prover: the finalized, proof-issuing view over a recorded
//! dataset. A recorder accumulates entries; a prover answers queries
//! about the snapshot it was built from.

use crate::pad::{Pad, Proof, Public};
use crate::recorder::{validate_version, write_version, Recorder, RecorderError};
use crate::tree::TreeError;
use std::io::{Read, Write};

/// Issues inclusion and absence proofs over a loaded dataset snapshot.
#[derive(Clone, Debug)]
pub struct Prover {
    pad: Pad,
}

impl Prover {
    /// Loads a prover from a stream written by [`Recorder::write_internal`]
    /// or [`Prover::write_internal`] plus the externally stored private
    /// key bytes.
    pub fn from_reader<R: Read>(reader: &mut R, private: &[u8]) -> Result<Self, RecorderError> {
        validate_version(reader)?;
        let vrf_key = crate::crypto::vrf::PrivateKey::from_bytes(private)?;
        Ok(Self {
            pad: Pad::from_reader(reader, vrf_key)?,
        })
    }

    /// Builds a prover from a live recorder, deep-copying its state so
    /// that later inserts into the recorder leave this snapshot intact.
    pub fn from_recorder(recorder: &Recorder) -> Self {
        Self {
            pad: recorder.pad().clone(),
        }
    }

    /// Produces a proof of inclusion or absence for `key`.
    pub fn get(&mut self, key: &[u8]) -> Result<Proof, TreeError> {
        self.pad.get(key)
    }

    /// The public bundle matching the proofs this prover issues.
    pub fn public(&mut self) -> Public {
        self.pad.public()
    }

    /// The VRF private key bytes, for storage outside the container.
    pub fn private(&self) -> [u8; crate::crypto::vrf::PRIVATE_KEY_SIZE] {
        self.pad.private()
    }

    /// Serializes the snapshot in the same container format a recorder
    /// writes, so the two serializations are interchangeable.
    pub fn write_internal<W: Write>(&mut self, writer: &mut W) -> Result<(), RecorderError> {
        write_version(writer)?;
        Ok(self.pad.write_internal(writer)?)
    }
}
