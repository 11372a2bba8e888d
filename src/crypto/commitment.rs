//! Salted commitments over caller-supplied byte strings.

use super::digest::{digest, make_rand, make_rand_with, EntropyError};
use alloy_primitives::B256;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// A hiding, binding commitment: `value = digest(salt, parts...)` with a
/// salt drawn fresh for every commitment. Two commitments to the same
/// parts are therefore never byte-equal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    /// Fresh random salt hashed in front of the committed parts.
    pub salt: B256,
    /// The digest binding the salt and the parts.
    pub value: B256,
}

impl Commitment {
    /// Commits to the passed byte slices with a salt from the OS CSPRNG.
    pub fn new(parts: &[&[u8]]) -> Result<Self, EntropyError> {
        Ok(Self::with_salt(make_rand()?, parts))
    }

    /// Same as [`Commitment::new`] but drawing the salt from the supplied
    /// generator.
    pub fn with_rng<R: RngCore + CryptoRng>(
        rng: &mut R,
        parts: &[&[u8]],
    ) -> Result<Self, EntropyError> {
        Ok(Self::with_salt(make_rand_with(rng)?, parts))
    }

    fn with_salt(salt: B256, parts: &[&[u8]]) -> Self {
        Self {
            value: Self::bind(&salt, parts),
            salt,
        }
    }

    /// Checks that this commitment was made to exactly `parts`.
    pub fn verify(&self, parts: &[&[u8]]) -> bool {
        self.value == Self::bind(&self.salt, parts)
    }

    /// Recomputes the commitment digest for a salt and parts.
    pub(crate) fn bind(salt: &B256, parts: &[&[u8]]) -> B256 {
        let mut all: Vec<&[u8]> = Vec::with_capacity(parts.len() + 1);
        all.push(salt.as_slice());
        all.extend_from_slice(parts);
        digest(&all)
    }
}
