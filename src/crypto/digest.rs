//! SHAKE-128 digest and blinded randomness.
//!
//! [`digest`] concatenates its parts with no length framing; callers that
//! need unambiguous preimages must add their own domain tags and
//! fixed-width fields, which the tree hashing layer does.

use crate::constant::HASH_SIZE;
use alloy_primitives::B256;
use rand::{rngs::OsRng, CryptoRng, RngCore};
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake128,
};
use thiserror::Error;

/// The process CSPRNG could not produce fresh bytes.
#[derive(Debug, Error)]
#[error("system entropy unavailable")]
pub struct EntropyError(#[from] rand::Error);

/// Hashes all passed byte slices into a fixed-width digest.
pub fn digest(parts: &[&[u8]]) -> B256 {
    let mut hasher = Shake128::default();
    for part in parts {
        hasher.update(part);
    }
    let mut out = B256::ZERO;
    hasher.finalize_xof().read(out.as_mut_slice());
    out
}

/// Draws a fresh random digest from the OS CSPRNG.
///
/// The raw CSPRNG reading is hashed before it is returned so that bytes
/// from the system generator never appear on the wire, even if the
/// generator turns out to be more predictable than advertised.
pub fn make_rand() -> Result<B256, EntropyError> {
    make_rand_with(&mut OsRng)
}

/// Same as [`make_rand`] but drawing from the supplied generator.
pub fn make_rand_with<R: RngCore + CryptoRng>(rng: &mut R) -> Result<B256, EntropyError> {
    let mut raw = [0u8; HASH_SIZE];
    rng.try_fill_bytes(&mut raw)?;
    Ok(digest(&[&raw]))
}
