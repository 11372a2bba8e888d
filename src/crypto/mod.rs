//! Cryptographic primitives: the domain digest, salted commitments, and
//! the VRF that blinds user keys into tree positions.

pub mod commitment;
pub mod digest;
pub mod vrf;

pub use commitment::Commitment;
pub use digest::{digest, make_rand, make_rand_with, EntropyError};
