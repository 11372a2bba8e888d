//! The verifier: checks proofs against a public bundle alone, with no
//! access to the recorded dataset or any private key.

use crate::crypto::vrf;
use crate::pad::{Proof, Public};
use crate::tree::{ProofError, ProofType};
use alloy_primitives::B256;

/// Verifies inclusion and absence proofs against the commitment
/// published by a recorder.
#[derive(Clone, Debug)]
pub struct Verifier {
    vrf_key: vrf::PublicKey,
    tree_hash: B256,
}

impl Verifier {
    /// Builds a verifier from the bundle returned by a prover's or
    /// recorder's `public()`.
    pub fn new(public: &Public) -> Result<Self, ProofError> {
        let vrf_key = vrf::PublicKey::from_bytes(public.verification_key())?;
        Ok(Self {
            vrf_key,
            tree_hash: public.tree_hash(),
        })
    }

    /// Checks that `key` is recorded with exactly `value`.
    pub fn verify_inclusion(
        &self,
        proof: &Proof,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), ProofError> {
        self.verify(proof, key, value, ProofType::Inclusion)
    }

    /// Checks that `key` is absent from the recorded dataset.
    pub fn verify_exclusion(
        &self,
        proof: &Proof,
        key: &[u8],
        value: &[u8],
    ) -> Result<(), ProofError> {
        self.verify(proof, key, value, ProofType::Exclusion)
    }

    fn verify(
        &self,
        proof: &Proof,
        key: &[u8],
        value: &[u8],
        expected: ProofType,
    ) -> Result<(), ProofError> {
        let path = proof.path();
        if path.proof_type() != expected {
            return Err(ProofError::TypeMismatch);
        }
        // The VRF proof pins the lookup index to the queried key; without
        // this check a prover could answer for a different key entirely.
        let index = self.vrf_key.verify(key, proof.vrf_proof())?;
        if index != path.lookup_index {
            return Err(ProofError::IndexMismatch);
        }
        path.verify(key, value, &self.tree_hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prover::Prover;
    use crate::recorder::Recorder;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup() -> (Prover, Verifier) {
        let mut recorder = Recorder::generate_with(&mut ChaCha20Rng::seed_from_u64(99)).unwrap();
        for i in 0u32..8 {
            recorder
                .insert(format!("key{i}").as_bytes(), format!("value{i}").as_bytes())
                .unwrap();
        }
        let mut prover = Prover::from_recorder(&recorder);
        let public = prover.public();
        let verifier = Verifier::new(&public).unwrap();
        (prover, verifier)
    }

    #[test]
    fn test_inclusion_and_exclusion() {
        let (mut prover, verifier) = setup();
        for i in 0u32..8 {
            let key = format!("key{i}");
            let value = format!("value{i}");
            let proof = prover.get(key.as_bytes()).unwrap();
            verifier
                .verify_inclusion(&proof, key.as_bytes(), value.as_bytes())
                .unwrap();
        }
        for i in 9u32..16 {
            let key = format!("key{i}");
            let proof = prover.get(key.as_bytes()).unwrap();
            verifier
                .verify_exclusion(&proof, key.as_bytes(), b"")
                .unwrap();
        }
    }

    #[test]
    fn test_proof_type_mismatch() {
        let (mut prover, verifier) = setup();
        let present = prover.get(b"key0").unwrap();
        assert!(matches!(
            verifier.verify_exclusion(&present, b"key0", b"value0"),
            Err(ProofError::TypeMismatch)
        ));
        let absent = prover.get(b"missing").unwrap();
        assert!(matches!(
            verifier.verify_inclusion(&absent, b"missing", b""),
            Err(ProofError::TypeMismatch)
        ));
    }

    #[test]
    fn test_wrong_value_rejected() {
        let (mut prover, verifier) = setup();
        let proof = prover.get(b"key0").unwrap();
        assert!(matches!(
            verifier.verify_inclusion(&proof, b"key0", b"forged"),
            Err(ProofError::CommitmentMismatch)
        ));
    }

    #[test]
    fn test_proof_does_not_transfer_between_keys() {
        let (mut prover, verifier) = setup();
        // Reusing key0's proof material for key1 must trip the VRF
        // check, whatever the path itself says.
        let proof = prover.get(b"key0").unwrap();
        assert!(verifier.verify_inclusion(&proof, b"key1", b"value1").is_err());
    }

    #[test]
    fn test_tampered_vrf_proof_rejected() {
        let (mut prover, verifier) = setup();
        let mut proof = prover.get(b"key0").unwrap();
        proof.corrupt_vrf_proof();
        assert!(matches!(
            verifier.verify_inclusion(&proof, b"key0", b"value0"),
            Err(ProofError::Vrf(_))
        ));
    }

    #[test]
    fn test_verifier_from_foreign_bundle_rejects() {
        let (mut prover, _) = setup();
        let mut other_recorder =
            Recorder::generate_with(&mut ChaCha20Rng::seed_from_u64(1000)).unwrap();
        other_recorder.insert(b"key0", b"value0").unwrap();
        let foreign = Verifier::new(&other_recorder.public()).unwrap();

        let proof = prover.get(b"key0").unwrap();
        assert!(foreign.verify_inclusion(&proof, b"key0", b"value0").is_err());
    }
}
