//! Verdict commitments for the commit-reveal protocol.
//!
//! A commitment is `SHA-256(verdict_code as 8-byte big-endian || nonce as UTF-8)`.
//! The nonce is whatever string the inspector chose; [`generate_nonce`] produces
//! 16 random bytes rendered as 32 lowercase hex characters.

use rand::RngCore;
use whistle_types::{CommitHash, Verdict};

use crate::hash::sha256;

/// Random bytes behind a generated nonce.
pub const NONCE_BYTES: usize = 16;

/// Compute the commitment an inspector publishes during the COMMIT phase.
pub fn commit_verdict(verdict: Verdict, nonce: &str) -> CommitHash {
    CommitHash::new(sha256(&[&verdict.code().to_be_bytes(), nonce.as_bytes()]))
}

/// True if `(verdict, nonce)` opens `commitment`.
pub fn verify_commitment(commitment: &CommitHash, verdict: Verdict, nonce: &str) -> bool {
    commit_verdict(verdict, nonce) == *commitment
}

/// A fresh random nonce (32 lowercase hex characters).
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        let h = commit_verdict(Verdict::Authentic, "abc123");
        assert_eq!(
            h.to_hex(),
            "55aeba090d770f8e6c146cc52318e69a3f02cb21389b835fd8f8caedbd22a782"
        );
    }

    #[test]
    fn verify_accepts_matching_opening() {
        let h = commit_verdict(Verdict::Fake, "n-1");
        assert!(verify_commitment(&h, Verdict::Fake, "n-1"));
    }

    #[test]
    fn verify_rejects_other_verdict_or_nonce() {
        let h = commit_verdict(Verdict::Fake, "n-1");
        assert!(!verify_commitment(&h, Verdict::Authentic, "n-1"));
        assert!(!verify_commitment(&h, Verdict::Fake, "n-2"));
    }

    #[test]
    fn nonce_shape() {
        let n = generate_nonce();
        assert_eq!(n.len(), NONCE_BYTES * 2);
        assert!(n.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(n, generate_nonce());
    }
}
