//! Cryptographic primitives for the WhistleChain verification engine.
//!
//! - **Blake2b** for inspector scoring, randomness mixing and the audit hash chain
//! - **SHA-256** for verdict commitments, so commitments stay checkable by external tools

pub mod commit;
pub mod hash;

pub use commit::{commit_verdict, generate_nonce, verify_commitment, NONCE_BYTES};
pub use hash::{blake2b_256, blake2b_256_multi, sha256};
