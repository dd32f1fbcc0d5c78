//! Verifiable randomness for fair inspector assignment.
//!
//! The engine only depends on the [`VrfProvider`] trait. Two providers exist:
//! - [`CommitRevealVrf`]: contributors commit to hashed random values, reveal them,
//!   and the combined reveals seed every draw
//! - a deterministic test provider in `whistle-nullables`

pub mod commit_reveal;
pub mod error;

pub use commit_reveal::{Commitment, CommitRevealVrf, Reveal};
pub use error::VrfError;

use serde::{Deserialize, Serialize};

/// Trait for providing verifiable randomness.
pub trait VrfProvider: Send + Sync {
    /// Get randomness for a given context (e.g., evidence id and round).
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError>;

    /// Verify that a randomness output was correctly generated.
    fn verify(&self, context: &[u8], output: &RandomOutput) -> Result<bool, VrfError>;

    /// Human-readable name of this VRF provider.
    fn name(&self) -> &str;
}

/// The output of a VRF: a random value with its proof.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomOutput {
    /// The random bytes (32 bytes).
    pub value: [u8; 32],
    /// Proof that the value was correctly generated.
    pub proof: Vec<u8>,
    /// Round number or epoch of the randomness source.
    pub round: u64,
}
