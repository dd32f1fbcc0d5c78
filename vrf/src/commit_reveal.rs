//! Commit-reveal randomness.
//!
//! Contributors commit `SHA-256(value)` for a secret 32-byte value, then reveal it.
//! Once every commitment is revealed the values are combined (Blake2b over the
//! values in contributor order) into a seed, and each draw mixes the seed with the
//! caller's context. The proof carries the revealed values so any party holding
//! the commitments can recompute the output.

use crate::{RandomOutput, VrfError, VrfProvider};
use whistle_crypto::{blake2b_256_multi, sha256};
use whistle_types::InspectorAddress;

/// A commitment from a contributor.
#[derive(Clone, Debug)]
pub struct Commitment {
    pub contributor: InspectorAddress,
    /// SHA-256 of the random value.
    pub hash: [u8; 32],
}

impl Commitment {
    pub fn for_value(contributor: InspectorAddress, value: &[u8; 32]) -> Self {
        Self {
            contributor,
            hash: sha256(&[value]),
        }
    }
}

/// A reveal from a contributor.
#[derive(Clone, Debug)]
pub struct Reveal {
    pub contributor: InspectorAddress,
    /// The actual random value.
    pub value: [u8; 32],
}

/// Commit-reveal VRF provider.
#[derive(Default)]
pub struct CommitRevealVrf {
    /// Commitments received so far.
    pub commitments: Vec<Commitment>,
    /// Reveals received so far.
    pub reveals: Vec<Reveal>,
}

impl CommitRevealVrf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commitment from a contributor. One commitment per contributor.
    pub fn record_commitment(&mut self, commitment: Commitment) -> Result<(), VrfError> {
        if !self.reveals.is_empty() {
            return Err(VrfError::CommitReveal("reveals already started".into()));
        }
        if self
            .commitments
            .iter()
            .any(|c| c.contributor == commitment.contributor)
        {
            return Err(VrfError::CommitReveal(format!(
                "{} already committed",
                commitment.contributor
            )));
        }
        self.commitments.push(commitment);
        Ok(())
    }

    /// Record a reveal and check it matches the commitment.
    pub fn record_reveal(&mut self, reveal: Reveal) -> Result<(), VrfError> {
        let commitment = self
            .commitments
            .iter()
            .find(|c| c.contributor == reveal.contributor)
            .ok_or_else(|| {
                VrfError::CommitReveal(format!("{} has no commitment", reveal.contributor))
            })?;
        if self
            .reveals
            .iter()
            .any(|r| r.contributor == reveal.contributor)
        {
            return Err(VrfError::CommitReveal(format!(
                "{} already revealed",
                reveal.contributor
            )));
        }
        if sha256(&[&reveal.value]) != commitment.hash {
            return Err(VrfError::VerificationFailed(format!(
                "reveal from {} does not match its commitment",
                reveal.contributor
            )));
        }
        self.reveals.push(reveal);
        Ok(())
    }

    /// True once every commitment has a matching reveal.
    pub fn is_complete(&self) -> bool {
        !self.commitments.is_empty() && self.reveals.len() == self.commitments.len()
    }

    /// Combine all reveals into a single random seed.
    pub fn combine_reveals(&self) -> Result<[u8; 32], VrfError> {
        Ok(combine(&self.ordered_values()?))
    }

    /// Revealed values sorted by contributor.
    fn ordered_values(&self) -> Result<Vec<[u8; 32]>, VrfError> {
        if !self.is_complete() {
            return Err(VrfError::Unavailable(format!(
                "{} of {} commitments revealed",
                self.reveals.len(),
                self.commitments.len()
            )));
        }
        let mut reveals: Vec<&Reveal> = self.reveals.iter().collect();
        reveals.sort_by(|a, b| a.contributor.cmp(&b.contributor));
        Ok(reveals.into_iter().map(|r| r.value).collect())
    }
}

fn combine(values: &[[u8; 32]]) -> [u8; 32] {
    let parts: Vec<&[u8]> = values.iter().map(|v| v.as_slice()).collect();
    blake2b_256_multi(&parts)
}

fn derive(seed: &[u8; 32], context: &[u8]) -> [u8; 32] {
    blake2b_256_multi(&[seed, context])
}

impl VrfProvider for CommitRevealVrf {
    fn get_randomness(&self, context: &[u8]) -> Result<RandomOutput, VrfError> {
        let values = self.ordered_values()?;
        let seed = combine(&values);
        Ok(RandomOutput {
            value: derive(&seed, context),
            proof: values.concat(),
            round: values.len() as u64,
        })
    }

    fn verify(&self, context: &[u8], output: &RandomOutput) -> Result<bool, VrfError> {
        if output.proof.is_empty() || output.proof.len() % 32 != 0 {
            return Err(VrfError::InvalidProof);
        }
        let mut commitments: Vec<&Commitment> = self.commitments.iter().collect();
        commitments.sort_by(|a, b| a.contributor.cmp(&b.contributor));
        if output.proof.len() / 32 != commitments.len() {
            return Ok(false);
        }
        // Chunk i must open the i-th commitment in contributor order.
        let mut values = Vec::with_capacity(commitments.len());
        for (chunk, commitment) in output.proof.chunks_exact(32).zip(&commitments) {
            let mut value = [0u8; 32];
            value.copy_from_slice(chunk);
            if sha256(&[&value]) != commitment.hash {
                return Ok(false);
            }
            values.push(value);
        }
        Ok(derive(&combine(&values), context) == output.value)
    }

    fn name(&self) -> &str {
        "commit-reveal"
    }
}
