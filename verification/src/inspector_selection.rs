//! Inspector assignment using VRF randomness.

use whistle_crypto::blake2b_256_multi;
use whistle_types::{EvidenceId, InspectorAddress};
use whistle_vrf::{RandomOutput, VrfProvider};

use crate::error::VerificationError;

/// The result of one draw, with everything needed to recompute it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    /// Selected inspectors, ordered by selection score.
    pub inspectors: Vec<InspectorAddress>,
    pub randomness: RandomOutput,
}

/// Context bytes fed to the VRF for one assignment round of one evidence case.
pub fn assignment_context(evidence_id: &EvidenceId, round: u32) -> Vec<u8> {
    format!("whistle-assign:{evidence_id}:{round}").into_bytes()
}

/// Selects inspectors from the eligible pool.
pub struct InspectorSelector;

impl InspectorSelector {
    /// Select `count` inspectors using VRF-derived randomness.
    ///
    /// Each eligible inspector gets the score `Hash(seed || context || address)`;
    /// the `count` lowest scores win. Sorting by an unpredictable hash is a uniform
    /// sample without replacement, and any party holding the VRF output can
    /// recompute it with [`InspectorSelector::rank`].
    pub fn select(
        &self,
        vrf: &dyn VrfProvider,
        eligible: &[InspectorAddress],
        context: &[u8],
        count: usize,
    ) -> Result<Selection, VerificationError> {
        if eligible.len() < count {
            return Err(VerificationError::InsufficientInspectors {
                eligible: eligible.len(),
                required: count,
            });
        }

        let randomness = vrf
            .get_randomness(context)
            .map_err(|e| VerificationError::Randomness(e.to_string()))?;
        let inspectors = Self::rank(&randomness.value, eligible, context, count);
        Ok(Selection {
            inspectors,
            randomness,
        })
    }

    /// The deterministic part of the draw.
    pub fn rank(
        seed: &[u8; 32],
        eligible: &[InspectorAddress],
        context: &[u8],
        count: usize,
    ) -> Vec<InspectorAddress> {
        let mut scored: Vec<([u8; 32], &InspectorAddress)> = eligible
            .iter()
            .map(|addr| {
                let score = blake2b_256_multi(&[seed, context, addr.as_str().as_bytes()]);
                (score, addr)
            })
            .collect();

        // Address breaks the (practically impossible) score tie.
        scored.sort();
        scored.dedup_by(|a, b| a.1 == b.1);
        scored
            .into_iter()
            .take(count)
            .map(|(_, addr)| addr.clone())
            .collect()
    }

    /// Check a published selection: the randomness verifies and the ranking matches.
    pub fn verify(
        &self,
        vrf: &dyn VrfProvider,
        eligible: &[InspectorAddress],
        context: &[u8],
        selection: &Selection,
    ) -> Result<bool, VerificationError> {
        let valid = vrf
            .verify(context, &selection.randomness)
            .map_err(|e| VerificationError::Randomness(e.to_string()))?;
        Ok(valid
            && Self::rank(
                &selection.randomness.value,
                eligible,
                context,
                selection.inspectors.len(),
            ) == selection.inspectors)
    }
}
