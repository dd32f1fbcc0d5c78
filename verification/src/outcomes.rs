//! Resolution outcomes: stake disposition, bounty sizing, reputation feedback.
//!
//! Everything here is a pure function of a finalized session and its tally; the
//! engine applies the results.
//! - Consensus AUTHENTIC: stake refunded plus a bounty scaled by consensus strength
//! - Consensus FAKE: stake forfeited to the treasury
//! - anything else: stake held for re-verification

use serde::{Deserialize, Serialize};
use whistle_types::{
    Amount, Category, CategoryPolicy, EvidenceId, InspectorAddress, Ratio, ReputationPolicy,
    StakeAction, Timestamp, Verdict, WalletRef,
};

use crate::session::{AbstentionReason, VerificationSession};
use crate::tally::{TallyOutcome, TallyResult};

/// The final word on one assignment round of an evidence case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub evidence_id: EvidenceId,
    pub round: u32,
    pub final_verdict: Verdict,
    pub outcome: TallyOutcome,
    /// Share of valid reveals agreeing with `final_verdict`.
    pub consensus_ratio: Ratio,
    pub stake_action: StakeAction,
    pub resolved_at: Timestamp,
}

/// How a bounty amount was derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BountyBasis {
    pub category: Category,
    pub base: Amount,
    pub max: Amount,
    pub consensus: Ratio,
    /// Stake returned alongside the bounty.
    pub stake_refund: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BountyPayout {
    pub evidence_id: EvidenceId,
    pub recipient: WalletRef,
    pub amount: Amount,
    pub basis: BountyBasis,
}

impl BountyPayout {
    /// Bounty plus refunded stake.
    pub fn total(&self) -> Amount {
        self.amount.saturating_add(self.basis.stake_refund)
    }
}

/// Stake disposition for a tally.
pub fn stake_action_for(tally: &TallyResult) -> StakeAction {
    match tally.authoritative_verdict() {
        Some(Verdict::Authentic) => StakeAction::Refunded,
        Some(Verdict::Fake) => StakeAction::Forfeited,
        Some(Verdict::Inconclusive) | None => StakeAction::Held,
    }
}

/// `base + (max - base) * ratio`, rounded down and capped at `max`.
pub fn compute_bounty(policy: &CategoryPolicy, ratio: Ratio) -> Amount {
    let spread = policy.bounty_max.saturating_sub(policy.bounty_base);
    let bounty = policy
        .bounty_base
        .saturating_add(Amount::new(ratio.scale(spread.raw())));
    bounty.min(policy.bounty_max)
}

/// Why an inspector's reputation moved (or did not).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationReason {
    /// Valid reveal matching an authoritative verdict.
    Agreed,
    /// Valid reveal against an authoritative verdict.
    Minority,
    /// Valid reveal in a round without an authoritative verdict.
    Unscored,
    Abstained,
    Mismatched,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReputationChange {
    pub inspector: InspectorAddress,
    pub delta: f64,
    pub reason: ReputationReason,
}

impl ReputationChange {
    /// Whether this inspector cast a valid reveal.
    pub fn counts_as_inspection(&self) -> bool {
        matches!(
            self.reason,
            ReputationReason::Agreed | ReputationReason::Minority | ReputationReason::Unscored
        )
    }
}

/// Reputation feedback for every assigned inspector of a finalized session.
///
/// Honest disagreement with the majority costs less than abstaining, and abstaining
/// costs no more than a reveal that does not open its commitment.
pub fn reputation_changes(
    session: &VerificationSession,
    tally: &TallyResult,
    policy: &ReputationPolicy,
) -> Vec<ReputationChange> {
    let scored = tally.authoritative_verdict();

    session
        .assigned
        .iter()
        .map(|inspector| {
            let (delta, reason) = if let Some(reveal) = session.reveals.get(inspector) {
                match scored {
                    Some(v) if reveal.verdict == v => {
                        (policy.agreement_reward, ReputationReason::Agreed)
                    }
                    Some(_) => (-policy.minority_penalty, ReputationReason::Minority),
                    None => (0.0, ReputationReason::Unscored),
                }
            } else {
                match session.abstentions.get(inspector) {
                    Some(AbstentionReason::CommitMismatch) => {
                        (-policy.mismatch_penalty, ReputationReason::Mismatched)
                    }
                    _ => (-policy.abstention_penalty, ReputationReason::Abstained),
                }
            };
            ReputationChange {
                inspector: inspector.clone(),
                delta,
                reason,
            }
        })
        .collect()
}
