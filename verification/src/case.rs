//! Evidence cases as seen by the engine.

use serde::{Deserialize, Serialize};
use whistle_types::{Amount, CaseStatus, Category, EvidenceId, Timestamp, WalletRef};

/// What the intake layer hands over when a whistleblower submits evidence.
///
/// The encrypted payload itself never reaches the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseSubmission {
    pub category: Category,
    /// The organization the evidence concerns.
    pub organization: String,
    pub stake: Amount,
    /// Where refunds and bounties go. An anonymous wallet reference, not an identity.
    pub submitter: WalletRef,
}

/// A snapshot of one evidence case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceCase {
    pub evidence_id: EvidenceId,
    pub category: Category,
    pub organization: String,
    pub stake: Amount,
    pub submitter: WalletRef,
    pub status: CaseStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EvidenceCase {
    pub(crate) fn from_submission(
        evidence_id: EvidenceId,
        submission: CaseSubmission,
        now: Timestamp,
    ) -> Self {
        Self {
            evidence_id,
            category: submission.category,
            organization: submission.organization.trim().to_string(),
            stake: submission.stake,
            submitter: submission.submitter,
            status: CaseStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
