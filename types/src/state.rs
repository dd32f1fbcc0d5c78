//! State enums for evidence cases and stakes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an evidence case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    /// Submitted with a locked stake; no session yet.
    Pending,
    /// Inspectors assigned; a verification session is running.
    UnderVerification,
    /// Consensus AUTHENTIC; transient before `Resolved`.
    Verified,
    /// Consensus FAKE; transient before `Resolved`.
    Rejected,
    /// No authoritative verdict; stake held pending re-verification.
    Disputed,
    /// Stake disposition executed. Immutable apart from publication.
    Resolved,
    /// Made public by the publication collaborator. Terminal.
    Published,
}

impl CaseStatus {
    /// On-chain status code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Verified => 1,
            Self::Disputed => 2,
            Self::Rejected => 3,
            Self::Published => 4,
            Self::UnderVerification => 5,
            Self::Resolved => 6,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (self, next),
            (Pending, UnderVerification)
                | (Pending, Disputed)
                | (UnderVerification, Verified)
                | (UnderVerification, Rejected)
                | (UnderVerification, Disputed)
                | (Verified, Resolved)
                | (Rejected, Resolved)
                | (Disputed, UnderVerification)
                | (Resolved, Published)
        )
    }

    /// Whether the stake has been finally disposed of.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved | Self::Published)
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::UnderVerification => "UNDER_VERIFICATION",
            Self::Verified => "VERIFIED",
            Self::Rejected => "REJECTED",
            Self::Disputed => "DISPUTED",
            Self::Resolved => "RESOLVED",
            Self::Published => "PUBLISHED",
        };
        f.write_str(label)
    }
}

/// What happens to the submitter's stake once a case is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StakeAction {
    /// Returned to the submitter (evidence authentic).
    Refunded,
    /// Sent to the treasury (evidence fake).
    Forfeited,
    /// Kept in escrow pending re-verification.
    Held,
}

impl fmt::Display for StakeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Refunded => "REFUNDED",
            Self::Forfeited => "FORFEITED",
            Self::Held => "HELD",
        };
        f.write_str(label)
    }
}
