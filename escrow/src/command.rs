use std::fmt;

use serde::{Deserialize, Serialize};
use whistle_types::{Amount, EvidenceId, Timestamp, WalletRef};

/// An instruction for the escrow ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EscrowCommand {
    /// Return the locked stake to the submitter.
    Refund {
        evidence_id: EvidenceId,
        recipient: WalletRef,
        amount: Amount,
    },
    /// Keep the locked stake.
    Forfeit {
        evidence_id: EvidenceId,
        amount: Amount,
    },
    /// Pay the submitter a bounty on top of the refund.
    PayBounty {
        evidence_id: EvidenceId,
        recipient: WalletRef,
        amount: Amount,
    },
}

impl EscrowCommand {
    pub fn evidence_id(&self) -> &EvidenceId {
        match self {
            Self::Refund { evidence_id, .. }
            | Self::Forfeit { evidence_id, .. }
            | Self::PayBounty { evidence_id, .. } => evidence_id,
        }
    }

    pub fn amount(&self) -> Amount {
        match self {
            Self::Refund { amount, .. }
            | Self::Forfeit { amount, .. }
            | Self::PayBounty { amount, .. } => *amount,
        }
    }

    pub fn kind(&self) -> EscrowCommandKind {
        match self {
            Self::Refund { .. } => EscrowCommandKind::Refund,
            Self::Forfeit { .. } => EscrowCommandKind::Forfeit,
            Self::PayBounty { .. } => EscrowCommandKind::PayBounty,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowCommandKind {
    Refund,
    Forfeit,
    PayBounty,
}

impl fmt::Display for EscrowCommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Refund => f.write_str("refund"),
            Self::Forfeit => f.write_str("forfeit"),
            Self::PayBounty => f.write_str("pay_bounty"),
        }
    }
}

/// Ledger confirmation that a command settled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowReceipt {
    pub evidence_id: EvidenceId,
    pub kind: EscrowCommandKind,
    /// Ledger-side reference, e.g. a transaction id.
    pub reference: String,
    pub confirmed_at: Timestamp,
}
