use thiserror::Error;
use whistle_escrow::EscrowCommandKind;
use whistle_types::{Amount, CaseStatus, Category, EvidenceId, InspectorAddress, Timestamp, WhistleError};

use crate::session::SessionPhase;

/// Coarse classification of a [`VerificationError`], for callers that only need to
/// know what kind of mistake was made.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed input. Nothing changed.
    Validation,
    /// The caller is not allowed to act on this session.
    Authorization,
    /// The request collides with state that already exists ("you already acted",
    /// "the window has closed").
    Conflict,
    /// A reveal did not open its commitment. Recorded as an abstention.
    Integrity,
    /// Not enough inspectors or reveals for an authoritative outcome.
    Quorum,
    NotFound,
    /// A collaborator (randomness source) could not serve the request.
    Unavailable,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VerificationError {
    #[error("invalid inspector profile: {0}")]
    InvalidProfile(String),

    #[error("reveal requires a justification reference")]
    MissingJustification,

    #[error("stake {provided} is below the {category} minimum of {minimum}")]
    StakeBelowMinimum {
        category: Category,
        minimum: Amount,
        provided: Amount,
    },

    #[error("stake {provided} is above the maximum of {maximum}")]
    StakeAboveMaximum { maximum: Amount, provided: Amount },

    #[error("invalid case: {0}")]
    InvalidCase(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Types(#[from] WhistleError),

    #[error("inspector {0} is already registered")]
    DuplicateInspector(InspectorAddress),

    #[error("inspector {0} has already committed")]
    AlreadyCommitted(InspectorAddress),

    #[error("inspector {0} has already revealed")]
    AlreadyRevealed(InspectorAddress),

    #[error("evidence {0} is already resolved")]
    AlreadyResolved(EvidenceId),

    #[error("session is in phase {actual}, expected {expected}")]
    PhaseMismatch {
        expected: SessionPhase,
        actual: SessionPhase,
    },

    #[error("window still open until {deadline}")]
    WindowOpen { deadline: Timestamp },

    #[error("cannot {operation} evidence {evidence_id} in status {status}")]
    InvalidStatus {
        evidence_id: EvidenceId,
        status: CaseStatus,
        operation: &'static str,
    },

    #[error("inspector {0} is not assigned to this session")]
    NotAssigned(InspectorAddress),

    #[error("inspector {0} has no commitment in this session")]
    NotCommitted(InspectorAddress),

    #[error("unknown inspector {0}")]
    UnknownInspector(InspectorAddress),

    #[error("unknown evidence {0}")]
    UnknownEvidence(EvidenceId),

    #[error("evidence {0} has no verification session")]
    NoSession(EvidenceId),

    #[error("reveal from {0} does not match its commitment")]
    CommitMismatch(InspectorAddress),

    #[error("insufficient inspectors: {eligible} eligible, {required} required")]
    InsufficientInspectors { eligible: usize, required: usize },

    #[error("no outstanding {kind} command for evidence {evidence_id}")]
    UnexpectedReceipt {
        evidence_id: EvidenceId,
        kind: EscrowCommandKind,
    },

    #[error("randomness unavailable: {0}")]
    Randomness(String),
}

impl VerificationError {
    pub fn kind(&self) -> ErrorKind {
        use VerificationError::*;
        match self {
            InvalidProfile(_)
            | MissingJustification
            | StakeBelowMinimum { .. }
            | StakeAboveMaximum { .. }
            | InvalidCase(_)
            | Config(_)
            | Types(_) => ErrorKind::Validation,
            DuplicateInspector(_)
            | AlreadyCommitted(_)
            | AlreadyRevealed(_)
            | AlreadyResolved(_)
            | PhaseMismatch { .. }
            | WindowOpen { .. }
            | InvalidStatus { .. }
            | UnexpectedReceipt { .. } => ErrorKind::Conflict,
            NotAssigned(_) | NotCommitted(_) => ErrorKind::Authorization,
            CommitMismatch(_) => ErrorKind::Integrity,
            InsufficientInspectors { .. } => ErrorKind::Quorum,
            UnknownInspector(_) | UnknownEvidence(_) | NoSession(_) => ErrorKind::NotFound,
            Randomness(_) => ErrorKind::Unavailable,
        }
    }
}
