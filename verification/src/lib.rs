//! Verification and resolution engine for stake-backed evidence.
//!
//! A submitter locks a stake behind a piece of evidence. The engine then:
//! 1. **Assigns** a verifiable random subset of specialised inspectors.
//! 2. Runs a **commit-reveal** session: every inspector first commits to
//!    `SHA-256(verdict || nonce)`, then opens the commitment once all commits are in
//!    or the commit window closes.
//! 3. **Tallies** the valid reveals against a supermajority quorum.
//! 4. **Resolves** the case: refund plus bounty for AUTHENTIC, forfeit for FAKE,
//!    hold for anything without an authoritative verdict. Inspector reputation moves
//!    with the outcome.
//!
//! Deadlines are evaluated lazily on every access and proactively by the
//! [`sweeper`]. Every state change is written to a hash-chained [`audit`] log.

pub mod audit;
pub mod case;
pub mod config;
pub mod error;
pub mod inspector_selection;
mod locks;
pub mod orchestrator;
pub mod outcomes;
pub mod registry;
pub mod session;
pub mod sweeper;
pub mod tally;

pub use audit::{AuditEntry, AuditEvent, AuditLog, ChainBreak};
pub use case::{CaseSubmission, EvidenceCase};
pub use config::EngineConfig;
pub use error::{ErrorKind, VerificationError};
pub use inspector_selection::{InspectorSelector, Selection};
pub use orchestrator::{AssignmentOutcome, ResolutionStats, VerificationEngine};
pub use outcomes::{BountyPayout, ReputationChange, ReputationReason, Resolution};
pub use registry::{Inspector, InspectorProfile, InspectorRegistry};
pub use session::{AbstentionReason, SessionPhase, VerificationSession};
pub use sweeper::{spawn_deadline_sweeper, ShutdownController};
pub use tally::{tally, QuorumRule, TallyOutcome, TallyResult};
