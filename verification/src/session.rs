//! Verification session: the per-evidence COMMIT → REVEAL → FINALIZED state machine.
//!
//! A session is plain data plus transitions; it never locks or reads the clock.
//! The engine serializes access per evidence id and passes `now` in.
//!
//! Phase advances are allowed early once everyone has acted, and are forced once a
//! deadline has passed (`now >= deadline`). A forced advance is anchored at the
//! deadline itself, so applying it late (on the next access) or promptly (from a
//! sweep) leaves the same state behind.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use whistle_types::{CommitHash, EvidenceId, InspectorAddress, Timestamp, Verdict};

use crate::error::VerificationError;
use crate::tally::{tally, QuorumRule, TallyResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Commit,
    Reveal,
    Finalized,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => f.write_str("COMMIT"),
            Self::Reveal => f.write_str("REVEAL"),
            Self::Finalized => f.write_str("FINALIZED"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub hash: CommitHash,
    pub at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRecord {
    pub verdict: Verdict,
    pub nonce: String,
    /// Pointer to the supporting material (content address, document reference).
    pub justification: String,
    pub at: Timestamp,
}

/// Why an assigned inspector contributes nothing to the tally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstentionReason {
    /// Never committed before the commit phase closed.
    NoCommit,
    /// Committed but never revealed before the session finalized.
    NoReveal,
    /// Revealed a (verdict, nonce) pair that does not open the commitment.
    CommitMismatch,
}

/// How the inspectors of a round were drawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub round: u32,
    /// VRF context the draw used.
    pub context: Vec<u8>,
    pub seed: [u8; 32],
    pub proof: Vec<u8>,
    pub vrf_round: u64,
    /// Pool the draw ran over (after exclusions), sorted.
    pub eligible: Vec<InspectorAddress>,
    pub assigned_at: Timestamp,
}

/// A transition the session went through.
#[derive(Clone, Debug, PartialEq)]
pub enum PhaseChange {
    RevealOpened {
        at: Timestamp,
        reveal_deadline: Timestamp,
        /// Inspectors newly recorded as `NoCommit`.
        abstentions: Vec<InspectorAddress>,
    },
    Finalized {
        at: Timestamp,
        /// Inspectors newly recorded as `NoReveal`.
        abstentions: Vec<InspectorAddress>,
        tally: TallyResult,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationSession {
    pub evidence_id: EvidenceId,
    pub round: u32,
    /// Fixed for the session lifetime, in selection order.
    pub assigned: Vec<InspectorAddress>,
    pub phase: SessionPhase,
    pub opened_at: Timestamp,
    pub commit_deadline: Timestamp,
    pub reveal_window_secs: u64,
    /// Set on entering REVEAL.
    pub reveal_deadline: Option<Timestamp>,
    pub commits: BTreeMap<InspectorAddress, CommitRecord>,
    /// Only reveals that opened their commitment.
    pub reveals: BTreeMap<InspectorAddress, RevealRecord>,
    pub abstentions: BTreeMap<InspectorAddress, AbstentionReason>,
    pub finalized_at: Option<Timestamp>,
    pub tally: Option<TallyResult>,
    pub assignment: AssignmentRecord,
}

impl VerificationSession {
    pub fn open(
        evidence_id: EvidenceId,
        assigned: Vec<InspectorAddress>,
        now: Timestamp,
        commit_window_secs: u64,
        reveal_window_secs: u64,
        assignment: AssignmentRecord,
    ) -> Self {
        Self {
            evidence_id,
            round: assignment.round,
            assigned,
            phase: SessionPhase::Commit,
            opened_at: now,
            commit_deadline: now.plus_secs(commit_window_secs),
            reveal_window_secs,
            reveal_deadline: None,
            commits: BTreeMap::new(),
            reveals: BTreeMap::new(),
            abstentions: BTreeMap::new(),
            finalized_at: None,
            tally: None,
            assignment,
        }
    }

    pub fn is_assigned(&self, inspector: &InspectorAddress) -> bool {
        self.assigned.contains(inspector)
    }

    pub fn all_committed(&self) -> bool {
        self.commits.len() == self.assigned.len()
    }

    /// Every committed inspector has used their reveal slot (validly or not).
    pub fn all_revealed(&self) -> bool {
        self.commits.keys().all(|inspector| {
            self.reveals.contains_key(inspector)
                || self.abstentions.get(inspector) == Some(&AbstentionReason::CommitMismatch)
        })
    }

    /// Verdicts of valid reveals.
    pub fn valid_verdicts(&self) -> impl Iterator<Item = Verdict> + '_ {
        self.reveals.values().map(|r| r.verdict)
    }

    fn expect_phase(&self, expected: SessionPhase) -> Result<(), VerificationError> {
        if self.phase != expected {
            return Err(VerificationError::PhaseMismatch {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    pub fn submit_commit(
        &mut self,
        inspector: &InspectorAddress,
        hash: CommitHash,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if !self.is_assigned(inspector) {
            return Err(VerificationError::NotAssigned(inspector.clone()));
        }
        self.expect_phase(SessionPhase::Commit)?;
        if self.commits.contains_key(inspector) {
            return Err(VerificationError::AlreadyCommitted(inspector.clone()));
        }
        self.commits
            .insert(inspector.clone(), CommitRecord { hash, at: now });
        Ok(())
    }

    /// COMMIT → REVEAL. Allowed once the commit deadline has passed or everyone
    /// committed.
    pub fn advance_to_reveal(&mut self, now: Timestamp) -> Result<PhaseChange, VerificationError> {
        self.expect_phase(SessionPhase::Commit)?;
        let expired = self.commit_deadline.has_passed(now);
        if !expired && !self.all_committed() {
            return Err(VerificationError::WindowOpen {
                deadline: self.commit_deadline,
            });
        }
        let at = if expired { self.commit_deadline } else { now };

        let abstentions: Vec<InspectorAddress> = self
            .assigned
            .iter()
            .filter(|inspector| !self.commits.contains_key(*inspector))
            .cloned()
            .collect();
        for inspector in &abstentions {
            self.abstentions
                .insert(inspector.clone(), AbstentionReason::NoCommit);
        }

        let reveal_deadline = at.plus_secs(self.reveal_window_secs);
        self.reveal_deadline = Some(reveal_deadline);
        self.phase = SessionPhase::Reveal;
        Ok(PhaseChange::RevealOpened {
            at,
            reveal_deadline,
            abstentions,
        })
    }

    /// Accept a reveal if it opens the inspector's commitment.
    ///
    /// A mismatched reveal uses up the inspector's reveal slot and is recorded as a
    /// `CommitMismatch` abstention before the error is returned.
    pub fn submit_reveal(
        &mut self,
        inspector: &InspectorAddress,
        verdict: Verdict,
        nonce: &str,
        justification: &str,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if !self.is_assigned(inspector) {
            return Err(VerificationError::NotAssigned(inspector.clone()));
        }
        self.expect_phase(SessionPhase::Reveal)?;
        let commitment = match self.commits.get(inspector) {
            Some(commit) => commit.hash,
            None => return Err(VerificationError::NotCommitted(inspector.clone())),
        };
        if self.reveals.contains_key(inspector) || self.abstentions.contains_key(inspector) {
            return Err(VerificationError::AlreadyRevealed(inspector.clone()));
        }
        let justification = justification.trim();
        if justification.is_empty() {
            return Err(VerificationError::MissingJustification);
        }

        if !whistle_crypto::verify_commitment(&commitment, verdict, nonce) {
            self.abstentions
                .insert(inspector.clone(), AbstentionReason::CommitMismatch);
            return Err(VerificationError::CommitMismatch(inspector.clone()));
        }

        self.reveals.insert(
            inspector.clone(),
            RevealRecord {
                verdict,
                nonce: nonce.to_string(),
                justification: justification.to_string(),
                at: now,
            },
        );
        Ok(())
    }

    /// REVEAL → FINALIZED. Allowed once the reveal deadline has passed or every
    /// committed inspector revealed. Runs the tally and freezes the session.
    pub fn finalize(
        &mut self,
        now: Timestamp,
        rule: &QuorumRule,
    ) -> Result<PhaseChange, VerificationError> {
        self.expect_phase(SessionPhase::Reveal)?;
        let deadline = self.reveal_deadline.unwrap_or(self.commit_deadline);
        let expired = deadline.has_passed(now);
        if !expired && !self.all_revealed() {
            return Err(VerificationError::WindowOpen { deadline });
        }
        let at = if expired { deadline } else { now };

        let abstentions: Vec<InspectorAddress> = self
            .commits
            .keys()
            .filter(|inspector| {
                !self.reveals.contains_key(*inspector) && !self.abstentions.contains_key(*inspector)
            })
            .cloned()
            .collect();
        for inspector in &abstentions {
            self.abstentions
                .insert(inspector.clone(), AbstentionReason::NoReveal);
        }

        let result = tally(self.valid_verdicts(), rule);
        self.tally = Some(result);
        self.finalized_at = Some(at);
        self.phase = SessionPhase::Finalized;
        Ok(PhaseChange::Finalized {
            at,
            abstentions,
            tally: result,
        })
    }

    /// Apply every transition whose deadline has passed at `now`.
    pub fn expire(&mut self, now: Timestamp, rule: &QuorumRule) -> Vec<PhaseChange> {
        let mut changes = Vec::new();
        if self.phase == SessionPhase::Commit && self.commit_deadline.has_passed(now) {
            if let Ok(change) = self.advance_to_reveal(now) {
                changes.push(change);
            }
        }
        if self.phase == SessionPhase::Reveal
            && self.reveal_deadline.is_some_and(|d| d.has_passed(now))
        {
            if let Ok(change) = self.finalize(now, rule) {
                changes.push(change);
            }
        }
        changes
    }

    /// The deadline of the current phase, if any.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        match self.phase {
            SessionPhase::Commit => Some(self.commit_deadline),
            SessionPhase::Reveal => self.reveal_deadline,
            SessionPhase::Finalized => None,
        }
    }
}
