//! Append-only, hash-chained audit log of engine state transitions.
//!
//! Each entry commits to its predecessor: `hash = Blake2b-256(prev_hash || body)`
//! where `body` is the bincode encoding of `(seq, evidence_id, at, event)`.
//! Collaborators (publication, dashboards) read the feed by evidence id or by
//! sequence cursor; entries are never mutated.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use whistle_crypto::blake2b_256_multi;
use whistle_escrow::EscrowCommandKind;
use whistle_types::{
    Amount, CaseStatus, Category, EvidenceId, InspectorAddress, StakeAction, Timestamp, Verdict,
    WalletRef,
};

use crate::locks;
use crate::outcomes::ReputationReason;
use crate::tally::TallyOutcome;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AuditEvent {
    CaseCreated {
        category: Category,
        organization: String,
        stake: Amount,
    },
    CaseWithdrawn {
        stake: Amount,
    },
    StatusChanged {
        from: CaseStatus,
        to: CaseStatus,
    },
    InspectorsAssigned {
        round: u32,
        inspectors: Vec<InspectorAddress>,
        commit_deadline: Timestamp,
        seed: [u8; 32],
    },
    AssignmentHeld {
        round: u32,
        eligible: usize,
        required: usize,
    },
    CommitAccepted {
        round: u32,
        inspector: InspectorAddress,
    },
    RevealPhaseOpened {
        round: u32,
        reveal_deadline: Timestamp,
        abstentions: Vec<InspectorAddress>,
    },
    RevealAccepted {
        round: u32,
        inspector: InspectorAddress,
        verdict: Verdict,
    },
    RevealRejected {
        round: u32,
        inspector: InspectorAddress,
    },
    SessionFinalized {
        round: u32,
        outcome: TallyOutcome,
        verdict: Verdict,
        agreeing: u32,
        valid_reveals: u32,
        abstentions: Vec<InspectorAddress>,
    },
    ReputationAdjusted {
        inspector: InspectorAddress,
        reason: ReputationReason,
        delta: f64,
        score: f64,
    },
    Resolved {
        round: u32,
        verdict: Verdict,
        stake_action: StakeAction,
    },
    BountyScheduled {
        recipient: WalletRef,
        amount: Amount,
    },
    EscrowCommandIssued {
        kind: EscrowCommandKind,
        amount: Amount,
        accepted: bool,
    },
    EscrowConfirmed {
        kind: EscrowCommandKind,
        reference: String,
    },
    Published,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the log, starting at 0.
    pub seq: u64,
    pub evidence_id: EvidenceId,
    pub at: Timestamp,
    pub event: AuditEvent,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl AuditEntry {
    fn compute_hash(
        prev_hash: &[u8; 32],
        seq: u64,
        evidence_id: &EvidenceId,
        at: Timestamp,
        event: &AuditEvent,
    ) -> [u8; 32] {
        let body = bincode::serialize(&(seq, evidence_id, at, event))
            .expect("audit events are always serializable");
        blake2b_256_multi(&[prev_hash, &body])
    }

    pub fn is_intact(&self) -> bool {
        Self::compute_hash(
            &self.prev_hash,
            self.seq,
            &self.evidence_id,
            self.at,
            &self.event,
        ) == self.hash
    }
}

/// A broken link found by [`AuditLog::verify_chain`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainBreak {
    pub seq: u64,
}

#[derive(Default)]
pub struct AuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event and return its sequence number.
    pub fn append(&self, evidence_id: &EvidenceId, at: Timestamp, event: AuditEvent) -> u64 {
        let mut entries = locks::write(&self.entries);
        push_entry(&mut entries, evidence_id, at, event)
    }

    /// Append `event` only if `accept` approves the log as it stands. The check and the
    /// append happen under one write lock.
    pub fn append_if(
        &self,
        evidence_id: &EvidenceId,
        at: Timestamp,
        event: AuditEvent,
        accept: impl FnOnce(&[AuditEntry]) -> bool,
    ) -> Option<u64> {
        let mut entries = locks::write(&self.entries);
        if !accept(&entries) {
            return None;
        }
        Some(push_entry(&mut entries, evidence_id, at, event))
    }

    pub fn len(&self) -> usize {
        locks::read(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hash of the newest entry (all zeros for an empty log).
    pub fn head(&self) -> [u8; 32] {
        locks::read(&self.entries)
            .last()
            .map(|e| e.hash)
            .unwrap_or([0u8; 32])
    }

    /// Entries with `seq >= cursor`.
    pub fn entries_since(&self, cursor: u64) -> Vec<AuditEntry> {
        let entries = locks::read(&self.entries);
        let start = usize::try_from(cursor).unwrap_or(usize::MAX).min(entries.len());
        entries[start..].to_vec()
    }

    pub fn for_evidence(&self, evidence_id: &EvidenceId) -> Vec<AuditEntry> {
        locks::read(&self.entries)
            .iter()
            .filter(|e| &e.evidence_id == evidence_id)
            .cloned()
            .collect()
    }

    pub fn contains_evidence(&self, evidence_id: &EvidenceId) -> bool {
        locks::read(&self.entries)
            .iter()
            .any(|e| &e.evidence_id == evidence_id)
    }

    /// Check every link. Returns the first entry whose hash or back-link is wrong.
    pub fn verify_chain(&self) -> Result<(), ChainBreak> {
        verify_entries(&locks::read(&self.entries))
    }
}

fn push_entry(
    entries: &mut Vec<AuditEntry>,
    evidence_id: &EvidenceId,
    at: Timestamp,
    event: AuditEvent,
) -> u64 {
    let seq = entries.len() as u64;
    let prev_hash = entries.last().map(|e| e.hash).unwrap_or([0u8; 32]);
    let hash = AuditEntry::compute_hash(&prev_hash, seq, evidence_id, at, &event);
    entries.push(AuditEntry {
        seq,
        evidence_id: evidence_id.clone(),
        at,
        event,
        prev_hash,
        hash,
    });
    seq
}

/// Verify an exported sequence of entries starting at `seq` 0.
pub fn verify_entries(entries: &[AuditEntry]) -> Result<(), ChainBreak> {
    let mut prev = [0u8; 32];
    for (i, entry) in entries.iter().enumerate() {
        if entry.seq != i as u64 || entry.prev_hash != prev || !entry.is_intact() {
            return Err(ChainBreak { seq: i as u64 });
        }
        prev = entry.hash;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u64) -> EvidenceId {
        EvidenceId::from_sequence(n)
    }

    fn sample_log() -> AuditLog {
        let log = AuditLog::new();
        log.append(
            &id(1),
            Timestamp::new(10),
            AuditEvent::CaseCreated {
                category: Category::Food,
                organization: "Acme".into(),
                stake: Amount::new(25),
            },
        );
        log.append(
            &id(2),
            Timestamp::new(11),
            AuditEvent::CaseWithdrawn {
                stake: Amount::new(30),
            },
        );
        log.append(&id(1), Timestamp::new(12), AuditEvent::Published);
        log
    }

    #[test]
    fn conditional_append_checks_current_log() {
        let log = sample_log();
        let rejected = log.append_if(&id(1), Timestamp::new(13), AuditEvent::Published, |entries| {
            entries.len() > 3
        });
        assert_eq!(rejected, None);
        assert_eq!(log.len(), 3);

        let seq = log.append_if(&id(1), Timestamp::new(13), AuditEvent::Published, |entries| {
            entries.len() == 3
        });
        assert_eq!(seq, Some(3));
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn chain_links_entries() {
        let log = sample_log();
        let entries = log.entries_since(0);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].prev_hash, [0u8; 32]);
        assert_eq!(entries[1].prev_hash, entries[0].hash);
        assert_eq!(log.head(), entries[2].hash);
        assert!(log.verify_chain().is_ok());
    }

    #[test]
    fn tampering_is_detected() {
        let mut entries = sample_log().entries_since(0);
        entries[1].event = AuditEvent::CaseWithdrawn {
            stake: Amount::new(1),
        };
        assert_eq!(verify_entries(&entries), Err(ChainBreak { seq: 1 }));

        let mut entries = sample_log().entries_since(0);
        entries.remove(1);
        assert_eq!(verify_entries(&entries), Err(ChainBreak { seq: 1 }));
    }

    #[test]
    fn feed_filters() {
        let log = sample_log();
        assert_eq!(log.for_evidence(&id(1)).len(), 2);
        assert_eq!(log.entries_since(2).len(), 1);
        assert!(log.entries_since(99).is_empty());
        assert!(log.contains_evidence(&id(2)));
        assert!(!log.contains_evidence(&id(3)));
    }

    #[test]
    fn exported_json_still_verifies() {
        let entries = sample_log().entries_since(0);
        let json = serde_json::to_string(&entries).unwrap();
        let back: Vec<AuditEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entries);
        assert!(verify_entries(&back).is_ok());
    }
}
