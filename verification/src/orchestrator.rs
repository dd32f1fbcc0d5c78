//! Verification engine: connects the registry, inspector selection, sessions,
//! tally and resolution into one end-to-end workflow.
//!
//! Every operation on one evidence case runs under that case's mutex, so commits,
//! reveals, phase advances and resolution on the same evidence id are totally
//! ordered. Different cases proceed in parallel. Expired deadlines are applied on
//! access before any request is validated; [`VerificationEngine::sweep_expired`]
//! applies them proactively and yields the same states.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, warn};
use whistle_escrow::{EscrowCommand, EscrowCommandKind, EscrowLedger, EscrowReceipt};
use whistle_types::{
    Amount, CaseStatus, CommitHash, EngineParams, EvidenceId, InspectorAddress, StakeAction,
    Timestamp, Verdict,
};
use whistle_utils::{format_duration, StatsCounter};
use whistle_vrf::{RandomOutput, VrfProvider};

use crate::audit::{AuditEntry, AuditEvent, AuditLog};
use crate::case::{CaseSubmission, EvidenceCase};
use crate::error::VerificationError;
use crate::inspector_selection::{assignment_context, InspectorSelector, Selection};
use crate::locks;
use crate::outcomes::{
    compute_bounty, reputation_changes, stake_action_for, BountyBasis, BountyPayout,
    ReputationChange, ReputationReason, Resolution,
};
use crate::registry::InspectorRegistry;
use crate::session::{AssignmentRecord, PhaseChange, SessionPhase, VerificationSession};
use crate::tally::{QuorumRule, TallyResult};

/// Counter names tracked by [`VerificationEngine::stats`].
pub const STAT_NAMES: &[&str] = &[
    "cases_created",
    "cases_withdrawn",
    "assignments",
    "assignments_held",
    "commits_accepted",
    "reveals_accepted",
    "reveal_mismatches",
    "sessions_finalized",
    "cases_resolved",
    "escrow_failures",
];

/// Result of an assignment attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignmentOutcome {
    /// A session is open and waiting for commits.
    Assigned {
        round: u32,
        inspectors: Vec<InspectorAddress>,
        commit_deadline: Timestamp,
    },
    /// Not enough eligible inspectors. The case is DISPUTED until reassigned.
    Held {
        round: u32,
        eligible: usize,
        required: usize,
    },
}

/// Totals over every resolution the engine has made.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub refunded: u64,
    pub forfeited: u64,
    pub held: u64,
    pub refunded_stake: Amount,
    pub forfeited_stake: Amount,
    pub bounties: Amount,
}

struct CaseRecord {
    case: EvidenceCase,
    /// Number of assignment attempts so far (0 while PENDING).
    round: u32,
    session: Option<VerificationSession>,
    archived: Vec<VerificationSession>,
    resolutions: Vec<Resolution>,
    payout: Option<BountyPayout>,
    /// Inspectors who abstained or mismatched in any round of this case.
    unresponsive: BTreeSet<InspectorAddress>,
    withdrawn: bool,
}

impl CaseRecord {
    fn new(case: EvidenceCase) -> Self {
        Self {
            case,
            round: 0,
            session: None,
            archived: Vec::new(),
            resolutions: Vec::new(),
            payout: None,
            unresponsive: BTreeSet::new(),
            withdrawn: false,
        }
    }

    fn current_resolution(&self) -> Option<&Resolution> {
        self.resolutions.last().filter(|r| r.round == self.round)
    }

    fn session_mut(&mut self) -> Result<&mut VerificationSession, VerificationError> {
        let id = &self.case.evidence_id;
        self.session
            .as_mut()
            .ok_or_else(|| VerificationError::NoSession(id.clone()))
    }
}

pub struct VerificationEngine {
    params: EngineParams,
    registry: Arc<InspectorRegistry>,
    selector: InspectorSelector,
    vrf: Arc<dyn VrfProvider>,
    escrow: Arc<dyn EscrowLedger>,
    audit: AuditLog,
    cases: RwLock<HashMap<EvidenceId, Arc<Mutex<CaseRecord>>>>,
    next_sequence: AtomicU64,
    stats: StatsCounter,
}

impl VerificationEngine {
    pub fn new(
        params: EngineParams,
        registry: Arc<InspectorRegistry>,
        vrf: Arc<dyn VrfProvider>,
        escrow: Arc<dyn EscrowLedger>,
    ) -> Result<Self, VerificationError> {
        params.validate()?;
        info!(
            vrf = vrf.name(),
            escrow = escrow.name(),
            quorum_bps = params.quorum_bps,
            min_inspectors = params.min_inspectors,
            "verification engine ready"
        );
        Ok(Self {
            params,
            registry,
            selector: InspectorSelector,
            vrf,
            escrow,
            audit: AuditLog::new(),
            cases: RwLock::new(HashMap::new()),
            next_sequence: AtomicU64::new(0),
            stats: StatsCounter::new(STAT_NAMES),
        })
    }

    pub fn registry(&self) -> &Arc<InspectorRegistry> {
        &self.registry
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    fn quorum_rule(&self) -> QuorumRule {
        QuorumRule::from_params(&self.params)
    }

    // ── Intake ───────────────────────────────────────────────────────────

    /// Register a new case. The stake is assumed to be locked in escrow already.
    pub fn create_case(
        &self,
        submission: CaseSubmission,
        now: Timestamp,
    ) -> Result<EvidenceId, VerificationError> {
        if submission.organization.trim().is_empty() {
            return Err(VerificationError::InvalidCase("organization is empty".into()));
        }
        if submission.submitter.as_str().trim().is_empty() {
            return Err(VerificationError::InvalidCase(
                "submitter wallet reference is empty".into(),
            ));
        }
        let minimum = self.params.policy(submission.category).min_stake;
        if submission.stake < minimum {
            return Err(VerificationError::StakeBelowMinimum {
                category: submission.category,
                minimum,
                provided: submission.stake,
            });
        }
        if submission.stake > self.params.max_stake {
            return Err(VerificationError::StakeAboveMaximum {
                maximum: self.params.max_stake,
                provided: submission.stake,
            });
        }

        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let evidence_id = EvidenceId::from_sequence(sequence);
        let case = EvidenceCase::from_submission(evidence_id.clone(), submission, now);

        self.audit.append(
            &evidence_id,
            now,
            AuditEvent::CaseCreated {
                category: case.category,
                organization: case.organization.clone(),
                stake: case.stake,
            },
        );
        info!(
            evidence_id = %evidence_id,
            category = %case.category,
            stake = %case.stake,
            "case created"
        );
        locks::write(&self.cases).insert(
            evidence_id.clone(),
            Arc::new(Mutex::new(CaseRecord::new(case))),
        );
        self.stats.increment("cases_created");
        Ok(evidence_id)
    }

    /// Withdraw a case that has not entered verification. The stake is refunded.
    pub fn withdraw_case(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        let handle = self.handle(evidence_id)?;
        let mut record = locks::lock(&handle);
        if record.withdrawn {
            return Err(VerificationError::UnknownEvidence(evidence_id.clone()));
        }
        if record.case.status != CaseStatus::Pending {
            return Err(VerificationError::InvalidStatus {
                evidence_id: evidence_id.clone(),
                status: record.case.status,
                operation: "withdraw",
            });
        }
        record.withdrawn = true;
        locks::write(&self.cases).remove(evidence_id);

        let stake = record.case.stake;
        self.audit
            .append(evidence_id, now, AuditEvent::CaseWithdrawn { stake });
        self.issue(
            evidence_id,
            EscrowCommand::Refund {
                evidence_id: evidence_id.clone(),
                recipient: record.case.submitter.clone(),
                amount: stake,
            },
            now,
        );
        self.stats.increment("cases_withdrawn");
        info!(evidence_id = %evidence_id, stake = %stake, "case withdrawn");
        Ok(())
    }

    // ── Assignment ───────────────────────────────────────────────────────

    /// PENDING → UNDER_VERIFICATION: draw inspectors and open the first session.
    pub fn begin_verification(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<AssignmentOutcome, VerificationError> {
        self.with_record(evidence_id, Some(now), |record| {
            if record.case.status != CaseStatus::Pending {
                return Err(VerificationError::InvalidStatus {
                    evidence_id: evidence_id.clone(),
                    status: record.case.status,
                    operation: "begin verification",
                });
            }
            self.assign_round(record, now)
        })
    }

    /// Open a fresh round for a DISPUTED case, drawing an independent subset.
    pub fn reassign(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<AssignmentOutcome, VerificationError> {
        self.with_record(evidence_id, Some(now), |record| {
            if record.case.status != CaseStatus::Disputed {
                return Err(VerificationError::InvalidStatus {
                    evidence_id: evidence_id.clone(),
                    status: record.case.status,
                    operation: "reassign",
                });
            }
            self.assign_round(record, now)
        })
    }

    fn assign_round(
        &self,
        record: &mut CaseRecord,
        now: Timestamp,
    ) -> Result<AssignmentOutcome, VerificationError> {
        let evidence_id = record.case.evidence_id.clone();
        let category = record.case.category;
        let round = record.round + 1;
        let required = self.params.sample_size(category);

        let mut eligible = self.registry.get_eligible(category);
        if self.params.no_show_exclusion {
            eligible.retain(|inspector| !record.unresponsive.contains(inspector));
        }
        let context = assignment_context(&evidence_id, round);

        match self
            .selector
            .select(self.vrf.as_ref(), &eligible, &context, required)
        {
            Ok(Selection {
                inspectors,
                randomness,
            }) => {
                self.transition(record, CaseStatus::UnderVerification, now)?;
                let policy = self.params.policy(category);
                let seed = randomness.value;
                let session = VerificationSession::open(
                    evidence_id.clone(),
                    inspectors.clone(),
                    now,
                    policy.commit_window_secs,
                    policy.reveal_window_secs,
                    AssignmentRecord {
                        round,
                        context,
                        seed,
                        proof: randomness.proof,
                        vrf_round: randomness.round,
                        eligible,
                        assigned_at: now,
                    },
                );
                let commit_deadline = session.commit_deadline;
                record.round = round;
                if let Some(previous) = record.session.replace(session) {
                    record.archived.push(previous);
                }

                self.audit.append(
                    &evidence_id,
                    now,
                    AuditEvent::InspectorsAssigned {
                        round,
                        inspectors: inspectors.clone(),
                        commit_deadline,
                        seed,
                    },
                );
                self.stats.increment("assignments");
                info!(
                    evidence_id = %evidence_id,
                    round,
                    inspectors = ?inspectors,
                    commit_window = %format_duration(policy.commit_window_secs),
                    "inspectors assigned"
                );
                Ok(AssignmentOutcome::Assigned {
                    round,
                    inspectors,
                    commit_deadline,
                })
            }
            Err(VerificationError::InsufficientInspectors { eligible, required }) => {
                self.transition(record, CaseStatus::Disputed, now)?;
                record.round = round;
                if let Some(previous) = record.session.take() {
                    record.archived.push(previous);
                }
                self.audit.append(
                    &evidence_id,
                    now,
                    AuditEvent::AssignmentHeld {
                        round,
                        eligible,
                        required,
                    },
                );
                self.stats.increment("assignments_held");
                warn!(
                    evidence_id = %evidence_id,
                    round,
                    eligible,
                    required,
                    "not enough eligible inspectors, case held"
                );
                Ok(AssignmentOutcome::Held {
                    round,
                    eligible,
                    required,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Re-check the published draw of the current round.
    pub fn verify_assignment(&self, evidence_id: &EvidenceId) -> Result<bool, VerificationError> {
        self.with_record(evidence_id, None, |record| {
            let session = record.session_mut()?;
            let assignment = &session.assignment;
            let selection = Selection {
                inspectors: session.assigned.clone(),
                randomness: RandomOutput {
                    value: assignment.seed,
                    proof: assignment.proof.clone(),
                    round: assignment.vrf_round,
                },
            };
            self.selector.verify(
                self.vrf.as_ref(),
                &assignment.eligible,
                &assignment.context,
                &selection,
            )
        })
    }

    // ── Commit / reveal ──────────────────────────────────────────────────

    pub fn submit_commit(
        &self,
        evidence_id: &EvidenceId,
        inspector: &InspectorAddress,
        hash: CommitHash,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.with_record(evidence_id, Some(now), |record| {
            let session = record.session_mut()?;
            session.submit_commit(inspector, hash, now)?;
            let round = session.round;
            self.audit.append(
                evidence_id,
                now,
                AuditEvent::CommitAccepted {
                    round,
                    inspector: inspector.clone(),
                },
            );
            self.stats.increment("commits_accepted");
            debug!(evidence_id = %evidence_id, inspector = %inspector, round, "commit accepted");
            Ok(())
        })
    }

    /// COMMIT → REVEAL. Returns the reveal deadline.
    pub fn advance_to_reveal(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<Timestamp, VerificationError> {
        self.with_record(evidence_id, None, |record| {
            let before = record.session_mut()?.phase;
            self.apply_expiry(record, now);

            let session = record.session_mut()?;
            if before == SessionPhase::Commit && session.phase != SessionPhase::Commit {
                // The deadline had already passed; the expiry above did the advance.
                return Ok(session.reveal_deadline.unwrap_or(session.commit_deadline));
            }
            let round = session.round;
            let change = session.advance_to_reveal(now)?;
            let reveal_deadline = match &change {
                PhaseChange::RevealOpened {
                    reveal_deadline, ..
                } => *reveal_deadline,
                PhaseChange::Finalized { at, .. } => *at,
            };
            self.note_phase_change(record, round, &change);
            Ok(reveal_deadline)
        })
    }

    pub fn submit_reveal(
        &self,
        evidence_id: &EvidenceId,
        inspector: &InspectorAddress,
        verdict: Verdict,
        nonce: &str,
        justification: &str,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.with_record(evidence_id, Some(now), |record| {
            let session = record.session_mut()?;
            let round = session.round;
            match session.submit_reveal(inspector, verdict, nonce, justification, now) {
                Ok(()) => {
                    self.audit.append(
                        evidence_id,
                        now,
                        AuditEvent::RevealAccepted {
                            round,
                            inspector: inspector.clone(),
                            verdict,
                        },
                    );
                    self.stats.increment("reveals_accepted");
                    debug!(
                        evidence_id = %evidence_id,
                        inspector = %inspector,
                        verdict = %verdict,
                        "reveal accepted"
                    );
                    Ok(())
                }
                Err(VerificationError::CommitMismatch(who)) => {
                    record.unresponsive.insert(who.clone());
                    self.audit.append(
                        evidence_id,
                        now,
                        AuditEvent::RevealRejected {
                            round,
                            inspector: who.clone(),
                        },
                    );
                    self.stats.increment("reveal_mismatches");
                    warn!(
                        evidence_id = %evidence_id,
                        inspector = %who,
                        round,
                        "reveal does not match commitment, recorded as abstention"
                    );
                    Err(VerificationError::CommitMismatch(who))
                }
                Err(e) => Err(e),
            }
        })
    }

    /// REVEAL → FINALIZED. Returns the tally.
    pub fn finalize(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<TallyResult, VerificationError> {
        self.with_record(evidence_id, None, |record| {
            let before = record.session_mut()?.phase;
            self.apply_expiry(record, now);

            let rule = self.quorum_rule();
            let session = record.session_mut()?;
            if before != SessionPhase::Finalized && session.phase == SessionPhase::Finalized {
                if let Some(tally) = session.tally {
                    return Ok(tally);
                }
            }
            let round = session.round;
            let change = session.finalize(now, &rule)?;
            let tally = match &change {
                PhaseChange::Finalized { tally, .. } => *tally,
                PhaseChange::RevealOpened { .. } => {
                    return Err(VerificationError::PhaseMismatch {
                        expected: SessionPhase::Finalized,
                        actual: SessionPhase::Reveal,
                    })
                }
            };
            self.note_phase_change(record, round, &change);
            Ok(tally)
        })
    }

    // ── Resolution ───────────────────────────────────────────────────────

    /// Turn the finalized tally of the current round into a stake disposition.
    ///
    /// Exactly once per round: a second call fails with `AlreadyResolved` and
    /// changes nothing.
    pub fn resolve(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<Resolution, VerificationError> {
        self.with_record(evidence_id, Some(now), |record| {
            if record.current_resolution().is_some() || record.case.status.is_settled() {
                return Err(VerificationError::AlreadyResolved(evidence_id.clone()));
            }
            let session = record.session_mut()?;
            let tally = match (session.phase, session.tally) {
                (SessionPhase::Finalized, Some(tally)) => tally,
                (actual, _) => {
                    return Err(VerificationError::PhaseMismatch {
                        expected: SessionPhase::Finalized,
                        actual,
                    })
                }
            };
            let round = session.round;
            let changes = reputation_changes(session, &tally, &self.params.reputation);
            if record.case.status != CaseStatus::UnderVerification {
                return Err(VerificationError::InvalidStatus {
                    evidence_id: evidence_id.clone(),
                    status: record.case.status,
                    operation: "resolve",
                });
            }

            let stake_action = stake_action_for(&tally);
            let resolution = Resolution {
                evidence_id: evidence_id.clone(),
                round,
                final_verdict: tally.verdict,
                outcome: tally.outcome,
                consensus_ratio: tally.ratio,
                stake_action,
                resolved_at: now,
            };

            match stake_action {
                StakeAction::Refunded => {
                    self.transition(record, CaseStatus::Verified, now)?;
                    self.transition(record, CaseStatus::Resolved, now)?;
                }
                StakeAction::Forfeited => {
                    self.transition(record, CaseStatus::Rejected, now)?;
                    self.transition(record, CaseStatus::Resolved, now)?;
                }
                StakeAction::Held => self.transition(record, CaseStatus::Disputed, now)?,
            }
            record.resolutions.push(resolution.clone());
            self.audit.append(
                evidence_id,
                now,
                AuditEvent::Resolved {
                    round,
                    verdict: tally.verdict,
                    stake_action,
                },
            );
            self.apply_reputation(evidence_id, &changes, now);
            self.settle_stake(record, &tally, stake_action, now);

            self.stats.increment("cases_resolved");
            info!(
                evidence_id = %evidence_id,
                round,
                verdict = %tally.verdict,
                outcome = ?tally.outcome,
                ratio = %tally.ratio,
                stake_action = %stake_action,
                "case resolved"
            );
            Ok(resolution)
        })
    }

    fn apply_reputation(
        &self,
        evidence_id: &EvidenceId,
        changes: &[ReputationChange],
        now: Timestamp,
    ) {
        for change in changes {
            if change.counts_as_inspection() {
                let agreed = change.reason == ReputationReason::Agreed;
                if let Err(e) = self.registry.record_inspection(&change.inspector, agreed) {
                    warn!(inspector = %change.inspector, "failed to record inspection: {e}");
                }
            }
            if change.delta == 0.0 {
                continue;
            }
            match self
                .registry
                .update_reputation(&change.inspector, change.delta)
            {
                Ok(score) => {
                    self.audit.append(
                        evidence_id,
                        now,
                        AuditEvent::ReputationAdjusted {
                            inspector: change.inspector.clone(),
                            reason: change.reason,
                            delta: change.delta,
                            score,
                        },
                    );
                }
                Err(e) => {
                    warn!(inspector = %change.inspector, "failed to update reputation: {e}");
                }
            }
        }
    }

    fn settle_stake(
        &self,
        record: &mut CaseRecord,
        tally: &TallyResult,
        stake_action: StakeAction,
        now: Timestamp,
    ) {
        let case = &record.case;
        let evidence_id = &case.evidence_id;
        match stake_action {
            StakeAction::Refunded => {
                let policy = self.params.policy(case.category);
                let amount = compute_bounty(policy, tally.ratio);
                let payout = BountyPayout {
                    evidence_id: evidence_id.clone(),
                    recipient: case.submitter.clone(),
                    amount,
                    basis: BountyBasis {
                        category: case.category,
                        base: policy.bounty_base,
                        max: policy.bounty_max,
                        consensus: tally.ratio,
                        stake_refund: case.stake,
                    },
                };
                self.audit.append(
                    evidence_id,
                    now,
                    AuditEvent::BountyScheduled {
                        recipient: payout.recipient.clone(),
                        amount,
                    },
                );
                self.issue(
                    evidence_id,
                    EscrowCommand::Refund {
                        evidence_id: evidence_id.clone(),
                        recipient: case.submitter.clone(),
                        amount: case.stake,
                    },
                    now,
                );
                self.issue(
                    evidence_id,
                    EscrowCommand::PayBounty {
                        evidence_id: evidence_id.clone(),
                        recipient: case.submitter.clone(),
                        amount,
                    },
                    now,
                );
                record.payout = Some(payout);
            }
            StakeAction::Forfeited => {
                self.issue(
                    evidence_id,
                    EscrowCommand::Forfeit {
                        evidence_id: evidence_id.clone(),
                        amount: case.stake,
                    },
                    now,
                );
            }
            StakeAction::Held => {
                debug!(evidence_id = %evidence_id, "stake held pending re-verification");
            }
        }
    }

    /// Fire-and-forget: a ledger failure is logged and audited, never propagated.
    fn issue(&self, evidence_id: &EvidenceId, command: EscrowCommand, now: Timestamp) {
        let kind = command.kind();
        let amount = command.amount();
        let accepted = match self.escrow.dispatch(command) {
            Ok(()) => {
                debug!(evidence_id = %evidence_id, %kind, %amount, "escrow command dispatched");
                true
            }
            Err(e) => {
                self.stats.increment("escrow_failures");
                warn!(evidence_id = %evidence_id, %kind, %amount, "escrow dispatch failed: {e}");
                false
            }
        };
        self.audit.append(
            evidence_id,
            now,
            AuditEvent::EscrowCommandIssued {
                kind,
                amount,
                accepted,
            },
        );
    }

    // ── Collaborator callbacks ───────────────────────────────────────────

    /// RESOLVED → PUBLISHED.
    pub fn mark_published(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        self.with_record(evidence_id, None, |record| {
            if record.case.status != CaseStatus::Resolved {
                return Err(VerificationError::InvalidStatus {
                    evidence_id: evidence_id.clone(),
                    status: record.case.status,
                    operation: "publish",
                });
            }
            self.transition(record, CaseStatus::Published, now)?;
            self.audit.append(evidence_id, now, AuditEvent::Published);
            info!(evidence_id = %evidence_id, "case published");
            Ok(())
        })
    }

    /// Record a ledger confirmation. Case state is already terminal and stays as is.
    ///
    /// Each accepted command of a kind may be confirmed once; anything else is an
    /// `UnexpectedReceipt`.
    pub fn confirm_escrow(&self, receipt: EscrowReceipt) -> Result<(), VerificationError> {
        if !self.audit.contains_evidence(&receipt.evidence_id) {
            return Err(VerificationError::UnknownEvidence(receipt.evidence_id));
        }
        let kind = receipt.kind;
        let appended = self.audit.append_if(
            &receipt.evidence_id,
            receipt.confirmed_at,
            AuditEvent::EscrowConfirmed {
                kind,
                reference: receipt.reference.clone(),
            },
            |entries| outstanding_commands(entries, &receipt.evidence_id, kind) > 0,
        );
        if appended.is_none() {
            warn!(
                evidence_id = %receipt.evidence_id,
                kind = %kind,
                reference = %receipt.reference,
                "escrow receipt without an outstanding command"
            );
            return Err(VerificationError::UnexpectedReceipt {
                evidence_id: receipt.evidence_id,
                kind,
            });
        }
        info!(
            evidence_id = %receipt.evidence_id,
            kind = %kind,
            reference = %receipt.reference,
            "escrow confirmed"
        );
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────────

    pub fn case(&self, evidence_id: &EvidenceId) -> Result<EvidenceCase, VerificationError> {
        self.with_record(evidence_id, None, |record| Ok(record.case.clone()))
    }

    /// Snapshot of the current session, after applying expired deadlines.
    pub fn session(
        &self,
        evidence_id: &EvidenceId,
        now: Timestamp,
    ) -> Result<VerificationSession, VerificationError> {
        self.with_record(evidence_id, Some(now), |record| {
            record.session_mut().map(|session| session.clone())
        })
    }

    /// Sessions of earlier rounds, oldest first.
    pub fn archived_sessions(
        &self,
        evidence_id: &EvidenceId,
    ) -> Result<Vec<VerificationSession>, VerificationError> {
        self.with_record(evidence_id, None, |record| Ok(record.archived.clone()))
    }

    /// Resolution of the current round, if resolved.
    pub fn resolution(
        &self,
        evidence_id: &EvidenceId,
    ) -> Result<Option<Resolution>, VerificationError> {
        self.with_record(evidence_id, None, |record| {
            Ok(record.current_resolution().cloned())
        })
    }

    /// Every resolution of every round, oldest first.
    pub fn resolution_history(
        &self,
        evidence_id: &EvidenceId,
    ) -> Result<Vec<Resolution>, VerificationError> {
        self.with_record(evidence_id, None, |record| Ok(record.resolutions.clone()))
    }

    pub fn payout(
        &self,
        evidence_id: &EvidenceId,
    ) -> Result<Option<BountyPayout>, VerificationError> {
        self.with_record(evidence_id, None, |record| Ok(record.payout.clone()))
    }

    /// Evidence ids whose current session has `inspector` assigned, sorted.
    pub fn inspector_cases(&self, inspector: &InspectorAddress) -> Vec<EvidenceId> {
        let mut ids: Vec<EvidenceId> = self
            .handles()
            .iter()
            .filter_map(|handle| {
                let record = locks::lock(handle);
                let assigned = record
                    .session
                    .as_ref()
                    .is_some_and(|session| session.is_assigned(inspector));
                if assigned && !record.withdrawn {
                    Some(record.case.evidence_id.clone())
                } else {
                    None
                }
            })
            .collect();
        ids.sort();
        ids
    }

    /// Apply every passed deadline. Returns the number of phase transitions made.
    pub fn sweep_expired(&self, now: Timestamp) -> usize {
        let mut transitions = 0;
        for handle in self.handles() {
            let mut record = locks::lock(&handle);
            if !record.withdrawn {
                transitions += self.apply_expiry(&mut *record, now);
            }
        }
        if transitions > 0 {
            debug!(transitions, now = %now, "deadline sweep applied transitions");
        }
        transitions
    }

    pub fn stats(&self) -> HashMap<&'static str, u64> {
        self.stats.snapshot()
    }

    pub fn resolution_stats(&self) -> ResolutionStats {
        let mut stats = ResolutionStats::default();
        for handle in self.handles() {
            let record = locks::lock(&handle);
            for resolution in &record.resolutions {
                match resolution.stake_action {
                    StakeAction::Refunded => {
                        stats.refunded += 1;
                        stats.refunded_stake =
                            stats.refunded_stake.saturating_add(record.case.stake);
                    }
                    StakeAction::Forfeited => {
                        stats.forfeited += 1;
                        stats.forfeited_stake =
                            stats.forfeited_stake.saturating_add(record.case.stake);
                    }
                    StakeAction::Held => stats.held += 1,
                }
            }
            if let Some(payout) = &record.payout {
                stats.bounties = stats.bounties.saturating_add(payout.amount);
            }
        }
        stats
    }

    pub fn len(&self) -> usize {
        locks::read(&self.cases).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Internals ────────────────────────────────────────────────────────

    fn handle(&self, evidence_id: &EvidenceId) -> Result<Arc<Mutex<CaseRecord>>, VerificationError> {
        locks::read(&self.cases)
            .get(evidence_id)
            .cloned()
            .ok_or_else(|| VerificationError::UnknownEvidence(evidence_id.clone()))
    }

    fn handles(&self) -> Vec<Arc<Mutex<CaseRecord>>> {
        locks::read(&self.cases).values().cloned().collect()
    }

    /// Run `f` under the case lock, after applying deadlines passed at `now`.
    fn with_record<R>(
        &self,
        evidence_id: &EvidenceId,
        now: Option<Timestamp>,
        f: impl FnOnce(&mut CaseRecord) -> Result<R, VerificationError>,
    ) -> Result<R, VerificationError> {
        let handle = self.handle(evidence_id)?;
        let mut record = locks::lock(&handle);
        if record.withdrawn {
            return Err(VerificationError::UnknownEvidence(evidence_id.clone()));
        }
        if let Some(now) = now {
            self.apply_expiry(&mut *record, now);
        }
        f(&mut *record)
    }

    fn apply_expiry(&self, record: &mut CaseRecord, now: Timestamp) -> usize {
        let rule = self.quorum_rule();
        let Some(session) = record.session.as_mut() else {
            return 0;
        };
        let round = session.round;
        let changes = session.expire(now, &rule);
        for change in &changes {
            self.note_phase_change(record, round, change);
        }
        changes.len()
    }

    fn note_phase_change(&self, record: &mut CaseRecord, round: u32, change: &PhaseChange) {
        let evidence_id = &record.case.evidence_id;
        match change {
            PhaseChange::RevealOpened {
                at,
                reveal_deadline,
                abstentions,
            } => {
                info!(
                    evidence_id = %evidence_id,
                    round,
                    reveal_deadline = %reveal_deadline,
                    abstentions = abstentions.len(),
                    "reveal phase opened"
                );
                self.audit.append(
                    evidence_id,
                    *at,
                    AuditEvent::RevealPhaseOpened {
                        round,
                        reveal_deadline: *reveal_deadline,
                        abstentions: abstentions.clone(),
                    },
                );
                record.unresponsive.extend(abstentions.iter().cloned());
            }
            PhaseChange::Finalized {
                at,
                abstentions,
                tally,
            } => {
                info!(
                    evidence_id = %evidence_id,
                    round,
                    outcome = ?tally.outcome,
                    verdict = %tally.verdict,
                    ratio = %tally.ratio,
                    "session finalized"
                );
                self.audit.append(
                    evidence_id,
                    *at,
                    AuditEvent::SessionFinalized {
                        round,
                        outcome: tally.outcome,
                        verdict: tally.verdict,
                        agreeing: tally.ratio.numerator,
                        valid_reveals: tally.ratio.denominator,
                        abstentions: abstentions.clone(),
                    },
                );
                self.stats.increment("sessions_finalized");
                record.unresponsive.extend(abstentions.iter().cloned());
            }
        }
    }

    fn transition(
        &self,
        record: &mut CaseRecord,
        to: CaseStatus,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        let from = record.case.status;
        if from == to {
            return Ok(());
        }
        if !from.can_transition_to(to) {
            return Err(VerificationError::InvalidStatus {
                evidence_id: record.case.evidence_id.clone(),
                status: from,
                operation: "change status",
            });
        }
        record.case.status = to;
        record.case.updated_at = now;
        self.audit.append(
            &record.case.evidence_id,
            now,
            AuditEvent::StatusChanged { from, to },
        );
        debug!(evidence_id = %record.case.evidence_id, %from, %to, "status changed");
        Ok(())
    }
}

/// Accepted commands of `kind` for `evidence_id` not yet matched by a confirmation.
fn outstanding_commands(
    entries: &[AuditEntry],
    evidence_id: &EvidenceId,
    kind: EscrowCommandKind,
) -> usize {
    let (issued, confirmed) = entries
        .iter()
        .filter(|e| &e.evidence_id == evidence_id)
        .fold((0usize, 0usize), |(issued, confirmed), e| match &e.event {
            AuditEvent::EscrowCommandIssued {
                kind: k,
                accepted: true,
                ..
            } if *k == kind => (issued + 1, confirmed),
            AuditEvent::EscrowConfirmed { kind: k, .. } if *k == kind => (issued, confirmed + 1),
            _ => (issued, confirmed),
        });
    issued.saturating_sub(confirmed)
}
