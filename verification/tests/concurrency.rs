//! Concurrent access to one engine from many threads.

use std::sync::Arc;
use std::thread;

use whistle_crypto::commit_verdict;
use whistle_nullables::{NullEscrow, NullRandom};
use whistle_types::{
    Amount, CaseStatus, Category, EngineParams, EvidenceId, InspectorAddress, Timestamp, Verdict,
    WalletRef,
};
use whistle_verification::{
    AssignmentOutcome, CaseSubmission, InspectorProfile, InspectorRegistry, VerificationEngine,
    VerificationError,
};

const HOUR: u64 = 3_600;

fn engine(inspectors: usize) -> Arc<VerificationEngine> {
    let registry = Arc::new(InspectorRegistry::default());
    for i in 0..inspectors {
        registry
            .register(
                InspectorAddress::new(format!("insp-{i:02}")),
                InspectorProfile::new(format!("Inspector {i}"), [Category::Food]),
                Timestamp::EPOCH,
            )
            .unwrap();
    }
    Arc::new(
        VerificationEngine::new(
            EngineParams::default(),
            registry,
            Arc::new(NullRandom::seeded([3u8; 32])),
            Arc::new(NullEscrow::new()),
        )
        .unwrap(),
    )
}

fn submission() -> CaseSubmission {
    CaseSubmission {
        category: Category::Food,
        organization: "City Canteen".into(),
        stake: Amount::new(25),
        submitter: WalletRef::new("wallet-1"),
    }
}

fn assigned(outcome: AssignmentOutcome) -> Vec<InspectorAddress> {
    match outcome {
        AssignmentOutcome::Assigned { inspectors, .. } => inspectors,
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn concurrent_intake_assigns_unique_ids() {
    let engine = engine(5);
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                (0..25)
                    .map(|_| engine.create_case(submission(), Timestamp::EPOCH).unwrap())
                    .collect::<Vec<EvidenceId>>()
            })
        })
        .collect();

    let mut ids: Vec<EvidenceId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 200);
    assert_eq!(engine.len(), 200);
    assert_eq!(engine.stats()["cases_created"], 200);
}

#[test]
fn racing_commits_from_one_inspector_accept_exactly_one() {
    let engine = engine(3);
    let id = engine.create_case(submission(), Timestamp::EPOCH).unwrap();
    let inspectors = assigned(engine.begin_verification(&id, Timestamp::EPOCH).unwrap());
    let inspector = inspectors[0].clone();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            let inspector = inspector.clone();
            thread::spawn(move || {
                engine.submit_commit(
                    &id,
                    &inspector,
                    commit_verdict(Verdict::Authentic, &format!("nonce-{i}")),
                    Timestamp::new(HOUR),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, VerificationError::AlreadyCommitted(_))));

    let session = engine.session(&id, Timestamp::new(HOUR)).unwrap();
    assert_eq!(session.commits.len(), 1);
}

#[test]
fn racing_resolutions_resolve_exactly_once() {
    let engine = engine(3);
    let id = engine.create_case(submission(), Timestamp::EPOCH).unwrap();
    let inspectors = assigned(engine.begin_verification(&id, Timestamp::EPOCH).unwrap());
    for inspector in &inspectors {
        engine
            .submit_commit(
                &id,
                inspector,
                commit_verdict(Verdict::Fake, inspector.as_str()),
                Timestamp::new(HOUR),
            )
            .unwrap();
    }
    engine.advance_to_reveal(&id, Timestamp::new(2 * HOUR)).unwrap();
    for inspector in &inspectors {
        engine
            .submit_reveal(
                &id,
                inspector,
                Verdict::Fake,
                inspector.as_str(),
                "ipfs://lab-report",
                Timestamp::new(3 * HOUR),
            )
            .unwrap();
    }
    engine.finalize(&id, Timestamp::new(4 * HOUR)).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            let id = id.clone();
            thread::spawn(move || engine.resolve(&id, Timestamp::new(5 * HOUR)))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(engine.case(&id).unwrap().status, CaseStatus::Resolved);
    assert_eq!(engine.resolution_stats().forfeited, 1);
    assert!(engine.audit().verify_chain().is_ok());
}

#[test]
fn independent_cases_progress_in_parallel() {
    let engine = engine(6);
    let ids: Vec<EvidenceId> = (0..12)
        .map(|_| engine.create_case(submission(), Timestamp::EPOCH).unwrap())
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let inspectors =
                    assigned(engine.begin_verification(&id, Timestamp::EPOCH).unwrap());
                for inspector in &inspectors {
                    engine
                        .submit_commit(
                            &id,
                            inspector,
                            commit_verdict(Verdict::Authentic, "n"),
                            Timestamp::new(HOUR),
                        )
                        .unwrap();
                }
                engine.advance_to_reveal(&id, Timestamp::new(2 * HOUR)).unwrap();
                for inspector in &inspectors {
                    engine
                        .submit_reveal(
                            &id,
                            inspector,
                            Verdict::Authentic,
                            "n",
                            "ipfs://r",
                            Timestamp::new(3 * HOUR),
                        )
                        .unwrap();
                }
                engine.finalize(&id, Timestamp::new(4 * HOUR)).unwrap();
                engine.resolve(&id, Timestamp::new(5 * HOUR)).unwrap()
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    let stats = engine.resolution_stats();
    assert_eq!(stats.refunded, 12);
    assert_eq!(stats.refunded_stake, Amount::new(12 * 25));
    assert_eq!(stats.bounties, Amount::new(12 * 150));
    assert!(engine.audit().verify_chain().is_ok());
}
