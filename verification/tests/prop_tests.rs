//! Property-based tests for the verification engine.

use std::sync::Arc;

use proptest::prelude::*;
use whistle_crypto::{commit_verdict, verify_commitment};
use whistle_nullables::{NullEscrow, NullRandom};
use whistle_types::{
    Amount, Category, EngineParams, InspectorAddress, Ratio, StakeAction, Timestamp, Verdict,
    WalletRef,
};
use whistle_verification::{
    tally, AssignmentOutcome, CaseSubmission, InspectorProfile, InspectorRegistry, QuorumRule,
    TallyOutcome, VerificationEngine, VerificationError,
};

const HOUR: u64 = 3_600;

fn arb_verdict() -> impl Strategy<Value = Verdict> {
    prop_oneof![
        Just(Verdict::Authentic),
        Just(Verdict::Fake),
        Just(Verdict::Inconclusive),
    ]
}

fn engine_with(size: usize, seed: [u8; 32]) -> VerificationEngine {
    let mut params = EngineParams::default();
    params.min_inspectors = size as u32;
    let registry = Arc::new(InspectorRegistry::default());
    for i in 0..size {
        registry
            .register(
                InspectorAddress::new(format!("insp-{i}")),
                InspectorProfile::new(format!("n{i}"), [Category::Academic]),
                Timestamp::EPOCH,
            )
            .unwrap();
    }
    VerificationEngine::new(
        params,
        registry,
        Arc::new(NullRandom::seeded(seed)),
        Arc::new(NullEscrow::new()),
    )
    .unwrap()
}

fn submission() -> CaseSubmission {
    CaseSubmission {
        category: Category::Academic,
        organization: "State University".into(),
        stake: Amount::new(15),
        submitter: WalletRef::new("wallet-p"),
    }
}

proptest! {
    /// A commitment opens only with the verdict and nonce it was made from.
    #[test]
    fn commitment_binds_verdict_and_nonce(
        verdict in arb_verdict(),
        other in arb_verdict(),
        nonce in "[a-z0-9]{1,24}",
        other_nonce in "[a-z0-9]{1,24}",
    ) {
        let hash = commit_verdict(verdict, &nonce);
        prop_assert!(verify_commitment(&hash, verdict, &nonce));
        if other != verdict {
            prop_assert!(!verify_commitment(&hash, other, &nonce));
        }
        if other_nonce != nonce {
            prop_assert!(!verify_commitment(&hash, verdict, &other_nonce));
        }
    }

    /// Consensus exactly when N >= 3 and the winner clears the quorum.
    #[test]
    fn tally_matches_quorum_rule(verdicts in prop::collection::vec(arb_verdict(), 0..12)) {
        let rule = QuorumRule::default();
        let result = tally(verdicts.iter().copied(), &rule);
        let n = verdicts.len() as u64;
        if n == 0 {
            prop_assert_eq!(result.outcome, TallyOutcome::NoQuorum);
            return Ok(());
        }
        let count = |v: Verdict| verdicts.iter().filter(|x| **x == v).count() as u64;
        let best = Verdict::ALL.iter().map(|v| count(*v)).max().unwrap_or(0);
        prop_assert_eq!(count(result.verdict), best);
        // Ties go to the lower code.
        for v in Verdict::ALL {
            if count(v) == best {
                prop_assert!(result.verdict.code() <= v.code());
            }
        }
        let qualifies = n >= u64::from(rule.min_valid_reveals)
            && best * 10_000 >= u64::from(rule.quorum_bps) * n;
        prop_assert_eq!(result.outcome == TallyOutcome::Consensus, qualifies);
        prop_assert_eq!(result.ratio, Ratio::new(best as u32, n as u32));
    }

    /// Whatever order inspectors act in, each gets one commit and the stake
    /// disposition follows the tally.
    #[test]
    fn full_round_follows_the_tally(
        votes in prop::collection::vec(arb_verdict(), 3..7),
        repeats in prop::collection::vec(any::<bool>(), 7),
        seed in any::<[u8; 32]>(),
    ) {
        let engine = engine_with(votes.len(), seed);
        let id = engine.create_case(submission(), Timestamp::EPOCH).unwrap();
        let inspectors = match engine.begin_verification(&id, Timestamp::EPOCH).unwrap() {
            AssignmentOutcome::Assigned { inspectors, .. } => inspectors,
            other => return Err(TestCaseError::fail(format!("unexpected {other:?}"))),
        };
        prop_assert_eq!(inspectors.len(), votes.len());

        for (i, (inspector, verdict)) in inspectors.iter().zip(&votes).enumerate() {
            let hash = commit_verdict(*verdict, inspector.as_str());
            engine.submit_commit(&id, inspector, hash, Timestamp::new(HOUR)).unwrap();
            if repeats[i] {
                let again = engine.submit_commit(&id, inspector, hash, Timestamp::new(HOUR));
                prop_assert_eq!(again, Err(VerificationError::AlreadyCommitted(inspector.clone())));
            }
        }
        engine.advance_to_reveal(&id, Timestamp::new(2 * HOUR)).unwrap();
        for (inspector, verdict) in inspectors.iter().zip(&votes) {
            engine
                .submit_reveal(&id, inspector, *verdict, inspector.as_str(), "doi:10/x", Timestamp::new(3 * HOUR))
                .unwrap();
        }
        let result = engine.finalize(&id, Timestamp::new(4 * HOUR)).unwrap();
        prop_assert_eq!(result, tally(votes.iter().copied(), &QuorumRule::from_params(engine.params())));

        let resolution = engine.resolve(&id, Timestamp::new(5 * HOUR)).unwrap();
        let expected = match (result.outcome, result.verdict) {
            (TallyOutcome::Consensus, Verdict::Authentic) => StakeAction::Refunded,
            (TallyOutcome::Consensus, Verdict::Fake) => StakeAction::Forfeited,
            _ => StakeAction::Held,
        };
        prop_assert_eq!(resolution.stake_action, expected);
        prop_assert!(engine.audit().verify_chain().is_ok());
    }
}
