#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use whistle_types::{Ratio, Verdict};
use whistle_verification::{tally, QuorumRule, TallyOutcome};

#[derive(Debug, Arbitrary)]
struct Input {
    codes: Vec<u8>,
    quorum_bps: u16,
    min_valid_reveals: u8,
}

fuzz_target!(|input: Input| {
    let verdicts: Vec<Verdict> = input
        .codes
        .iter()
        .filter_map(|c| Verdict::from_code(u64::from(c % 4)).ok())
        .collect();
    let rule = QuorumRule {
        quorum_bps: u32::from(input.quorum_bps % 10_001).max(1),
        min_valid_reveals: u32::from(input.min_valid_reveals).max(1),
    };

    let result = tally(verdicts.iter().copied(), &rule);
    assert_eq!(result.counts.total() as usize, verdicts.len());
    if verdicts.is_empty() {
        assert_eq!(result.outcome, TallyOutcome::NoQuorum);
        assert_eq!(result.ratio, Ratio::ZERO);
    } else {
        assert!(result.ratio.numerator <= result.ratio.denominator);
        if result.outcome == TallyOutcome::Consensus {
            assert!(result.ratio.meets_bps(rule.quorum_bps));
            assert!(result.counts.total() >= rule.min_valid_reveals);
        }
    }
});
