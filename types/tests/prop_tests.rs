use proptest::prelude::*;

use whistle_types::{Amount, CommitHash, Ratio, Timestamp, Verdict};

proptest! {
    /// Quorum check by cross-multiplication agrees with rational comparison.
    #[test]
    fn meets_bps_matches_rational_comparison(
        total in 1u32..10_000,
        agreeing_frac in 0.0f64..=1.0,
        bps in 1u32..=10_000,
    ) {
        let agreeing = ((f64::from(total) * agreeing_frac) as u32).min(total);
        let ratio = Ratio::new(agreeing, total);
        let threshold = Ratio::new(bps, 10_000);
        prop_assert_eq!(
            ratio.meets_bps(bps),
            ratio.cmp_value(&threshold) != std::cmp::Ordering::Less
        );
    }

    /// Scaling by a ratio never exceeds the scaled amount.
    #[test]
    fn ratio_scale_bounded(amount in 0u64..u64::MAX, n in 0u32..1_000, extra in 0u32..1_000) {
        let ratio = Ratio::new(n, n + extra);
        prop_assert!(ratio.scale(amount) <= amount);
    }

    /// Only the three defined codes decode to verdicts.
    #[test]
    fn verdict_codes_closed(code in 0u64..1_000) {
        match Verdict::from_code(code) {
            Ok(v) => prop_assert_eq!(v.code(), code),
            Err(_) => prop_assert!(!(1..=3).contains(&code)),
        }
    }

    /// CommitHash bincode serialization roundtrip.
    #[test]
    fn commit_hash_bincode_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let hash = CommitHash::new(bytes);
        let encoded = bincode::serialize(&hash).unwrap();
        let decoded: CommitHash = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// A deadline has passed exactly when now >= deadline.
    #[test]
    fn deadline_has_passed(deadline in 0u64..u64::MAX, now in 0u64..u64::MAX) {
        prop_assert_eq!(
            Timestamp::new(deadline).has_passed(Timestamp::new(now)),
            now >= deadline
        );
    }

    /// Amount: saturating_sub never panics and returns ZERO on underflow.
    #[test]
    fn amount_saturating_sub(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let result = Amount::new(a).saturating_sub(Amount::new(b));
        if b > a {
            prop_assert_eq!(result, Amount::ZERO);
        } else {
            prop_assert_eq!(result, Amount::new(a - b));
        }
    }
}
