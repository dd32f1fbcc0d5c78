//! Consensus tally over valid reveals.
//!
//! All threshold arithmetic is exact: a verdict with `c` of `N` valid reveals reaches
//! quorum iff `c * 10_000 >= quorum_bps * N`.

use serde::{Deserialize, Serialize};
use whistle_types::{EngineParams, Ratio, Verdict};

/// Thresholds for an authoritative verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumRule {
    /// Share of valid reveals the winner needs, in basis points.
    pub quorum_bps: u32,
    /// Fewer valid reveals than this can never be authoritative.
    pub min_valid_reveals: u32,
}

impl QuorumRule {
    pub fn from_params(params: &EngineParams) -> Self {
        Self {
            quorum_bps: params.quorum_bps,
            min_valid_reveals: params.min_valid_reveals,
        }
    }
}

impl Default for QuorumRule {
    fn default() -> Self {
        Self::from_params(&EngineParams::default())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TallyOutcome {
    /// The winning verdict is authoritative.
    Consensus,
    /// A plurality exists but missed the quorum or the reveal floor.
    Disputed,
    /// No valid reveals at all.
    NoQuorum,
}

/// Valid reveals per verdict.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictCounts {
    pub authentic: u32,
    pub fake: u32,
    pub inconclusive: u32,
}

impl VerdictCounts {
    pub fn get(&self, verdict: Verdict) -> u32 {
        match verdict {
            Verdict::Authentic => self.authentic,
            Verdict::Fake => self.fake,
            Verdict::Inconclusive => self.inconclusive,
        }
    }

    fn bump(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Authentic => self.authentic += 1,
            Verdict::Fake => self.fake += 1,
            Verdict::Inconclusive => self.inconclusive += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.authentic + self.fake + self.inconclusive
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    pub outcome: TallyOutcome,
    /// Plurality verdict. Only authoritative when `outcome` is `Consensus`.
    pub verdict: Verdict,
    /// Share of valid reveals agreeing with `verdict`.
    pub ratio: Ratio,
    pub counts: VerdictCounts,
}

impl TallyResult {
    pub fn is_authoritative(&self) -> bool {
        self.outcome == TallyOutcome::Consensus
    }

    /// The verdict if authoritative.
    pub fn authoritative_verdict(&self) -> Option<Verdict> {
        self.is_authoritative().then_some(self.verdict)
    }
}

/// Tally valid reveals.
///
/// Among equal counts the lower verdict code wins.
pub fn tally(verdicts: impl IntoIterator<Item = Verdict>, rule: &QuorumRule) -> TallyResult {
    let mut counts = VerdictCounts::default();
    for verdict in verdicts {
        counts.bump(verdict);
    }

    let total = counts.total();
    if total == 0 {
        return TallyResult {
            outcome: TallyOutcome::NoQuorum,
            verdict: Verdict::Inconclusive,
            ratio: Ratio::ZERO,
            counts,
        };
    }

    let mut winner = Verdict::ALL[0];
    for verdict in Verdict::ALL {
        if counts.get(verdict) > counts.get(winner) {
            winner = verdict;
        }
    }

    let ratio = Ratio::new(counts.get(winner), total);
    let outcome = if total >= rule.min_valid_reveals && ratio.meets_bps(rule.quorum_bps) {
        TallyOutcome::Consensus
    } else {
        TallyOutcome::Disputed
    };

    TallyResult {
        outcome,
        verdict: winner,
        ratio,
        counts,
    }
}
