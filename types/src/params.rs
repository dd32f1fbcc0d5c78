//! Engine parameters: quorum, windows, stakes, bounties and reputation policy.
//!
//! Every field has a default so a partial TOML file is enough to configure the engine.
//! Thresholds are stored in basis points so quorum checks stay in exact integer
//! arithmetic.

use crate::amount::Amount;
use crate::error::WhistleError;
use crate::evidence::Category;
use serde::{Deserialize, Serialize};

/// Basis-point scale: 10_000 bps = 100%.
pub const BPS_SCALE: u64 = 10_000;

const HOUR: u64 = 3600;

/// The hard floor on inspectors per session, regardless of configuration.
pub const MIN_INSPECTORS_FLOOR: u32 = 3;

/// All tunable values of the verification and resolution engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    // ── Verification ─────────────────────────────────────────────────────
    /// Minimum inspectors assigned per session (never below 3).
    pub min_inspectors: u32,

    /// Fraction (basis points, 6700 = 67%) of valid reveals the winning verdict needs.
    pub quorum_bps: u32,

    /// Minimum valid reveals for an authoritative verdict, whatever the ratio.
    pub min_valid_reveals: u32,

    /// Exclude inspectors who abstained or mismatched in an earlier round of the same
    /// evidence when re-assigning.
    pub no_show_exclusion: bool,

    // ── Stakes ───────────────────────────────────────────────────────────
    /// Largest stake (raw units) a submitter may lock for one case.
    pub max_stake: Amount,

    /// Per-category windows, stakes and bounty schedule.
    pub categories: CategoryTable,

    /// Reputation deltas applied at resolution.
    pub reputation: ReputationPolicy,
}

/// Per-category policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Length of the COMMIT phase.
    pub commit_window_secs: u64,
    /// Length of the REVEAL phase; shorter than the commit window.
    pub reveal_window_secs: u64,
    /// Category-specific inspector minimum (combined with the global one).
    pub min_inspectors: u32,
    /// Smallest stake accepted for this category.
    pub min_stake: Amount,
    /// Bounty paid at the weakest qualifying consensus.
    pub bounty_base: Amount,
    /// Bounty ceiling, reached at unanimous consensus.
    pub bounty_max: Amount,
}

impl CategoryPolicy {
    fn with_window(commit_hours: u64, min_stake: u64, base: u64, max: u64) -> Self {
        Self {
            commit_window_secs: commit_hours * HOUR,
            reveal_window_secs: 24 * HOUR,
            min_inspectors: MIN_INSPECTORS_FLOOR,
            min_stake: Amount::new(min_stake),
            bounty_base: Amount::new(base),
            bounty_max: Amount::new(max),
        }
    }
}

/// One policy per category, laid out as `[categories.<name>]` tables in TOML.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryTable {
    pub financial: CategoryPolicy,
    pub construction: CategoryPolicy,
    pub food: CategoryPolicy,
    pub academic: CategoryPolicy,
}

impl CategoryTable {
    pub fn get(&self, category: Category) -> &CategoryPolicy {
        match category {
            Category::Financial => &self.financial,
            Category::Construction => &self.construction,
            Category::Food => &self.food,
            Category::Academic => &self.academic,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryPolicy {
        match category {
            Category::Financial => &mut self.financial,
            Category::Construction => &mut self.construction,
            Category::Food => &mut self.food,
            Category::Academic => &mut self.academic,
        }
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self {
            financial: CategoryPolicy::with_window(72, 25, 100, 200),
            construction: CategoryPolicy::with_window(168, 50, 150, 300), // physical inspection
            food: CategoryPolicy::with_window(48, 25, 75, 150),
            academic: CategoryPolicy::with_window(72, 15, 50, 100),
        }
    }
}

/// Reputation deltas. Scores live in `[0, 1]`.
///
/// Suspected manipulation (abstaining, mismatched reveals) costs more than honest
/// disagreement with the majority.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReputationPolicy {
    pub initial_score: f64,
    pub agreement_reward: f64,
    pub minority_penalty: f64,
    pub abstention_penalty: f64,
    pub mismatch_penalty: f64,
}

impl Default for ReputationPolicy {
    fn default() -> Self {
        Self {
            initial_score: 0.5,
            agreement_reward: 0.02,
            minority_penalty: 0.03,
            abstention_penalty: 0.08,
            mismatch_penalty: 0.12,
        }
    }
}

impl EngineParams {
    /// Number of inspectors to draw for `category`.
    pub fn sample_size(&self, category: Category) -> usize {
        self.min_inspectors
            .max(self.categories.get(category).min_inspectors)
            .max(MIN_INSPECTORS_FLOOR) as usize
    }

    pub fn policy(&self, category: Category) -> &CategoryPolicy {
        self.categories.get(category)
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), WhistleError> {
        let invalid =
            |msg: String| -> Result<(), WhistleError> { Err(WhistleError::InvalidParams(msg)) };

        if self.quorum_bps == 0 || u64::from(self.quorum_bps) > BPS_SCALE {
            return invalid(format!("quorum_bps {} outside (0, 10000]", self.quorum_bps));
        }
        if self.min_inspectors < MIN_INSPECTORS_FLOOR {
            return invalid(format!(
                "min_inspectors {} below floor {MIN_INSPECTORS_FLOOR}",
                self.min_inspectors
            ));
        }
        if self.min_valid_reveals == 0 {
            return invalid("min_valid_reveals must be positive".into());
        }
        for category in Category::ALL {
            let p = self.categories.get(category);
            if p.commit_window_secs == 0 {
                return invalid(format!("{category}: commit window is zero"));
            }
            if p.reveal_window_secs == 0 || p.reveal_window_secs >= p.commit_window_secs {
                return invalid(format!(
                    "{category}: reveal window must be positive and shorter than the commit window"
                ));
            }
            if p.bounty_base > p.bounty_max {
                return invalid(format!("{category}: bounty base exceeds bounty max"));
            }
            if p.min_stake > self.max_stake {
                return invalid(format!("{category}: minimum stake exceeds max_stake"));
            }
        }
        let r = &self.reputation;
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if ![
            r.initial_score,
            r.agreement_reward,
            r.minority_penalty,
            r.abstention_penalty,
            r.mismatch_penalty,
        ]
        .into_iter()
        .all(in_unit)
        {
            return invalid("reputation values must lie in [0, 1]".into());
        }
        if !(r.minority_penalty < r.abstention_penalty
            && r.abstention_penalty <= r.mismatch_penalty)
        {
            return invalid("penalties must order minority < abstention <= mismatch".into());
        }
        Ok(())
    }
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            min_inspectors: MIN_INSPECTORS_FLOOR,
            quorum_bps: 6700, // 67%
            min_valid_reveals: 3,
            no_show_exclusion: true,
            max_stake: Amount::new(500),
            categories: CategoryTable::default(),
            reputation: ReputationPolicy::default(),
        }
    }
}
