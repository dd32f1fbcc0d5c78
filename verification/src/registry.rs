//! Inspector registry: who may inspect what, and how much they are trusted.
//!
//! The registry is an injectable service shared by the assignment and resolution
//! steps. Each inspector sits behind its own mutex so concurrent resolutions that
//! touch the same inspector serialize their read-modify-write of the reputation.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use whistle_types::{Category, InspectorAddress, Timestamp};

use crate::error::VerificationError;
use crate::locks;

/// Registration data for an inspector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectorProfile {
    pub name: String,
    pub department: String,
    pub jurisdiction: String,
    pub specializations: BTreeSet<Category>,
}

impl InspectorProfile {
    pub fn new(name: impl Into<String>, specializations: impl IntoIterator<Item = Category>) -> Self {
        Self {
            name: name.into(),
            department: String::new(),
            jurisdiction: String::new(),
            specializations: specializations.into_iter().collect(),
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = jurisdiction.into();
        self
    }
}

/// A registered inspector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inspector {
    pub address: InspectorAddress,
    pub profile: InspectorProfile,
    /// In `[0, 1]`.
    pub reputation: f64,
    /// Sessions in which this inspector cast a valid reveal.
    pub total_inspections: u64,
    /// Valid reveals that matched an authoritative verdict.
    pub consensus_agreements: u64,
    pub active: bool,
    pub registered_at: Timestamp,
}

impl Inspector {
    pub fn specializes_in(&self, category: Category) -> bool {
        self.profile.specializations.contains(&category)
    }
}

pub struct InspectorRegistry {
    inspectors: RwLock<HashMap<InspectorAddress, Mutex<Inspector>>>,
    initial_score: f64,
}

impl InspectorRegistry {
    pub fn new(initial_score: f64) -> Self {
        Self {
            inspectors: RwLock::new(HashMap::new()),
            initial_score: initial_score.clamp(0.0, 1.0),
        }
    }

    pub fn register(
        &self,
        address: InspectorAddress,
        profile: InspectorProfile,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if !address.is_valid() {
            return Err(VerificationError::InvalidProfile(format!(
                "malformed inspector address {address:?}"
            )));
        }
        if profile.specializations.is_empty() {
            return Err(VerificationError::InvalidProfile(
                "specialization set is empty".into(),
            ));
        }

        let mut inspectors = locks::write(&self.inspectors);
        if inspectors.contains_key(&address) {
            return Err(VerificationError::DuplicateInspector(address));
        }
        info!(inspector = %address, specializations = ?profile.specializations, "inspector registered");
        inspectors.insert(
            address.clone(),
            Mutex::new(Inspector {
                address,
                profile,
                reputation: self.initial_score,
                total_inspections: 0,
                consensus_agreements: 0,
                active: true,
                registered_at: now,
            }),
        );
        Ok(())
    }

    /// Active inspectors specialized in `category`, sorted by address.
    pub fn get_eligible(&self, category: Category) -> Vec<InspectorAddress> {
        let inspectors = locks::read(&self.inspectors);
        let mut eligible: Vec<InspectorAddress> = inspectors
            .values()
            .filter_map(|slot| {
                let inspector = locks::lock(slot);
                if inspector.active && inspector.specializes_in(category) {
                    Some(inspector.address.clone())
                } else {
                    None
                }
            })
            .collect();
        eligible.sort();
        eligible
    }

    /// Every inspector (active or not) specialized in `category`, sorted by address.
    pub fn pool(&self, category: Category) -> Vec<Inspector> {
        let inspectors = locks::read(&self.inspectors);
        let mut pool: Vec<Inspector> = inspectors
            .values()
            .map(|slot| locks::lock(slot).clone())
            .filter(|inspector| inspector.specializes_in(category))
            .collect();
        pool.sort_by(|a, b| a.address.cmp(&b.address));
        pool
    }

    pub fn get(&self, address: &InspectorAddress) -> Result<Inspector, VerificationError> {
        self.with_inspector(address, |inspector| inspector.clone())
    }

    /// Add `delta` to the reputation score, clamped to `[0, 1]`. Returns the new score.
    pub fn update_reputation(
        &self,
        address: &InspectorAddress,
        delta: f64,
    ) -> Result<f64, VerificationError> {
        self.with_inspector(address, |inspector| {
            let before = inspector.reputation;
            inspector.reputation = (before + delta).clamp(0.0, 1.0);
            debug!(
                inspector = %address,
                delta,
                before,
                after = inspector.reputation,
                "reputation updated"
            );
            inspector.reputation
        })
    }

    /// Count a valid reveal, and whether it agreed with an authoritative verdict.
    pub fn record_inspection(
        &self,
        address: &InspectorAddress,
        agreed: bool,
    ) -> Result<(), VerificationError> {
        self.with_inspector(address, |inspector| {
            inspector.total_inspections += 1;
            if agreed {
                inspector.consensus_agreements += 1;
            }
        })
    }

    pub fn deactivate(&self, address: &InspectorAddress) -> Result<(), VerificationError> {
        self.with_inspector(address, |inspector| inspector.active = false)?;
        info!(inspector = %address, "inspector deactivated");
        Ok(())
    }

    pub fn reactivate(&self, address: &InspectorAddress) -> Result<(), VerificationError> {
        self.with_inspector(address, |inspector| inspector.active = true)?;
        info!(inspector = %address, "inspector reactivated");
        Ok(())
    }

    pub fn len(&self) -> usize {
        locks::read(&self.inspectors).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_inspector<R>(
        &self,
        address: &InspectorAddress,
        f: impl FnOnce(&mut Inspector) -> R,
    ) -> Result<R, VerificationError> {
        let inspectors = locks::read(&self.inspectors);
        let slot = inspectors
            .get(address)
            .ok_or_else(|| VerificationError::UnknownInspector(address.clone()))?;
        let mut inspector = locks::lock(slot);
        Ok(f(&mut inspector))
    }
}

impl Default for InspectorRegistry {
    fn default() -> Self {
        Self::new(0.5)
    }
}
