//! Fundamental types for the WhistleChain verification engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! identities, evidence categories and statuses, verdicts, amounts, commitment hashes,
//! exact ratios, timestamps and the engine parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod evidence;
pub mod hash;
pub mod params;
pub mod ratio;
pub mod state;
pub mod time;
pub mod verdict;

pub use address::{InspectorAddress, WalletRef};
pub use amount::Amount;
pub use error::WhistleError;
pub use evidence::{Category, EvidenceId};
pub use hash::CommitHash;
pub use params::{CategoryPolicy, CategoryTable, EngineParams, ReputationPolicy, BPS_SCALE};
pub use ratio::Ratio;
pub use state::{CaseStatus, StakeAction};
pub use time::{Clock, SystemClock, Timestamp};
pub use verdict::Verdict;
