//! Nullable infrastructure for deterministic testing.
//!
//! Inspired by the "A-frame architecture" pattern from RsNano.
//! External collaborators (clock, randomness, escrow ledger) sit behind traits.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod escrow;
pub mod random;

pub use clock::NullClock;
pub use escrow::NullEscrow;
pub use random::NullRandom;
