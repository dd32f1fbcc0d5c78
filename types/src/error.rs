//! Top-level error type shared across crates.

use thiserror::Error;

/// Errors raised while decoding or validating the shared types.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum WhistleError {
    #[error("unknown verdict code: {0}")]
    InvalidVerdictCode(u64),

    #[error("unknown category: {0}")]
    InvalidCategory(String),

    #[error("invalid commitment hash: {0}")]
    InvalidHash(String),

    #[error("ratio {numerator}/{denominator} exceeds 1")]
    InvalidRatio { numerator: u32, denominator: u32 },

    #[error("invalid engine parameters: {0}")]
    InvalidParams(String),
}
