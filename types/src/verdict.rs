//! Inspector verdicts.
//!
//! Verdicts are a closed enumeration. Raw integer codes only appear at the external
//! boundary (the commitment preimage and the on-chain record) and are mapped explicitly.

use crate::error::WhistleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inspector's verdict on a piece of evidence.
///
/// The declaration order follows the numeric codes, so the derived `Ord` is the
/// deterministic tie-break order (lower code first).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// The evidence is genuine.
    Authentic,
    /// The evidence is fabricated or misleading.
    Fake,
    /// The inspector could not reach a conclusion.
    Inconclusive,
}

impl Verdict {
    pub const ALL: [Verdict; 3] = [Verdict::Authentic, Verdict::Fake, Verdict::Inconclusive];

    /// External verdict code (1 = AUTHENTIC, 2 = FAKE, 3 = INCONCLUSIVE).
    pub fn code(&self) -> u64 {
        match self {
            Self::Authentic => 1,
            Self::Fake => 2,
            Self::Inconclusive => 3,
        }
    }

    pub fn from_code(code: u64) -> Result<Self, WhistleError> {
        match code {
            1 => Ok(Self::Authentic),
            2 => Ok(Self::Fake),
            3 => Ok(Self::Inconclusive),
            other => Err(WhistleError::InvalidVerdictCode(other)),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Authentic => "AUTHENTIC",
            Self::Fake => "FAKE",
            Self::Inconclusive => "INCONCLUSIVE",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
