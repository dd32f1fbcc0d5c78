//! Evidence identity and category.

use crate::error::WhistleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque unique token identifying an evidence case.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EvidenceId(String);

impl EvidenceId {
    /// The prefix used for engine-generated ids.
    pub const PREFIX: &'static str = "EVD-";

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Build the id for the `n`-th submitted case, e.g. `EVD-000042`.
    pub fn from_sequence(n: u64) -> Self {
        Self(format!("{}{:06}", Self::PREFIX, n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The category of wrongdoing an evidence case reports.
///
/// The category decides which inspectors are eligible, the length of the verification
/// window, the minimum stake and the bounty schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Financial,
    Construction,
    Food,
    Academic,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Financial,
        Category::Construction,
        Category::Food,
        Category::Academic,
    ];

    /// On-chain category code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Financial => 0,
            Self::Construction => 1,
            Self::Food => 2,
            Self::Academic => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, WhistleError> {
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| WhistleError::InvalidCategory(code.to_string()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Financial => "FINANCIAL",
            Self::Construction => "CONSTRUCTION",
            Self::Food => "FOOD",
            Self::Academic => "ACADEMIC",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = WhistleError;

    /// Case-insensitive, matching the labels used by the submission portal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.label() == upper)
            .ok_or_else(|| WhistleError::InvalidCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_ids_are_zero_padded() {
        assert_eq!(EvidenceId::from_sequence(42).as_str(), "EVD-000042");
    }

    #[test]
    fn category_codes_roundtrip() {
        for c in Category::ALL {
            assert_eq!(Category::from_code(c.code()).unwrap(), c);
        }
        assert!(Category::from_code(9).is_err());
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!(" Academic ".parse::<Category>().unwrap(), Category::Academic);
        assert!("medical".parse::<Category>().is_err());
    }
}
