//! Commitment hash type for the commit-reveal protocol.

use crate::error::WhistleError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 32-byte commitment binding a hidden verdict to a secret nonce.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommitHash([u8; 32]);

impl CommitHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Lowercase hex, the form inspectors submit from the portal.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommitHash({})", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl FromStr for CommitHash {
    type Err = WhistleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s.trim())
            .ok_or_else(|| WhistleError::InvalidHash(format!("not hex: {s}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| WhistleError::InvalidHash(format!("{} bytes, need 32", v.len())))?;
        Ok(Self(arr))
    }
}

// Inline hex codec to keep the types crate free of encoding dependencies.
mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_its_own_display() {
        let h = CommitHash::new([0xab; 32]);
        let parsed: CommitHash = h.to_string().parse().unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn rejects_wrong_length_and_garbage() {
        assert!("abcd".parse::<CommitHash>().is_err());
        assert!("zz".repeat(32).parse::<CommitHash>().is_err());
        assert!("abc".parse::<CommitHash>().is_err());
    }

    #[test]
    fn accepts_uppercase_hex() {
        let parsed: CommitHash = "AB".repeat(32).parse().unwrap();
        assert_eq!(parsed, CommitHash::new([0xab; 32]));
    }
}
