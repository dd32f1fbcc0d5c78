//! Engine configuration with TOML file support.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use whistle_types::EngineParams;
use whistle_utils::{init_logging, LogFormat, LoggingError};

use crate::error::VerificationError;

/// Configuration for a verification engine process.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or built
/// programmatically (e.g. for tests). Every key is optional.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Default tracing filter, overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// How often the deadline sweeper runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Quorum, windows, stakes, bounties and reputation policy.
    #[serde(default)]
    pub params: EngineParams,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    60
}

impl EngineConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, VerificationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| VerificationError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, VerificationError> {
        let config: Self = toml::from_str(s).map_err(|e| VerificationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> String {
        toml::to_string_pretty(self).expect("EngineConfig is always serializable to TOML")
    }

    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.sweep_interval_secs == 0 {
            return Err(VerificationError::Config(
                "sweep_interval_secs must be positive".into(),
            ));
        }
        self.params
            .validate()
            .map_err(|e| VerificationError::Config(e.to_string()))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Install the global tracing subscriber described by this config.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        init_logging(self.log_format, &self.log_level)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            sweep_interval_secs: default_sweep_interval_secs(),
            params: EngineParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use whistle_types::Amount;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml_string();
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.params, EngineParams::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            log_format = "json"
            sweep_interval_secs = 5

            [params]
            quorum_bps = 7500
            max_stake = 1000
            "#,
        )
        .expect("should parse");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.sweep_interval_secs, 5);
        assert_eq!(config.params.quorum_bps, 7500);
        assert_eq!(config.params.max_stake, Amount::new(1000));
        assert_eq!(config.params.min_valid_reveals, 3);
    }

    #[test]
    fn invalid_params_are_a_config_error() {
        let err = EngineConfig::from_toml_str("[params]\nquorum_bps = 0\n").unwrap_err();
        assert!(matches!(err, VerificationError::Config(_)));

        let err = EngineConfig::from_toml_str("sweep_interval_secs = 0\n").unwrap_err();
        assert!(matches!(err, VerificationError::Config(_)));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let err = EngineConfig::from_toml_str("log_format = \"xml\"\n").unwrap_err();
        assert!(matches!(err, VerificationError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"").unwrap();
        writeln!(file, "[params.reputation]").unwrap();
        writeln!(file, "agreement_reward = 0.05").unwrap();
        let config = EngineConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.params.reputation.agreement_reward, 0.05);
        assert_eq!(config.params.reputation.mismatch_penalty, 0.12);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = EngineConfig::from_toml_file("/nonexistent/whistle.toml");
        assert!(matches!(result, Err(VerificationError::Config(_))));
    }
}
