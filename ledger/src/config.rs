//! Ledger configuration with TOML file support.

use rebase_types::Rate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::logging::LogFormat;
use crate::LedgerError;

/// Configuration for a ledger instance.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Protocol rate offered to newly funded accounts on a fresh ledger,
    /// in `RATE_SCALE` units per second. Ignored once a store holds a rate.
    /// Kept to `u64` because TOML integers are 64-bit.
    #[serde(default = "default_initial_protocol_rate")]
    pub initial_protocol_rate: u64,

    /// Data directory for the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Maximum LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_initial_protocol_rate() -> u64 {
    50_000_000_000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./rebase_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LedgerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, LedgerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, LedgerError> {
        toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, LedgerError> {
        toml::to_string_pretty(self).map_err(|e| LedgerError::Config(e.to_string()))
    }

    pub fn initial_rate(&self) -> Rate {
        Rate::new(u128::from(self.initial_protocol_rate))
    }

    /// LMDB map size in bytes.
    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn log_format(&self) -> Result<LogFormat, LedgerError> {
        match self.log_format.as_str() {
            "human" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            other => Err(LedgerError::Config(format!("unknown log format: {other}"))),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            initial_protocol_rate: default_initial_protocol_rate(),
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = LedgerConfig::default();
        let toml_str = config.to_toml_string().expect("should serialize");
        let parsed = LedgerConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.initial_protocol_rate, config.initial_protocol_rate);
        assert_eq!(parsed.map_size_mb, config.map_size_mb);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = LedgerConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.initial_protocol_rate, 50_000_000_000);
        assert_eq!(config.log_format().unwrap(), LogFormat::Human);
        assert_eq!(config.map_size_bytes(), 1024 * 1024 * 1024);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            initial_protocol_rate = 1000
            log_format = "json"
        "#;
        let config = LedgerConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.initial_protocol_rate, 1000);
        assert_eq!(config.log_format().unwrap(), LogFormat::Json);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn unknown_log_format_is_config_error() {
        let config = LedgerConfig::from_toml_str("log_format = \"xml\"").unwrap();
        assert!(matches!(config.log_format(), Err(LedgerError::Config(_))));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = LedgerConfig::from_toml_file("/nonexistent/rebase.toml");
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }
}
