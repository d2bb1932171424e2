//! Ledger configuration with TOML file support.

use std::path::{Path, PathBuf};

use burst_types::{ProtocolParams, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::pruning::PruningConfig;

/// Configuration for a ledger instance.
///
/// Can be loaded from a TOML file via [`LedgerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Genesis BRN rate in raw units per second.
    #[serde(default = "default_brn_rate")]
    pub brn_rate: u64,

    /// Genesis TRST expiry period in seconds.
    #[serde(default = "default_trst_expiry_secs")]
    pub trst_expiry_secs: u64,

    /// Unix time at which the genesis parameters take effect.
    #[serde(default)]
    pub genesis_timestamp: u64,

    /// How far a transaction timestamp may sit from the local clock.
    #[serde(default = "default_clock_skew")]
    pub clock_skew_tolerance_secs: u64,

    /// Check transaction hashes and signatures. Replays of trusted logs may
    /// turn this off.
    #[serde(default = "default_true")]
    pub verify_signatures: bool,

    /// Graph keys visited per revocation step.
    #[serde(default = "default_step_budget")]
    pub revocation_step_budget: usize,

    /// Where revocation checkpoints are written. In memory when unset.
    #[serde(default)]
    pub journal_path: Option<PathBuf>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Kept last: TOML tables must follow plain values.
    #[serde(default)]
    pub pruning: PruningConfig,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_brn_rate() -> u64 {
    // 277_777_777_777_778 fits comfortably in a TOML integer.
    ProtocolParams::BRN_RATE_1_PER_HOUR as u64
}

fn default_trst_expiry_secs() -> u64 {
    ProtocolParams::burst_defaults().trst_expiry_secs
}

fn default_clock_skew() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_step_budget() -> usize {
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
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
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

    /// Parameters in force at genesis.
    pub fn protocol_params(&self) -> ProtocolParams {
        ProtocolParams {
            brn_rate: u128::from(self.brn_rate),
            trst_expiry_secs: self.trst_expiry_secs,
        }
    }

    pub fn genesis(&self) -> Timestamp {
        Timestamp::new(self.genesis_timestamp)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            brn_rate: default_brn_rate(),
            trst_expiry_secs: default_trst_expiry_secs(),
            genesis_timestamp: 0,
            clock_skew_tolerance_secs: default_clock_skew(),
            verify_signatures: default_true(),
            revocation_step_budget: default_step_budget(),
            journal_path: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
            pruning: PruningConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = LedgerConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = LedgerConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = LedgerConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.clock_skew_tolerance_secs, 300);
        assert_eq!(config.revocation_step_budget, 1024);
        assert!(config.verify_signatures);
        assert_eq!(config.log_format, "human");
        assert_eq!(config.protocol_params(), ProtocolParams::burst_defaults());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            trst_expiry_secs = 100
            verify_signatures = false

            [pruning]
            enabled = true
            batch_size = 10
        "#;
        let config = LedgerConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.trst_expiry_secs, 100);
        assert!(!config.verify_signatures);
        assert!(config.pruning.enabled);
        assert_eq!(config.pruning.batch_size, 10);
        assert!(config.pruning.prune_revoked); // default
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "genesis_timestamp = 1700000000").unwrap();
        let config = LedgerConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.genesis(), Timestamp::new(1_700_000_000));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = LedgerConfig::from_toml_file("/nonexistent/burst.toml");
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }
}
