use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::storage::StorageSettings;
use crate::workflow::WorkflowSettings;

/// Main configuration for receipt-ledger.
///
/// Loaded once at startup and passed into the workflow engine as an
/// explicit context object, so independent engines (e.g. in tests) never
/// share state.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ReceiptLedgerConfig {
    /// JSON log artifact, backups and locking.
    pub storage: StorageSettings,
    /// Retry ceiling and confidence threshold.
    pub workflow: WorkflowSettings,
    /// Logging output settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set.
    pub log_level: String,
    /// Emit structured JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ReceiptLedgerConfig {
    /// Load configuration with precedence:
    /// 1. Default values
    /// 2. `receipt-ledger.toml` in the working directory, if present
    /// 3. Environment variables prefixed with `RECEIPT_LEDGER__`
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("receipt-ledger.toml").exists() {
            builder = builder.add_source(File::with_name("receipt-ledger"));
        }

        builder = builder.add_source(
            Environment::with_prefix("RECEIPT_LEDGER")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Write the current configuration out as TOML.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load a `.env` file if one exists, before reading the environment.
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::debug!("loaded environment variables from .env");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sensible() {
        let config = ReceiptLedgerConfig::default();
        assert_eq!(config.workflow.max_retries, 3);
        assert_eq!(config.workflow.confidence_threshold, 0.8);
        assert_eq!(config.storage.retention_days, 180);
        assert!(config.storage.lock_timeout_ms > 0);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = ReceiptLedgerConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        let parsed: ReceiptLedgerConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.workflow.max_retries, config.workflow.max_retries);
        assert_eq!(parsed.storage.log_path, config.storage.log_path);
    }
}
