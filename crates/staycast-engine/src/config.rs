//! # Engine Configuration
//!
//! Configuration management for the StayCast engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STAYCAST_RELAY_BATCH_SIZE=200                                      │
//! │     STAYCAST_RELAY_MAX_RETRIES=3                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/staycast/staycast.toml (Linux)                           │
//! │     ~/Library/Application Support/com.staycast.engine/... (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     batch_size=100, max_retries=5, retention_days=7                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # staycast.toml
//! [relay]
//! batch_size = 100
//! max_retries = 5
//! publish_timeout_secs = 10
//! retention_days = 7
//! pending_interval_secs = 5
//! retry_interval_secs = 60
//! cleanup_interval_secs = 3600
//!
//! [distribution]
//! connector_timeout_secs = 30
//! ```
//!
//! ## Sizing the Batch to the Tick
//! Publishing is synchronous: one broker round trip per event. A relay
//! tick therefore takes up to `batch_size × broker_round_trip` — keep the
//! batch small enough to finish inside `pending_interval_secs`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Relay Settings
// =============================================================================

/// Settings for the outbox relay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Maximum rows processed per tick.
    /// Default: 100
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Delivery attempts before a FAILED row becomes terminal.
    /// Default: 5
    #[serde(default = "default_max_retries")]
    pub max_retries: i64,

    /// How long to await a broker ack before treating the publish as failed.
    /// Default: 10 seconds
    #[serde(default = "default_publish_timeout_secs")]
    pub publish_timeout_secs: u64,

    /// Cap on stored error message length.
    /// Default: 500 characters
    #[serde(default = "default_error_truncate_len")]
    pub error_truncate_len: usize,

    /// SENT rows older than this are deleted by cleanup.
    /// Default: 7 days
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// Tick interval for relay_pending().
    /// Default: 5 seconds
    #[serde(default = "default_pending_interval_secs")]
    pub pending_interval_secs: u64,

    /// Tick interval for retry_failed().
    /// Default: 60 seconds
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Tick interval for cleanup().
    /// Default: 1 hour
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,
}

fn default_batch_size() -> u32 {
    100
}

fn default_max_retries() -> i64 {
    5
}

fn default_publish_timeout_secs() -> u64 {
    10
}

fn default_error_truncate_len() -> usize {
    500
}

fn default_retention_days() -> i64 {
    7
}

fn default_pending_interval_secs() -> u64 {
    5
}

fn default_retry_interval_secs() -> u64 {
    60
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}

impl Default for RelaySettings {
    fn default() -> Self {
        RelaySettings {
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            publish_timeout_secs: default_publish_timeout_secs(),
            error_truncate_len: default_error_truncate_len(),
            retention_days: default_retention_days(),
            pending_interval_secs: default_pending_interval_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
        }
    }
}

// =============================================================================
// Distribution Settings
// =============================================================================

/// Settings for the rate distribution service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSettings {
    /// Per-channel connector call timeout. A hung channel must not block
    /// its siblings beyond this bound.
    /// Default: 30 seconds
    #[serde(default = "default_connector_timeout_secs")]
    pub connector_timeout_secs: u64,
}

fn default_connector_timeout_secs() -> u64 {
    30
}

impl Default for DistributionSettings {
    fn default() -> Self {
        DistributionSettings {
            connector_timeout_secs: default_connector_timeout_secs(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Outbox relay settings.
    #[serde(default)]
    pub relay: RelaySettings,

    /// Distribution settings.
    #[serde(default)]
    pub distribution: DistributionSettings,
}

impl EngineConfig {
    /// Loads configuration: TOML file (explicit path or the platform
    /// config dir), then environment overrides, then validation.
    ///
    /// A missing file is not an error — defaults apply.
    pub fn load_or_default(path: Option<&Path>) -> EngineResult<Self> {
        let config_path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_config_path(),
        };

        let mut config = match config_path {
            Some(ref p) if p.exists() => {
                info!(path = %p.display(), "Loading engine config");
                let raw = std::fs::read_to_string(p)?;
                toml::from_str(&raw)?
            }
            Some(ref p) => {
                debug!(path = %p.display(), "No config file found, using defaults");
                EngineConfig::default()
            }
            None => {
                debug!("No config directory available, using defaults");
                EngineConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Platform config file location (`staycast.toml` in the app config dir).
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "staycast", "staycast")
            .map(|dirs| dirs.config_dir().join("staycast.toml"))
    }

    /// Applies `STAYCAST_*` environment overrides on top of file values.
    fn apply_env_overrides(&mut self) {
        apply_env_u32("STAYCAST_RELAY_BATCH_SIZE", &mut self.relay.batch_size);
        apply_env_i64("STAYCAST_RELAY_MAX_RETRIES", &mut self.relay.max_retries);
        apply_env_u64(
            "STAYCAST_RELAY_PUBLISH_TIMEOUT_SECS",
            &mut self.relay.publish_timeout_secs,
        );
        apply_env_i64(
            "STAYCAST_RELAY_RETENTION_DAYS",
            &mut self.relay.retention_days,
        );
        apply_env_u64(
            "STAYCAST_CONNECTOR_TIMEOUT_SECS",
            &mut self.distribution.connector_timeout_secs,
        );
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        if self.relay.batch_size == 0 {
            return Err(EngineError::InvalidConfig(
                "relay.batch_size must be at least 1".into(),
            ));
        }
        if self.relay.max_retries < 1 {
            return Err(EngineError::InvalidConfig(
                "relay.max_retries must be at least 1".into(),
            ));
        }
        if self.relay.publish_timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "relay.publish_timeout_secs must be at least 1".into(),
            ));
        }
        if self.relay.retention_days < 1 {
            return Err(EngineError::InvalidConfig(
                "relay.retention_days must be at least 1".into(),
            ));
        }
        if self.distribution.connector_timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "distribution.connector_timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Broker ack timeout as a Duration.
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.relay.publish_timeout_secs)
    }

    /// Connector call timeout as a Duration.
    pub fn connector_timeout(&self) -> Duration {
        Duration::from_secs(self.distribution.connector_timeout_secs)
    }

    /// Retention window for SENT rows.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.relay.retention_days)
    }
}

// =============================================================================
// Env Override Helpers
// =============================================================================

fn apply_env_u32(name: &str, target: &mut u32) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse() {
            Ok(value) => {
                info!(%name, %value, "Applying env override");
                *target = value;
            }
            Err(_) => warn!(%name, %raw, "Ignoring unparseable env override"),
        }
    }
}

fn apply_env_u64(name: &str, target: &mut u64) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse() {
            Ok(value) => {
                info!(%name, %value, "Applying env override");
                *target = value;
            }
            Err(_) => warn!(%name, %raw, "Ignoring unparseable env override"),
        }
    }
}

fn apply_env_i64(name: &str, target: &mut i64) {
    if let Ok(raw) = std::env::var(name) {
        match raw.parse() {
            Ok(value) => {
                info!(%name, %value, "Applying env override");
                *target = value;
            }
            Err(_) => warn!(%name, %raw, "Ignoring unparseable env override"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.relay.batch_size, 100);
        assert_eq!(config.relay.max_retries, 5);
        assert_eq!(config.relay.publish_timeout_secs, 10);
        assert_eq!(config.relay.error_truncate_len, 500);
        assert_eq!(config.relay.retention_days, 7);
        assert_eq!(config.distribution.connector_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
            [relay]
            batch_size = 25
            "#,
        )
        .unwrap();

        assert_eq!(config.relay.batch_size, 25);
        assert_eq!(config.relay.max_retries, 5);
        assert_eq!(config.distribution.connector_timeout_secs, 30);
    }

    #[test]
    fn test_validation_rejects_zero_batch() {
        let mut config = EngineConfig::default();
        config.relay.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.relay.max_retries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_wins() {
        std::env::set_var("STAYCAST_RELAY_BATCH_SIZE", "42");
        let mut config = EngineConfig::default();
        config.apply_env_overrides();
        std::env::remove_var("STAYCAST_RELAY_BATCH_SIZE");

        assert_eq!(config.relay.batch_size, 42);
    }

    #[test]
    fn test_duration_helpers() {
        let config = EngineConfig::default();
        assert_eq!(config.publish_timeout(), Duration::from_secs(10));
        assert_eq!(config.connector_timeout(), Duration::from_secs(30));
        assert_eq!(config.retention(), chrono::Duration::days(7));
    }
}
