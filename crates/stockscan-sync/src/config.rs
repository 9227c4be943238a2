//! # Scan Configuration
//!
//! Configuration management for the scan station.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKSCAN_DEBOUNCE_SECS=5                                          │
//! │     STOCKSCAN_API_URL=http://inventory.local:8000                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/stockscan/scan.toml (Linux)                              │
//! │     ~/Library/Application Support/com.stockscan.station/scan.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     10 s debounce, http://localhost:8000, fire-and-forget commits      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # scan.toml
//! [station]
//! name = "Goods-in bench"
//!
//! [scan]
//! debounce_secs = 10
//! max_code_len = 128
//!
//! [gateway]
//! base_url = "http://localhost:8000"
//! request_timeout_secs = 10
//!
//! [commit]
//! policy = "fire_and_forget"  # fire_and_forget | retry
//! initial_backoff_ms = 500
//! max_backoff_secs = 30
//! max_elapsed_secs = 120
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{SyncError, SyncResult};

// =============================================================================
// Commit Policy
// =============================================================================

/// What happens when a per-code commit fails.
///
/// ## Policy Comparison
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  FIRE_AND_FORGET (Default)          │  RETRY                           │
/// │  ─────────────────────────          │  ─────                           │
/// │  • One request per code             │  • Same requests, but transient  │
/// │  • Failure is logged and reported   │    failures (connect, timeout,   │
/// │  • No retry, no re-queue            │    5xx) back off and retry       │
/// │                                     │  • Unknown codes / 4xx fail fast │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Send once, report failures, never retry.
    #[default]
    FireAndForget,

    /// Retry transient failures with exponential backoff.
    Retry,
}

impl std::fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitPolicy::FireAndForget => write!(f, "fire_and_forget"),
            CommitPolicy::Retry => write!(f, "retry"),
        }
    }
}

impl std::str::FromStr for CommitPolicy {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "fire_and_forget" | "once" => Ok(CommitPolicy::FireAndForget),
            "retry" => Ok(CommitPolicy::Retry),
            other => Err(SyncError::InvalidConfig(format!(
                "Unknown commit policy: '{}'. Valid options: fire_and_forget, retry",
                other
            ))),
        }
    }
}

// =============================================================================
// Station Settings
// =============================================================================

/// Identification of this scan station (shows up in logs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSettings {
    /// Human-readable station name.
    #[serde(default = "default_station_name")]
    pub name: String,
}

fn default_station_name() -> String {
    "Scan Station".to_string()
}

impl Default for StationSettings {
    fn default() -> Self {
        StationSettings {
            name: default_station_name(),
        }
    }
}

// =============================================================================
// Scan Settings
// =============================================================================

/// Scan batching behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Seconds of scanning inactivity before the batch is flushed.
    #[serde(default = "default_debounce_secs")]
    pub debounce_secs: u64,

    /// Longest accepted scan code, in characters.
    #[serde(default = "default_max_code_len")]
    pub max_code_len: usize,
}

/// Longest accepted debounce window (one hour).
pub const MAX_DEBOUNCE_SECS: u64 = 3_600;

fn default_debounce_secs() -> u64 {
    10
}

fn default_max_code_len() -> usize {
    stockscan_core::DEFAULT_MAX_CODE_LEN
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            debounce_secs: default_debounce_secs(),
            max_code_len: default_max_code_len(),
        }
    }
}

impl ScanSettings {
    /// Returns the debounce window.
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}

// =============================================================================
// Gateway Settings
// =============================================================================

/// Where and how to reach the inventory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewaySettings {
    /// Base URL of the inventory service.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for GatewaySettings {
    fn default() -> Self {
        GatewaySettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Commit Settings
// =============================================================================

/// Failure handling for per-code commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSettings {
    /// Commit policy.
    #[serde(default)]
    pub policy: CommitPolicy,

    /// Initial backoff (milliseconds). Only used by the retry policy.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff between attempts (seconds).
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,

    /// Give up retrying a code after this long (seconds).
    /// Set to 0 to retry without a time limit.
    #[serde(default = "default_max_elapsed")]
    pub max_elapsed_secs: u64,
}

fn default_initial_backoff() -> u64 {
    500
}

fn default_max_backoff() -> u64 {
    30
}

fn default_max_elapsed() -> u64 {
    120
}

impl Default for CommitSettings {
    fn default() -> Self {
        CommitSettings {
            policy: CommitPolicy::default(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_secs: default_max_backoff(),
            max_elapsed_secs: default_max_elapsed(),
        }
    }
}

// =============================================================================
// Main Scan Configuration
// =============================================================================

/// Complete scan station configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Station identification.
    #[serde(default)]
    pub station: StationSettings,

    /// Batching behavior.
    #[serde(default)]
    pub scan: ScanSettings,

    /// Inventory service connection.
    #[serde(default)]
    pub gateway: GatewaySettings,

    /// Commit failure handling.
    #[serde(default)]
    pub commit: CommitSettings,
}

impl ScanConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (scan.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading scan config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| SyncError::ConfigLoadFailed(e.to_string()))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load scan config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SyncError::ConfigSaveFailed("No config path available".into()))?;

        let save_failed = |e: std::io::Error| SyncError::ConfigSaveFailed(e.to_string());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(save_failed)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(save_failed)?;

        info!(?path, "Scan config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if !(1..=MAX_DEBOUNCE_SECS).contains(&self.scan.debounce_secs) {
            return Err(SyncError::InvalidConfig(format!(
                "debounce_secs must be between 1 and {}, got {}",
                MAX_DEBOUNCE_SECS, self.scan.debounce_secs
            )));
        }

        if self.scan.max_code_len == 0 {
            return Err(SyncError::InvalidConfig(
                "max_code_len must be greater than 0".into(),
            ));
        }

        let url = url::Url::parse(&self.gateway.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SyncError::InvalidUrl(format!(
                "Inventory URL must start with http:// or https://, got: {}",
                self.gateway.base_url
            )));
        }

        if self.gateway.request_timeout_secs == 0 {
            return Err(SyncError::InvalidConfig(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("STOCKSCAN_STATION_NAME") {
            self.station.name = name;
        }

        if let Ok(secs) = std::env::var("STOCKSCAN_DEBOUNCE_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => {
                    debug!(debounce_secs = s, "Overriding debounce window from environment");
                    self.scan.debounce_secs = s;
                }
                Err(_) => warn!(value = %secs, "Ignoring invalid STOCKSCAN_DEBOUNCE_SECS"),
            }
        }

        if let Ok(url) = std::env::var("STOCKSCAN_API_URL") {
            debug!(url = %url, "Overriding inventory URL from environment");
            self.gateway.base_url = url;
        }

        if let Ok(policy) = std::env::var("STOCKSCAN_COMMIT_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.commit.policy = parsed,
                Err(_) => warn!(policy = %policy, "Unknown commit policy in environment"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "stockscan", "station")
            .map(|dirs| dirs.config_dir().join("scan.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_policy_parsing() {
        assert_eq!(
            "fire_and_forget".parse::<CommitPolicy>().unwrap(),
            CommitPolicy::FireAndForget
        );
        assert_eq!(
            "fire-and-forget".parse::<CommitPolicy>().unwrap(),
            CommitPolicy::FireAndForget
        );
        assert_eq!("RETRY".parse::<CommitPolicy>().unwrap(), CommitPolicy::Retry);
        assert!("sometimes".parse::<CommitPolicy>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = ScanConfig::default();
        assert_eq!(config.scan.debounce(), Duration::from_secs(10));
        assert_eq!(config.scan.max_code_len, 128);
        assert_eq!(config.gateway.base_url, "http://localhost:8000");
        assert_eq!(config.commit.policy, CommitPolicy::FireAndForget);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ScanConfig::default();

        config.scan.debounce_secs = 0;
        assert!(config.validate().is_err());
        config.scan.debounce_secs = MAX_DEBOUNCE_SECS;
        assert!(config.validate().is_ok());
        config.scan.debounce_secs = 3;

        config.gateway.base_url = "ws://localhost:8000".to_string();
        assert!(matches!(config.validate(), Err(SyncError::InvalidUrl(_))));

        config.gateway.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.gateway.base_url = "https://inventory.example.com/api".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debounce_upper_bound() {
        let mut config = ScanConfig::default();
        config.scan.debounce_secs = u64::MAX;

        let err = config.validate().unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(
            err.to_string(),
            format!(
                "Invalid scan configuration: debounce_secs must be between 1 and 3600, got {}",
                u64::MAX
            )
        );

        config.scan.debounce_secs = MAX_DEBOUNCE_SECS + 1;
        assert!(matches!(config.validate(), Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: ScanConfig = toml::from_str(
            r#"
            [scan]
            debounce_secs = 4

            [commit]
            policy = "retry"
            "#,
        )
        .unwrap();

        assert_eq!(config.scan.debounce_secs, 4);
        assert_eq!(config.scan.max_code_len, 128);
        assert_eq!(config.commit.policy, CommitPolicy::Retry);
        assert_eq!(config.commit.initial_backoff_ms, 500);
        assert_eq!(config.station.name, "Scan Station");
    }

    #[test]
    fn test_load_reads_file_and_saves_round_trip() {
        let path = std::env::temp_dir().join(format!(
            "stockscan-config-{}.toml",
            uuid::Uuid::new_v4()
        ));

        let mut config = ScanConfig::default();
        config.station.name = "Bench 2".to_string();
        config.scan.debounce_secs = 7;
        config.save(Some(path.clone())).unwrap();

        let loaded = ScanConfig::load(Some(path.clone())).unwrap();
        assert_eq!(loaded.scan.debounce_secs, 7);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_load_or_default_falls_back_on_bad_file() {
        let path = std::env::temp_dir().join(format!(
            "stockscan-bad-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "[scan]\ndebounce_secs = 0\n").unwrap();

        let config = ScanConfig::load_or_default(Some(path.clone()));
        assert_eq!(config.scan.debounce_secs, 10);

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_toml_serialization() {
        let config = ScanConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[scan]"));
        assert!(toml_str.contains("[gateway]"));
        assert!(toml_str.contains("fire_and_forget"));
    }
}
