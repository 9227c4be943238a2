//! # Sync Error Types
//!
//! Error types for the scan session and the inventory gateway.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │   Inventory Service     │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Connection     │  │  UnknownCode            │ │
//! │  │  InvalidUrl     │  │  RequestTimeout │  │  Rejected (HTTP status) │ │
//! │  │  ConfigLoad/Save│  │  Http           │  │  Deserialization        │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐                              │
//! │  │    Session      │  │   Station I/O   │  Scan validation failures    │
//! │  │                 │  │                 │  are NOT errors here: the    │
//! │  │  ShuttingDown   │  │  Io             │  session ignores them (see   │
//! │  └─────────────────┘  └─────────────────┘  ScanOutcome).               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering session, config and gateway failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value.
    #[error("Invalid scan configuration: {0}")]
    InvalidConfig(String),

    /// Invalid inventory service URL.
    #[error("Invalid inventory service URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// Could not reach the inventory service.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The inventory service did not answer in time.
    #[error("Request to inventory service timed out")]
    RequestTimeout,

    /// Any other HTTP client failure.
    #[error("HTTP error: {0}")]
    Http(String),

    // =========================================================================
    // Inventory Service Errors
    // =========================================================================
    /// No inventory item carries this code.
    #[error("Unknown item code: {0}")]
    UnknownCode(String),

    /// The service answered with a non-success status.
    #[error("Inventory service rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Failed to decode a response body.
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// The scan session has stopped and accepts no more commands.
    #[error("Scan session is shutting down")]
    ShuttingDown,

    // =========================================================================
    // Station I/O
    // =========================================================================
    /// Terminal or other local I/O failed.
    #[error("I/O error: {0}")]
    Io(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::RequestTimeout
        } else if err.is_connect() {
            SyncError::ConnectionFailed(err.to_string())
        } else if err.is_decode() {
            SyncError::DeserializationFailed(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            SyncError::Http(err.to_string())
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization (for retry logic)
// =============================================================================

impl SyncError {
    /// Returns true if a commit failing with this error may succeed later.
    ///
    /// ## Retryable Errors
    /// - Connection failures and timeouts
    /// - 5xx and 429 answers from the inventory service
    ///
    /// ## Non-Retryable Errors
    /// - Unknown item codes and other 4xx answers
    /// - Configuration and decoding errors
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::ConnectionFailed(_) | SyncError::RequestTimeout => true,
            SyncError::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SyncError::InvalidConfig(_)
                | SyncError::InvalidUrl(_)
                | SyncError::ConfigLoadFailed(_)
                | SyncError::ConfigSaveFailed(_)
        )
    }
}
