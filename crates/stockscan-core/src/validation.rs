//! # Validation Module
//!
//! Turns raw scanner text into accepted [`ScanCode`]s.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Scan Validation                                    │
//! │                                                                         │
//! │  Raw text from the scan field ("  ABC-123\n")                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  THIS MODULE: trim, non-empty, length, no control characters           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ScanCode("ABC-123") ──► BatchAggregator::add                          │
//! │                                                                         │
//! │  Whether the code exists in inventory is NOT checked here. The         │
//! │  inventory service decides that when the batch is committed.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockscan_core::validation::parse_scan_code;
//!
//! let code = parse_scan_code("  ABC-123 ", 128).unwrap();
//! assert_eq!(code.as_str(), "ABC-123");
//!
//! assert!(parse_scan_code("   ", 128).is_err());
//! ```

use crate::error::ValidationError;
use crate::types::ScanCode;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates raw scan text and returns the trimmed code.
///
/// ## Rules
/// - Leading/trailing whitespace is removed
/// - Must not be empty after trimming
/// - Must be at most `max_len` characters
/// - Must not contain control characters
pub fn parse_scan_code(raw: &str, max_len: usize) -> ValidationResult<ScanCode> {
    let code = raw.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.chars().count() > max_len {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: max_len,
        });
    }

    if code.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(ScanCode::from_trusted(code.to_string()))
}

// =============================================================================
// Unit Tests
// =============================================================================
