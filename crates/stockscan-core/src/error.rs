//! # Error Types
//!
//! Domain-specific error types for stockscan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockscan-core errors (this file)                                     │
//! │  └── ValidationError  - Scan text rejected before reaching the batch   │
//! │                                                                         │
//! │  stockscan-sync errors (separate crate)                                │
//! │  └── SyncError        - Config, HTTP and session failures              │
//! │                                                                         │
//! │  Flow: ValidationError → ignored by the session (debug log only)       │
//! │        SyncError       → logged / emitted per code                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The batch itself has no failure modes: `add`, `undo_last` and `drain`
//! are total. Only the step from raw scanner text to a [`ScanCode`] can
//! fail.
//!
//! [`ScanCode`]: crate::types::ScanCode

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Scan input validation errors.
///
/// The scan session never surfaces these to the operator: a rejected scan
/// is simply not counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., control characters from a noisy scanner).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Unit Tests
// =============================================================================
