//! # Domain Types
//!
//! Types shared by the aggregator, the sync engine and the UI.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    ScanCode     │   │   BatchEntry    │   │  BatchSnapshot  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  trimmed,       │   │  code           │   │  entries (in    │       │
//! │  │  non-empty      │   │  quantity >= 1  │   │  scan order)    │       │
//! │  └─────────────────┘   └─────────────────┘   │  last_scanned   │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │              DrainedBatch               │                           │
//! │  │  ─────────────────────────────────────  │                           │
//! │  │  id (UUID v4) - identity of the flush   │                           │
//! │  │  drained_at   - when it left the batch  │                           │
//! │  │  entries      - owned, immutable        │                           │
//! │  └─────────────────────────────────────────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

// =============================================================================
// Scan Code
// =============================================================================

/// An accepted scan code: trimmed, non-empty, no control characters.
///
/// Only [`parse_scan_code`](crate::validation::parse_scan_code) creates
/// these, so holding a `ScanCode` proves the input was validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScanCode(String);

impl ScanCode {
    /// Wraps an already validated string.
    pub(crate) fn from_trusted(code: String) -> Self {
        ScanCode(code)
    }

    /// Returns the code as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the code, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ScanCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Batch Entry
// =============================================================================

/// One line of the pending batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BatchEntry {
    /// Scanned item code, exactly as accepted.
    pub code: String,

    /// Number of scans of this code. Always >= 1 while in a batch; capped
    /// at `u32::MAX` (further scans of the code are not counted).
    pub quantity: u32,
}

impl BatchEntry {
    /// Creates an entry.
    pub fn new(code: impl Into<String>, quantity: u32) -> Self {
        BatchEntry {
            code: code.into(),
            quantity,
        }
    }
}

// =============================================================================
// Batch Snapshot
// =============================================================================

/// Read-only copy of the pending batch, in scan (insertion) order.
///
/// This is what the UI renders: the code/quantity table and whether the
/// "undo last scan" action currently has anything to revert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BatchSnapshot {
    /// Entries in insertion order.
    pub entries: Vec<BatchEntry>,

    /// Code an undo would revert, if any.
    pub last_scanned: Option<String>,
}

impl BatchSnapshot {
    /// Returns true if there is nothing pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }

    /// Quantity pending for `code` (0 when absent).
    pub fn quantity_of(&self, code: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.quantity)
            .unwrap_or(0)
    }
}

// =============================================================================
// Drained Batch
// =============================================================================

/// A batch taken out of the aggregator for commit.
///
/// Owned and immutable: scans accepted after the drain can never leak into
/// a batch that is already being committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DrainedBatch {
    /// Identity of this flush (UUID v4).
    #[ts(as = "String")]
    pub id: Uuid,

    /// When the batch was drained.
    #[ts(as = "String")]
    pub drained_at: DateTime<Utc>,

    /// Entries in insertion order.
    pub entries: Vec<BatchEntry>,
}

impl DrainedBatch {
    /// Creates a drained batch with a fresh id, stamped now.
    pub fn new(entries: Vec<BatchEntry>) -> Self {
        DrainedBatch {
            id: Uuid::new_v4(),
            drained_at: Utc::now(),
            entries,
        }
    }

    /// Returns true if the drain produced nothing to commit.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct codes (= number of commit calls).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.quantity)).sum()
    }

    /// Quantity drained for `code` (0 when absent).
    pub fn quantity_of(&self, code: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.quantity)
            .unwrap_or(0)
    }
}
