//! # Batch Aggregator
//!
//! Pending scan batch with a single-step undo.
//!
//! ## State
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      BatchAggregator                                    │
//! │                                                                         │
//! │  entries (insertion order)          last_scanned                        │
//! │  ┌──────────────┬──────────┐        ┌──────────────┐                    │
//! │  │ code         │ quantity │        │ Some("B")    │ ◄── set by add     │
//! │  ├──────────────┼──────────┤        └──────────────┘     cleared by     │
//! │  │ A            │ 2        │                             undo_last and  │
//! │  │ B            │ 1        │                             drain          │
//! │  └──────────────┴──────────┘                                            │
//! │                                                                         │
//! │  add(B)       → B += 1 (appended at 1 if new), last_scanned = B        │
//! │  undo_last()  → B -= 1 (removed at 0), last_scanned = None             │
//! │  drain()      → DrainedBatch{A:2, B:1}, entries = [], last = None      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Every stored quantity is >= 1 (an entry reaching 0 is removed in the
//!   same call)
//! - `last_scanned`, when set, names an entry that is present
//! - Undo is one-shot: it reverts the single most recent `add`, never an
//!   older one
//!
//! All three mutators take `&mut self`, so a drain can never interleave
//! with an add: whoever owns the aggregator decides the order.

use crate::types::{BatchEntry, BatchSnapshot, DrainedBatch, ScanCode};

/// Pending code → quantity map plus the "last scanned" marker.
#[derive(Debug, Clone, Default)]
pub struct BatchAggregator {
    entries: Vec<BatchEntry>,
    last_scanned: Option<ScanCode>,
}

impl BatchAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one scan of `code` and returns the resulting batch.
    ///
    /// Quantities stop at `u32::MAX`: scans of a code already at the cap
    /// are not counted, so one undo then takes it to `u32::MAX - 1`.
    pub fn add(&mut self, code: ScanCode) -> BatchSnapshot {
        match self.entries.iter_mut().find(|e| e.code == code.as_str()) {
            Some(entry) => entry.quantity = entry.quantity.saturating_add(1),
            None => self.entries.push(BatchEntry::new(code.as_str(), 1)),
        }

        self.last_scanned = Some(code);
        self.snapshot()
    }

    /// Reverts the most recent `add`, if it has not been reverted already.
    ///
    /// Returns the code that was reverted, or `None` when there was nothing
    /// to undo.
    pub fn undo_last(&mut self) -> Option<ScanCode> {
        let code = self.last_scanned.take()?;

        if let Some(idx) = self.entries.iter().position(|e| e.code == code.as_str()) {
            let entry = &mut self.entries[idx];
            entry.quantity -= 1;
            if entry.quantity == 0 {
                self.entries.remove(idx);
            }
        }

        Some(code)
    }

    /// Takes the whole batch out, leaving the aggregator empty.
    pub fn drain(&mut self) -> DrainedBatch {
        self.last_scanned = None;
        DrainedBatch::new(std::mem::take(&mut self.entries))
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct pending codes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Pending quantity for `code` (0 when absent).
    pub fn quantity_of(&self, code: &str) -> u32 {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.quantity)
            .unwrap_or(0)
    }

    /// The code an undo would revert.
    pub fn last_scanned(&self) -> Option<&ScanCode> {
        self.last_scanned.as_ref()
    }

    /// Read-only copy of the current state.
    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            entries: self.entries.clone(),
            last_scanned: self.last_scanned.as_ref().map(|c| c.as_str().to_string()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
