//! # stockscan-core: Pure Batch Logic for StockScan
//!
//! This crate holds the bookkeeping behind the scan-and-batch inventory
//! screen as plain, synchronous code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        StockScan Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Scan Station / UI                            │   │
//! │  │    Scan field ──► Batch table ──► Countdown ──► Leave guard     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          stockscan-sync (timer, session actor, gateway)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockscan-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   batch   │  │   types   │  │ validation│                  │   │
//! │  │   │ Aggregator│  │ Snapshot  │  │ ScanCode  │                  │   │
//! │  │   │ one undo  │  │ Drained   │  │  rules    │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TIMERS • NO NETWORK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`batch`] - `BatchAggregator` (add / undo_last / drain)
//! - [`types`] - `ScanCode`, `BatchEntry`, `BatchSnapshot`, `DrainedBatch`
//! - [`validation`] - raw scan text → `ScanCode`
//! - [`error`] - validation error type
//!
//! ## Example Usage
//!
//! ```rust
//! use stockscan_core::{parse_scan_code, BatchAggregator};
//!
//! let mut batch = BatchAggregator::new();
//! batch.add(parse_scan_code("A", 128).unwrap());
//! batch.add(parse_scan_code("B", 128).unwrap());
//! batch.undo_last(); // reverts B only
//!
//! let drained = batch.drain();
//! assert_eq!(drained.quantity_of("A"), 1);
//! assert!(batch.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod batch;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use batch::BatchAggregator;
pub use error::ValidationError;
pub use types::*;
pub use validation::parse_scan_code;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default maximum length of a scan code, in characters.
///
/// Barcode payloads (EAN-13, Code 128, QR with short ids) stay far below
/// this; anything longer is almost always several scans run together.
pub const DEFAULT_MAX_CODE_LEN: usize = 128;
