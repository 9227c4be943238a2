//! # stockscan-sync: Debounce/Flush Engine for StockScan
//!
//! This crate turns a rapid stream of scanned item codes into batched
//! "add quantity" calls against the inventory service.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Scan Session Architecture                       │
//! │                                                                         │
//! │  scan text ──► ScanSessionHandle::submit                                │
//! │                        │                                                │
//! │  ┌─────────────────────▼────────────────────────────────────────────┐  │
//! │  │                  ScanSession (tokio task)                        │  │
//! │  │                                                                  │  │
//! │  │  parse_scan_code ──► BatchAggregator::add ──► FlushTimer::reset │  │
//! │  │                                                                  │  │
//! │  │  FlushTimer expiry ──► BatchAggregator::drain ──► commit_all     │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                                 │ one task per code                     │
//! │         ┌───────────────────────┼───────────────────────┐               │
//! │         ▼                       ▼                       ▼                │
//! │  ┌────────────────┐  ┌─────────────────────┐  ┌────────────────────┐   │
//! │  │ HttpSyncGateway│  │ RetryingGateway<G>  │  │ ScanEventEmitter   │   │
//! │  │                │  │                     │  │                    │   │
//! │  │ code → ID index│  │ backoff on transient│  │ flush / committed /│   │
//! │  │ POST .../add/  │  │ failures (opt-in)   │  │ commit failed      │   │
//! │  └────────────────┘  └─────────────────────┘  └────────────────────┘   │
//! │                                                                         │
//! │  UnloadGuard: asks for confirmation before leaving with pending scans  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`session`] - `ScanSession` actor and its handle
//! - [`timer`] - `FlushTimer` debounce countdown
//! - [`gateway`] - `SyncGateway` trait, HTTP and retrying gateways, `commit_all`
//! - [`events`] - Flush/commit notifications
//! - [`guard`] - `UnloadGuard` leave confirmation
//! - [`config`] - Station configuration (TOML + env)
//! - [`error`] - Sync error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockscan_sync::{build_gateway, ScanConfig, ScanSession, SessionConfig};
//!
//! let config = ScanConfig::load_or_default(None);
//! let gateway = build_gateway(&config)?;
//!
//! let session = ScanSession::new(SessionConfig::from(&config.scan), gateway).start();
//! session.submit("8001234567890").await?;
//! session.undo().await?;
//!
//! println!("Pending: {:?}", session.status().snapshot);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod events;
pub mod gateway;
pub mod guard;
pub mod session;
pub mod timer;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{
    CommitPolicy, CommitSettings, GatewaySettings, ScanConfig, ScanSettings, StationSettings,
};
pub use error::{SyncError, SyncResult};
pub use events::{ChannelEmitter, NoOpEmitter, ScanEvent, ScanEventEmitter};
pub use gateway::{
    build_gateway, commit_all, CommitOutcome, HttpSyncGateway, RetryPolicy, RetryingGateway,
    SyncGateway,
};
pub use guard::{LeaveDecision, UnloadGuard};
pub use session::{ScanOutcome, ScanSession, ScanSessionHandle, ScanStatus, SessionConfig};
pub use timer::{CountdownState, Expiry, FlushTimer};
