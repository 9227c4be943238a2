//! # Scan Session
//!
//! The actor that owns the pending batch and its flush countdown.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Scan Session Actor                             │
//! │                                                                         │
//! │  ScanSessionHandle (clone per front end)                                │
//! │     │ submit / undo / flush_now / shutdown                              │
//! │     ▼                                                                   │
//! │  ┌──────────────┐      ┌──────────────────────────────────────────┐    │
//! │  │ mpsc command │─────►│ select! (biased)                         │    │
//! │  │ channel      │      │   1. timer.expired()  ──► flush          │    │
//! │  └──────────────┘      │   2. cmd_rx.recv()    ──► handle command │    │
//! │                        │                                          │    │
//! │                        │   BatchAggregator  +  FlushTimer         │    │
//! │                        └──────────┬───────────────────┬───────────┘    │
//! │                                   │                   │                 │
//! │                    watch<ScanStatus>            commit_all (spawned,    │
//! │                    (batch table, countdown)     never awaited)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//!
//! - Every accepted scan is added to the batch before the countdown resets.
//! - An expiry that is due when a command arrives is handled first: a scan
//!   landing in the same instant as the deadline starts the next batch.
//! - A flush hands an owned [`DrainedBatch`] to the gateway, so scans made
//!   while its commits are in flight always belong to the next batch.
//! - Shutdown (or dropping every handle) cancels the countdown and ends the
//!   loop. Nothing can flush afterwards; commits already spawned keep going.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use stockscan_core::{
    parse_scan_code, BatchAggregator, BatchSnapshot, DrainedBatch, ScanCode, ValidationError,
    DEFAULT_MAX_CODE_LEN,
};

use crate::config::ScanSettings;
use crate::error::{SyncError, SyncResult};
use crate::events::{NoOpEmitter, ScanEventEmitter};
use crate::gateway::{commit_all, SyncGateway};
use crate::timer::{Expiry, FlushTimer};

/// Command channel capacity.
const COMMAND_BUFFER: usize = 256;

// =============================================================================
// Configuration
// =============================================================================

/// Session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Inactivity window after the last scan before the batch is flushed.
    pub debounce: Duration,

    /// Longest accepted scan code, in characters.
    pub max_code_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            debounce: Duration::from_secs(10),
            max_code_len: DEFAULT_MAX_CODE_LEN,
        }
    }
}

impl From<&ScanSettings> for SessionConfig {
    fn from(settings: &ScanSettings) -> Self {
        SessionConfig {
            debounce: settings.debounce(),
            max_code_len: settings.max_code_len,
        }
    }
}

// =============================================================================
// Status
// =============================================================================

/// Read-only view of the session, published after every state change.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanStatus {
    /// Pending batch.
    pub snapshot: BatchSnapshot,

    /// When the batch will be flushed, if a countdown is running.
    pub flush_deadline: Option<Instant>,

    /// Configured debounce window.
    pub debounce: Duration,
}

impl ScanStatus {
    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    /// Returns true while a flush countdown is running.
    pub fn is_counting(&self) -> bool {
        self.flush_deadline.is_some()
    }

    /// Time left until the flush.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.flush_deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Whole seconds left until the flush, rounded up ("Syncing in 3s...").
    pub fn seconds_left(&self, now: Instant) -> Option<u64> {
        self.remaining(now).map(|left| {
            if left.subsec_nanos() > 0 {
                left.as_secs() + 1
            } else {
                left.as_secs()
            }
        })
    }

    /// Elapsed share of the debounce window, in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f64 {
        match self.remaining(now) {
            Some(left) if !self.debounce.is_zero() => {
                let left = left.as_secs_f64() / self.debounce.as_secs_f64();
                (1.0 - left).clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Result of a submitted scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The code was added to the batch and the countdown restarted.
    Accepted {
        code: ScanCode,
        snapshot: BatchSnapshot,
    },

    /// The text was not a scan code. Nothing changed.
    Ignored(ValidationError),
}

impl ScanOutcome {
    /// Returns true if the scan was added to the batch.
    pub fn is_accepted(&self) -> bool {
        matches!(self, ScanOutcome::Accepted { .. })
    }
}

/// Commands for the session actor.
#[derive(Debug)]
enum SessionCommand {
    /// Raw scan text.
    Submit {
        raw: String,
        reply: oneshot::Sender<ScanOutcome>,
    },
    /// Revert the most recent scan.
    Undo {
        reply: oneshot::Sender<Option<ScanCode>>,
    },
    /// Flush immediately.
    Flush {
        reply: oneshot::Sender<Option<DrainedBatch>>,
    },
    /// Tear the session down.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Why a batch left the session.
#[derive(Debug, Clone, Copy)]
enum FlushReason {
    Expired,
    Requested,
}

// =============================================================================
// Session Handle
// =============================================================================

/// Handle for talking to a running [`ScanSession`].
///
/// Cloneable. The session stops when [`shutdown`](Self::shutdown) is called
/// or when the last handle is dropped.
#[derive(Clone)]
pub struct ScanSessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
    status_rx: watch::Receiver<ScanStatus>,
}

impl ScanSessionHandle {
    /// Submits raw scan text.
    pub async fn submit(&self, raw: impl Into<String>) -> SyncResult<ScanOutcome> {
        let raw = raw.into();
        self.request(|reply| SessionCommand::Submit { raw, reply })
            .await
    }

    /// Reverts the most recent scan. Returns the reverted code, if any.
    pub async fn undo(&self) -> SyncResult<Option<ScanCode>> {
        self.request(|reply| SessionCommand::Undo { reply }).await
    }

    /// Flushes the batch now instead of waiting for the countdown.
    ///
    /// Returns the flushed batch, or `None` if nothing was pending.
    pub async fn flush_now(&self) -> SyncResult<Option<DrainedBatch>> {
        self.request(|reply| SessionCommand::Flush { reply }).await
    }

    /// Stops the session. A pending batch is discarded.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.request(|reply| SessionCommand::Shutdown { reply })
            .await
    }

    /// Latest published status.
    pub fn status(&self) -> ScanStatus {
        self.status_rx.borrow().clone()
    }

    /// Returns true if no scans are pending.
    pub fn is_empty(&self) -> bool {
        self.status_rx.borrow().is_empty()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<ScanStatus> {
        self.status_rx.clone()
    }

    /// Returns true until the session has stopped.
    pub fn is_running(&self) -> bool {
        !self.cmd_tx.is_closed()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> SyncResult<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| SyncError::ShuttingDown)?;
        reply_rx.await.map_err(|_| SyncError::ShuttingDown)
    }
}

// =============================================================================
// Scan Session
// =============================================================================

/// Scan-and-batch session: validates scans, aggregates them, and flushes the
/// batch once scanning has been idle for the debounce window.
pub struct ScanSession {
    config: SessionConfig,
    batch: BatchAggregator,
    timer: FlushTimer,
    gateway: Arc<dyn SyncGateway>,
    emitter: Arc<dyn ScanEventEmitter>,
    status_tx: watch::Sender<ScanStatus>,
}

impl ScanSession {
    /// Creates a session that commits through `gateway`.
    pub fn new(config: SessionConfig, gateway: Arc<dyn SyncGateway>) -> Self {
        let (status_tx, _) = watch::channel(ScanStatus {
            snapshot: BatchSnapshot::default(),
            flush_deadline: None,
            debounce: config.debounce,
        });

        ScanSession {
            config,
            batch: BatchAggregator::new(),
            timer: FlushTimer::new(),
            gateway,
            emitter: Arc::new(NoOpEmitter),
            status_tx,
        }
    }

    /// Sets the event emitter.
    pub fn with_emitter(mut self, emitter: Arc<dyn ScanEventEmitter>) -> Self {
        self.emitter = emitter;
        self
    }

    /// Spawns the session actor and returns a handle to it.
    pub fn start(self) -> ScanSessionHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
        let status_rx = self.status_tx.subscribe();

        tokio::spawn(async move {
            self.run(cmd_rx).await;
        });

        ScanSessionHandle { cmd_tx, status_rx }
    }

    /// Main session loop.
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<SessionCommand>) {
        info!(debounce = ?self.config.debounce, "Scan session started");

        loop {
            tokio::select! {
                biased;

                expiry = self.timer.expired() => {
                    self.on_expiry(expiry);
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle_command(cmd) {
                            break;
                        }
                    }
                    None => {
                        debug!("All session handles dropped");
                        self.teardown();
                        break;
                    }
                },
            }
        }

        info!("Scan session stopped");
    }

    /// Handles one command. Returns false once the session must stop.
    fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Submit { raw, reply } => {
                self.flush_if_due();
                let _ = reply.send(self.submit(&raw));
            }
            SessionCommand::Undo { reply } => {
                self.flush_if_due();
                let _ = reply.send(self.undo());
            }
            SessionCommand::Flush { reply } => {
                // Drains whatever is pending, due or not
                let _ = reply.send(self.flush(FlushReason::Requested));
            }
            SessionCommand::Shutdown { reply } => {
                self.flush_if_due();
                self.teardown();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    /// Validates and records one scan.
    fn submit(&mut self, raw: &str) -> ScanOutcome {
        let code = match parse_scan_code(raw, self.config.max_code_len) {
            Ok(code) => code,
            Err(e) => {
                debug!(error = %e, "Ignoring scan input");
                return ScanOutcome::Ignored(e);
            }
        };

        let snapshot = self.batch.add(code.clone());
        self.timer.reset(self.config.debounce);
        self.publish_status();

        let quantity = snapshot.quantity_of(code.as_str());
        if quantity == u32::MAX {
            warn!(code = %code, "Scan quantity at its cap, further scans of this code are not counted");
        }
        debug!(
            code = %code,
            quantity,
            pending_codes = snapshot.len(),
            "Scan accepted"
        );

        ScanOutcome::Accepted { code, snapshot }
    }

    /// Reverts the most recent scan. The countdown keeps running.
    fn undo(&mut self) -> Option<ScanCode> {
        let reverted = self.batch.undo_last();
        match &reverted {
            Some(code) => {
                debug!(code = %code, "Last scan reverted");
                self.publish_status();
            }
            None => debug!("Nothing to undo"),
        }
        reverted
    }

    /// Settles an expiry whose deadline has already passed.
    fn flush_if_due(&mut self) {
        if let Some(expiry) = self.timer.take_due(Instant::now()) {
            self.on_expiry(expiry);
        }
    }

    fn on_expiry(&mut self, expiry: Expiry) {
        debug!(countdown = expiry.countdown, "Flush countdown expired");
        self.flush(FlushReason::Expired);
    }

    /// Drains the batch and dispatches its commits without awaiting them.
    fn flush(&mut self, reason: FlushReason) -> Option<DrainedBatch> {
        self.timer.cancel();

        if self.batch.is_empty() {
            debug!(?reason, "Nothing to flush");
            self.publish_status();
            return None;
        }

        let batch = self.batch.drain();
        self.publish_status();

        info!(
            batch_id = %batch.id,
            codes = batch.len(),
            quantity = batch.total_quantity(),
            ?reason,
            "Flushing scan batch"
        );

        self.emitter.emit_flush(&batch);
        // Handles dropped on purpose: commits outlive the flush
        let _ = commit_all(self.gateway.clone(), self.emitter.clone(), &batch);

        Some(batch)
    }

    /// Stops the countdown for good. Pending scans are lost.
    fn teardown(&mut self) {
        self.timer.cancel();

        if !self.batch.is_empty() {
            let discarded = self.batch.drain();
            warn!(
                codes = discarded.len(),
                quantity = discarded.total_quantity(),
                "Scan session closed with unsent scans"
            );
            self.publish_status();
        }
    }

    fn publish_status(&self) {
        self.status_tx.send_replace(ScanStatus {
            snapshot: self.batch.snapshot(),
            flush_deadline: self.timer.deadline(),
            debounce: self.config.debounce,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ChannelEmitter, ScanEvent};
    use crate::gateway::testing::RecordingGateway;
    use stockscan_core::BatchEntry;
    use tokio::sync::mpsc::UnboundedReceiver;
    use tokio::time::{sleep, timeout};

    const WINDOW: Duration = Duration::from_secs(10);

    fn start_session(
        gateway: RecordingGateway,
    ) -> (ScanSessionHandle, UnboundedReceiver<ScanEvent>) {
        let (emitter, events) = ChannelEmitter::new();
        let handle = ScanSession::new(SessionConfig::default(), Arc::new(gateway))
            .with_emitter(Arc::new(emitter))
            .start();
        (handle, events)
    }

    async fn next_flush(events: &mut UnboundedReceiver<ScanEvent>) -> DrainedBatch {
        loop {
            match events.recv().await {
                Some(ScanEvent::Flushed(batch)) => return batch,
                Some(_) => continue,
                None => panic!("session stopped without flushing"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_fires_once_after_last_scan() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);
        let start = Instant::now();

        handle.submit("X").await.unwrap();
        sleep(Duration::from_secs(5)).await;
        let outcome = handle.submit("X").await.unwrap();

        match outcome {
            ScanOutcome::Accepted { snapshot, .. } => assert_eq!(snapshot.quantity_of("X"), 2),
            other => panic!("scan rejected: {other:?}"),
        }
        let status = handle.status();
        assert_eq!(status.flush_deadline, Some(start + Duration::from_secs(15)));

        // The first deadline (t=10) no longer applies
        assert!(timeout(Duration::from_millis(9_900), next_flush(&mut events))
            .await
            .is_err());
        let batch = timeout(Duration::from_millis(200), next_flush(&mut events))
            .await
            .expect("batch should flush at t=15");

        assert_eq!(batch.entries, vec![BatchEntry::new("X", 2)]);
        assert!(handle.is_empty());
        assert!(!handle.status().is_counting());
        assert_eq!(calls.recv().await, Some(("X".to_string(), 2)));

        // Exactly once
        assert!(timeout(Duration::from_secs(60), next_flush(&mut events))
            .await
            .is_err());
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_at_expiry_instant_starts_next_batch() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);
        let start = Instant::now();

        handle.submit("X").await.unwrap();
        tokio::time::advance(WINDOW).await;
        let outcome = handle.submit("Y").await.unwrap();

        let batch = next_flush(&mut events).await;
        assert_eq!(batch.entries, vec![BatchEntry::new("X", 1)]);

        match outcome {
            ScanOutcome::Accepted { snapshot, .. } => {
                assert_eq!(snapshot.entries, vec![BatchEntry::new("Y", 1)]);
            }
            other => panic!("scan rejected: {other:?}"),
        }
        let status = handle.status();
        assert_eq!(status.snapshot.entries, vec![BatchEntry::new("Y", 1)]);
        assert_eq!(status.flush_deadline, Some(start + WINDOW * 2));

        assert_eq!(calls.recv().await, Some(("X".to_string(), 1)));
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_at_expiry_instant_leaves_drained_batch_alone() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);

        handle.submit("X").await.unwrap();
        tokio::time::advance(WINDOW).await;
        assert_eq!(handle.undo().await.unwrap(), None);

        let batch = next_flush(&mut events).await;
        assert_eq!(batch.entries, vec![BatchEntry::new("X", 1)]);
        assert!(handle.is_empty());
        assert!(!handle.status().is_counting());
        assert_eq!(calls.recv().await, Some(("X".to_string(), 1)));
    }

    /// Runs one command on a session that is not spawned, so the timer
    /// branch of the loop never gets a chance to fire first.
    fn run_command<T>(
        session: &mut ScanSession,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> T {
        let (reply_tx, mut reply_rx) = oneshot::channel();
        assert!(session.handle_command(command(reply_tx)));
        reply_rx.try_recv().expect("command answered")
    }

    fn idle_session(
        gateway: RecordingGateway,
    ) -> (ScanSession, UnboundedReceiver<ScanEvent>) {
        let (emitter, events) = ChannelEmitter::new();
        let session = ScanSession::new(SessionConfig::default(), Arc::new(gateway))
            .with_emitter(Arc::new(emitter));
        (session, events)
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_deadline_drains_before_scan_is_handled() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (mut session, mut events) = idle_session(gateway);
        let start = Instant::now();

        run_command(&mut session, |reply| SessionCommand::Submit {
            raw: "X".to_string(),
            reply,
        });
        // Deadline passes while nobody polls the countdown
        tokio::time::advance(WINDOW).await;

        let outcome = run_command(&mut session, |reply| SessionCommand::Submit {
            raw: "Y".to_string(),
            reply,
        });
        match outcome {
            ScanOutcome::Accepted { snapshot, .. } => {
                assert_eq!(snapshot.entries, vec![BatchEntry::new("Y", 1)]);
            }
            other => panic!("scan rejected: {other:?}"),
        }

        match events.try_recv() {
            Ok(ScanEvent::Flushed(batch)) => {
                assert_eq!(batch.entries, vec![BatchEntry::new("X", 1)]);
            }
            other => panic!("expected a flush first, got {other:?}"),
        }
        assert_eq!(session.timer.deadline(), Some(start + WINDOW * 2));
        assert_eq!(calls.recv().await, Some(("X".to_string(), 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_deadline_drains_before_undo_is_handled() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (mut session, mut events) = idle_session(gateway);

        run_command(&mut session, |reply| SessionCommand::Submit {
            raw: "X".to_string(),
            reply,
        });
        tokio::time::advance(WINDOW + Duration::from_millis(1)).await;

        let reverted = run_command(&mut session, |reply| SessionCommand::Undo { reply });
        assert_eq!(reverted, None);

        match events.try_recv() {
            Ok(ScanEvent::Flushed(batch)) => {
                assert_eq!(batch.entries, vec![BatchEntry::new("X", 1)]);
            }
            other => panic!("expected a flush first, got {other:?}"),
        }
        assert!(session.batch.is_empty());
        assert!(!session.timer.is_counting());
        assert_eq!(calls.recv().await, Some(("X".to_string(), 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_command_before_deadline_does_not_flush() {
        let (gateway, _calls) = RecordingGateway::new();
        let (mut session, mut events) = idle_session(gateway);

        run_command(&mut session, |reply| SessionCommand::Submit {
            raw: "X".to_string(),
            reply,
        });
        tokio::time::advance(WINDOW - Duration::from_millis(1)).await;
        run_command(&mut session, |reply| SessionCommand::Undo { reply });

        assert!(events.try_recv().is_err());
        assert!(session.timer.is_counting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_debounce_window_keeps_session_alive() {
        let (gateway, _calls) = RecordingGateway::new();
        let config = SessionConfig {
            debounce: Duration::from_secs(u64::MAX),
            ..SessionConfig::default()
        };
        let handle = ScanSession::new(config, Arc::new(gateway)).start();

        let outcome = handle.submit("A").await.unwrap();
        assert!(outcome.is_accepted());
        assert!(handle.is_running());
        assert!(handle.status().is_counting());
        assert_eq!(handle.status().snapshot.quantity_of("A"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_deadline_never_flushes() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);

        handle.submit("X").await.unwrap();
        sleep(Duration::from_secs(5)).await;
        handle.shutdown().await.unwrap();
        sleep(Duration::from_secs(60)).await;

        // Emitter and gateway are gone with the session, nothing was sent
        assert_eq!(events.recv().await, None);
        assert_eq!(calls.recv().await, None);
        assert!(!handle.is_running());
        assert!(matches!(
            handle.submit("Y").await,
            Err(SyncError::ShuttingDown)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handles_tears_session_down() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);

        handle.submit("X").await.unwrap();
        let status = handle.subscribe();
        drop(handle);
        sleep(Duration::from_secs(60)).await;

        assert_eq!(events.recv().await, None);
        assert_eq!(calls.recv().await, None);
        assert!(status.borrow().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_keeps_countdown_running() {
        let (gateway, _calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);
        let start = Instant::now();

        handle.submit("A").await.unwrap();
        handle.submit("B").await.unwrap();
        sleep(Duration::from_secs(3)).await;

        let reverted = handle.undo().await.unwrap();
        assert_eq!(reverted.as_ref().map(ScanCode::as_str), Some("B"));
        assert_eq!(handle.undo().await.unwrap(), None);

        let status = handle.status();
        assert_eq!(status.flush_deadline, Some(start + WINDOW));
        assert_eq!(status.snapshot.entries, vec![BatchEntry::new("A", 1)]);

        let batch = next_flush(&mut events).await;
        assert_eq!(batch.entries, vec![BatchEntry::new("A", 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_undo_emptying_batch_flushes_nothing() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);

        handle.submit("A").await.unwrap();
        handle.undo().await.unwrap();
        assert!(handle.is_empty());
        assert!(handle.status().is_counting());

        assert!(timeout(Duration::from_secs(30), next_flush(&mut events))
            .await
            .is_err());
        assert!(!handle.status().is_counting());
        assert!(calls.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_input_is_ignored() {
        let (gateway, _calls) = RecordingGateway::new();
        let (handle, _events) = start_session(gateway);

        let outcome = handle.submit("   ").await.unwrap();
        assert_eq!(
            outcome,
            ScanOutcome::Ignored(ValidationError::Required {
                field: "code".to_string()
            })
        );

        let outcome = handle.submit("AB\u{7}C").await.unwrap();
        assert!(matches!(
            outcome,
            ScanOutcome::Ignored(ValidationError::InvalidFormat { .. })
        ));

        let status = handle.status();
        assert!(status.is_empty());
        assert!(!status.is_counting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_trims_whitespace() {
        let (gateway, _calls) = RecordingGateway::new();
        let (handle, _events) = start_session(gateway);

        let outcome = handle.submit("  A-1\n").await.unwrap();
        assert!(outcome.is_accepted());
        assert_eq!(handle.status().snapshot.quantity_of("A-1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_commit_is_not_requeued() {
        let (gateway, _calls) = RecordingGateway::failing_for(&["BAD"]);
        let (handle, mut events) = start_session(gateway);

        handle.submit("BAD").await.unwrap();
        next_flush(&mut events).await;

        loop {
            match events.recv().await {
                Some(ScanEvent::CommitFailed { entry, .. }) => {
                    assert_eq!(entry, BatchEntry::new("BAD", 1));
                    break;
                }
                Some(_) => continue,
                None => panic!("session stopped"),
            }
        }
        assert!(handle.is_empty());
        assert!(!handle.status().is_counting());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_now_drains_and_cancels_countdown() {
        let (gateway, mut calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);

        assert_eq!(handle.flush_now().await.unwrap(), None);

        handle.submit("A").await.unwrap();
        handle.submit("A").await.unwrap();
        let batch = handle.flush_now().await.unwrap().expect("batch pending");
        assert_eq!(batch.entries, vec![BatchEntry::new("A", 2)]);
        assert!(!handle.status().is_counting());
        assert_eq!(next_flush(&mut events).await, batch);
        assert_eq!(calls.recv().await, Some(("A".to_string(), 2)));

        // Countdown was cancelled: no second flush
        assert!(timeout(Duration::from_secs(30), next_flush(&mut events))
            .await
            .is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scans_during_commit_join_next_batch() {
        let (gateway, _calls) = RecordingGateway::new();
        let (handle, mut events) = start_session(gateway);

        handle.submit("A").await.unwrap();
        let first = handle.flush_now().await.unwrap().expect("batch pending");
        handle.submit("A").await.unwrap();
        handle.submit("B").await.unwrap();

        assert_eq!(first.entries, vec![BatchEntry::new("A", 1)]);
        assert_eq!(next_flush(&mut events).await, first);

        let second = next_flush(&mut events).await;
        assert_ne!(second.id, first.id);
        assert_eq!(
            second.entries,
            vec![BatchEntry::new("A", 1), BatchEntry::new("B", 1)]
        );
    }

    #[test]
    fn test_status_countdown_display() {
        let now = Instant::now();
        let status = ScanStatus {
            snapshot: BatchSnapshot::default(),
            flush_deadline: Some(now + Duration::from_millis(2_500)),
            debounce: WINDOW,
        };

        assert_eq!(status.seconds_left(now), Some(3));
        assert_eq!(status.seconds_left(now + Duration::from_millis(2_500)), Some(0));
        assert!((status.progress(now) - 0.75).abs() < 1e-9);
        assert_eq!(status.progress(now + WINDOW), 1.0);

        let idle = ScanStatus {
            flush_deadline: None,
            ..status
        };
        assert_eq!(idle.seconds_left(now), None);
        assert_eq!(idle.progress(now), 0.0);
    }

    #[test]
    fn test_session_config_from_settings() {
        let settings = ScanSettings {
            debounce_secs: 4,
            max_code_len: 32,
        };
        let config = SessionConfig::from(&settings);
        assert_eq!(config.debounce, Duration::from_secs(4));
        assert_eq!(config.max_code_len, 32);
    }
}
