//! Station console: input parsing and human-readable output.

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use stockscan_core::BatchSnapshot;
use stockscan_sync::{ScanEvent, ScanStatus};

/// One line typed (or scanned) at the station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StationInput {
    /// Anything that is not a command. The session validates it.
    Scan(String),
    Undo,
    Flush,
    Status,
    Quit,
    Help,
    /// A `:` command we do not know.
    Unknown(String),
}

impl StationInput {
    /// `::` escapes a code that itself starts with `:`.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if let Some(literal) = trimmed.strip_prefix("::") {
            return StationInput::Scan(format!(":{}", literal));
        }
        let Some(command) = trimmed.strip_prefix(':') else {
            return StationInput::Scan(line.to_string());
        };

        match command.trim().to_lowercase().as_str() {
            "undo" | "u" => StationInput::Undo,
            "flush" | "f" => StationInput::Flush,
            "status" | "s" => StationInput::Status,
            "quit" | "q" | "exit" => StationInput::Quit,
            "help" | "h" | "?" => StationInput::Help,
            other => StationInput::Unknown(other.to_string()),
        }
    }
}

pub const HELP: &str = "\
Scan or type a code and press Enter.
  :undo    revert the last scan
  :flush   send the batch now
  :status  show the pending batch
  :quit    leave the station
A code starting with ':' is scanned as '::code'.";

/// Renders the batch table.
pub fn render_batch(snapshot: &BatchSnapshot) -> String {
    if snapshot.is_empty() {
        return "  (no pending scans)".to_string();
    }

    let width = snapshot
        .entries
        .iter()
        .map(|e| e.code.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    let mut out = format!("  {:<width$}  QTY", "CODE", width = width);
    for entry in &snapshot.entries {
        out.push_str(&format!(
            "\n  {:<width$}  {}",
            entry.code,
            entry.quantity,
            width = width
        ));
    }
    out
}

/// Renders the full status, countdown included.
pub fn render_status(status: &ScanStatus, now: Instant) -> String {
    let mut out = render_batch(&status.snapshot);
    if let Some(secs) = status.seconds_left(now) {
        let filled = (status.progress(now) * 20.0).round() as usize;
        out.push_str(&format!(
            "\n  Syncing in {}s [{}{}]",
            secs,
            "#".repeat(filled),
            "-".repeat(20 - filled.min(20))
        ));
    }
    out
}

/// Prints flush and commit outcomes until the session is gone.
pub async fn print_events(mut events: UnboundedReceiver<ScanEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            ScanEvent::Flushed(batch) => println!(
                "Sending {} code(s), {} scan(s)...",
                batch.len(),
                batch.total_quantity()
            ),
            ScanEvent::Committed { entry, .. } => {
                println!("  added {} x {}", entry.quantity, entry.code)
            }
            ScanEvent::CommitFailed { entry, error, .. } => {
                println!("  FAILED {} x {}: {}", entry.quantity, entry.code, error)
            }
        }
    }
}
