//! # StockScan Scan Station
//!
//! Terminal front end for the scan-and-batch inventory flow. Every line read
//! from stdin is a scan (barcode readers type the code and press Enter);
//! lines starting with `:` are station commands (`::` scans a literal
//! leading colon).
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Load `ScanConfig` (path from the first argument, else the default)
//! 3. Build the inventory gateway for the commit policy
//! 4. Start the scan session and the event printer
//! 5. Read scans until `:quit`, Ctrl-C or end of input
//!
//! ## Leaving
//! Pending scans live only in memory. Leaving with a nonempty batch prints
//! a warning and needs a second `:quit` (or Ctrl-C); `:flush` sends the
//! batch right away instead.

mod console;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use stockscan_sync::{
    build_gateway, ChannelEmitter, LeaveDecision, ScanConfig, ScanOutcome, ScanSession,
    SessionConfig, SyncError, SyncGateway, SyncResult, UnloadGuard,
};

use console::{print_events, render_status, StationInput, HELP};

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    init_logging();

    let (config, gateway) = configure().map_err(|e| {
        if e.is_config_error() {
            error!(error = %e, "Scan configuration rejected, fix scan.toml or STOCKSCAN_* variables");
        }
        e
    })?;
    let (emitter, events) = ChannelEmitter::new();
    let printer = tokio::spawn(print_events(events));

    let session = ScanSession::new(SessionConfig::from(&config.scan), gateway)
        .with_emitter(Arc::new(emitter))
        .start();
    let guard = UnloadGuard::new(session.clone());

    info!(
        station = %config.station.name,
        debounce_secs = config.scan.debounce_secs,
        "Scan station ready"
    );
    println!("{} - {}", config.station.name, HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Set after a leave attempt was refused; the next one goes through
    let mut leave_warned = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    if let Some(warning) = guard.check().warning() {
                        warn!("Input closed with unsent scans");
                        println!("{}", warning);
                    }
                    break;
                };

                let input = StationInput::parse(&line);
                if input != StationInput::Quit {
                    leave_warned = false;
                }

                match input {
                    StationInput::Scan(text) => match session.submit(text).await? {
                        ScanOutcome::Accepted { code, snapshot } => {
                            println!("+ {} ({} pending)", code, snapshot.quantity_of(code.as_str()));
                        }
                        ScanOutcome::Ignored(_) => {}
                    },
                    StationInput::Undo => match session.undo().await? {
                        Some(code) => println!("- {} (undone)", code),
                        None => println!("Nothing to undo"),
                    },
                    StationInput::Flush => {
                        if session.flush_now().await?.is_none() {
                            println!("Nothing to send");
                        }
                    }
                    StationInput::Status => {
                        println!("{}", render_status(&session.status(), Instant::now()));
                    }
                    StationInput::Help => println!("{}", HELP),
                    StationInput::Unknown(command) => {
                        println!("Unknown command :{} (try :help)", command);
                    }
                    StationInput::Quit => {
                        if may_leave(&guard, &mut leave_warned) {
                            break;
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                if may_leave(&guard, &mut leave_warned) {
                    break;
                }
            }
        }
    }

    session.shutdown().await?;
    drop(session);
    drop(guard);
    // Ends once every in-flight commit has reported
    let _ = printer.await;

    info!("Scan station closed");
    Ok(())
}

/// Loads the configuration and builds the gateway it describes.
fn configure() -> SyncResult<(ScanConfig, Arc<dyn SyncGateway>)> {
    let config = match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => ScanConfig::load(Some(path))?,
        None => ScanConfig::load_or_default(None),
    };
    let gateway = build_gateway(&config)?;
    Ok((config, gateway))
}

/// Asks for confirmation when unsent scans would be lost.
fn may_leave(guard: &UnloadGuard, leave_warned: &mut bool) -> bool {
    let decision = guard.check();
    if decision == LeaveDecision::Allow || *leave_warned {
        return true;
    }

    if let Some(warning) = decision.warning() {
        println!("{}", warning);
    }
    println!("Use :flush to send them, or :quit again to leave anyway.");
    *leave_warned = true;
    false
}

/// Initializes the tracing subscriber.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockscan=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

