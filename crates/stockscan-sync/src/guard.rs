//! # Unload Guard
//!
//! Decides whether the station may be left while scans are still pending.
//! Pending scans live only in memory; leaving before the flush loses them.

use crate::session::{ScanSessionHandle, ScanStatus};

/// Whether leaving the station needs confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveDecision {
    /// Nothing pending.
    Allow,

    /// Unsent scans would be lost.
    Confirm {
        pending_codes: usize,
        pending_quantity: u64,
    },
}

impl LeaveDecision {
    /// Builds the decision for a status.
    pub fn for_status(status: &ScanStatus) -> Self {
        if status.is_empty() {
            LeaveDecision::Allow
        } else {
            LeaveDecision::Confirm {
                pending_codes: status.snapshot.len(),
                pending_quantity: status.snapshot.total_quantity(),
            }
        }
    }

    /// Returns true if the user must confirm.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, LeaveDecision::Confirm { .. })
    }

    /// Message to show before leaving, if any.
    pub fn warning(&self) -> Option<String> {
        match self {
            LeaveDecision::Allow => None,
            LeaveDecision::Confirm {
                pending_codes,
                pending_quantity,
            } => Some(format!(
                "{} scan(s) across {} code(s) have not been sent yet and will be lost if you leave now",
                pending_quantity, pending_codes
            )),
        }
    }
}

/// Leave check backed by a running scan session.
#[derive(Clone)]
pub struct UnloadGuard {
    handle: ScanSessionHandle,
}

impl UnloadGuard {
    pub fn new(handle: ScanSessionHandle) -> Self {
        UnloadGuard { handle }
    }

    /// Checks the latest published batch.
    pub fn check(&self) -> LeaveDecision {
        if self.handle.is_empty() {
            return LeaveDecision::Allow;
        }
        LeaveDecision::for_status(&self.handle.status())
    }
}
