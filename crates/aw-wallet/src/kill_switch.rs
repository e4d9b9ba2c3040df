//! Emergency-stop latch.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{error, info, warn};

/// Latched emergency stop.
///
/// One instance lives in every wallet; a second, shared instance acts as
/// the global switch covering all wallets. Once active, every pipeline
/// call short-circuits at the kill-switch check until an operator
/// deactivates it. Activation must never depend on any external call
/// succeeding.
#[derive(Debug)]
pub struct KillSwitch {
    active: AtomicBool,
    /// Reason for activation (first activation wins).
    reason: Mutex<Option<String>>,
    activated_at: Mutex<Option<DateTime<Utc>>>,
}

impl KillSwitch {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            reason: Mutex::new(None),
            activated_at: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Activate the switch. Re-activation keeps the original reason.
    pub fn activate(&self, reason: &str) {
        if !self.active.swap(true, Ordering::AcqRel) {
            *self.reason.lock() = Some(reason.to_string());
            *self.activated_at.lock() = Some(Utc::now());
            error!(reason, "KILL SWITCH ACTIVATED");
        } else {
            warn!(new_reason = reason, "Kill switch already active, keeping original reason");
        }
    }

    /// Clear the switch. Operator action only; never automatic.
    pub fn deactivate(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            let reason = self.reason.lock().take();
            *self.activated_at.lock() = None;
            info!(previous_reason = ?reason, "Kill switch deactivated");
        }
    }

    #[must_use]
    pub fn reason(&self) -> Option<String> {
        if self.is_active() {
            self.reason.lock().clone()
        } else {
            None
        }
    }

    #[must_use]
    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        if self.is_active() {
            *self.activated_at.lock()
        } else {
            None
        }
    }
}

impl Default for KillSwitch {
    fn default() -> Self {
        Self::new()
    }
}
