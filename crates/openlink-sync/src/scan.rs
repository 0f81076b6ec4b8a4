//! Discovery collaborator boundary.
//!
//! Discovery (the scanning procedure) runs per PHY and may pursue the same
//! logical sync request on two PHYs in parallel. Each PHY exposes one
//! pending-sync-target slot this core attaches a context handle to; the
//! descriptor arrives later through [`crate::manager::SyncManager::setup`].
//!
//! The pending slot is the single intentionally lock-free interaction in
//! the design: a cancellation in the thread context races an establishment
//! completing in the high-priority context, and the swap-then-read protocol
//! on this slot plus the establishment flag arbitrates it. The pattern is
//! deliberately not generalized elsewhere.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::notify::HANDLE_NONE;
use crate::pool::SyncHandle;

/// Discovery PHY instances a pending target can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhy {
    /// 1 Mbit/s primary scanning.
    M1,
    /// Coded PHY primary scanning.
    Coded,
}

/// The per-PHY pending-sync-target slot.
#[derive(Debug)]
pub struct PendingSlot(AtomicU16);

impl Default for PendingSlot {
    fn default() -> Self {
        Self(AtomicU16::new(HANDLE_NONE))
    }
}

impl PendingSlot {
    /// Attach a pending sync context.
    pub fn attach(&self, handle: SyncHandle) {
        self.0.store(handle, Ordering::Release);
    }

    /// Read the attached handle without detaching.
    #[must_use]
    pub fn peek(&self) -> Option<SyncHandle> {
        match self.0.load(Ordering::Acquire) {
            HANDLE_NONE => None,
            h => Some(h),
        }
    }

    /// Detach and return the attached handle.
    ///
    /// Sequentially-consistent swap: the full barrier orders this write
    /// before the caller's read of the establishment flag, which is what
    /// makes the cancellation protocol sound.
    #[must_use]
    pub fn take(&self) -> Option<SyncHandle> {
        match self.0.swap(HANDLE_NONE, Ordering::SeqCst) {
            HANDLE_NONE => None,
            h => Some(h),
        }
    }

    /// Detach without caring about the previous value. Used by setup after
    /// establishment has been published.
    pub fn clear(&self) {
        self.0.store(HANDLE_NONE, Ordering::Release);
    }
}

/// Per-PHY periodic-scan state at the discovery boundary.
#[derive(Debug, Default)]
pub struct PeriodicScanState {
    /// Pending sync target slot.
    pub pending: PendingSlot,
    /// Use the filter list instead of the explicit identity below.
    pub filter_policy: bool,
    /// Advertising set id to synchronize to.
    pub sid: u8,
    /// Remote address type.
    pub adv_addr_type: u8,
    /// Remote address.
    pub adv_addr: [u8; 6],
}
