//! Periodic event scheduler (ticker) boundary.
//!
//! The ticker owns the compare-register machinery; this core only issues
//! start/update/stop requests against a stable entry id derived from the
//! sync handle. Requests are accepted or deferred immediately; the actual
//! outcome arrives later through a completion callback. Completions for one
//! entry are delivered in issuance order.

use crate::dispatch::ExecContext;

/// Ticker entry id.
pub type TickerId = u8;

/// First ticker entry id reserved for periodic sync roles.
pub const TICKER_ID_SYNC_BASE: u8 = 0x10;

/// Ticker entry id for a sync pool handle.
#[must_use]
pub fn sync_ticker_id(handle: u16) -> TickerId {
    TICKER_ID_SYNC_BASE.wrapping_add(handle as u8)
}

/// Immediate outcome of issuing a ticker request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerRequest {
    /// Request queued for execution.
    Accepted,
    /// Scheduler job queue momentarily contended; the request is still
    /// queued and will resolve through the completion callback.
    Busy,
    /// Request not queued at all.
    Rejected,
}

/// Asynchronous completion status of a ticker operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerOpStatus {
    /// Operation applied.
    Success,
    /// Resolved after contention; effect applied.
    Busy,
    /// The entry is already marked for disable; the operation was dropped.
    /// Benign race with a concurrent stop.
    DisableMarked,
    /// Operation failed. Fatal: indicates a scheduler logic defect.
    Failure,
}

/// Synchronous outcome of a stop-with-mark request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopMark {
    /// Entry stopped and marked.
    Stopped,
    /// A stop for this entry is already in flight.
    AlreadyStopping,
}

/// Parameters for starting a periodic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerStart {
    /// Absolute anchor in ticks, already offset for slot overhead.
    pub anchor_ticks: u32,
    /// Offset from the anchor to the first expiry, in ticks.
    pub first_offset_ticks: u32,
    /// Periodic reload in whole ticks.
    pub interval_ticks: u32,
    /// Sub-tick remainder of the interval.
    pub remainder: u32,
    /// Events to silently pass before the first callback; 0 for none.
    pub lazy: u16,
    /// Reserved slot duration in ticks.
    pub slot_ticks: u32,
}

/// Parameters for updating a running periodic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickerUpdate {
    /// Ticks to push the expiry later.
    pub drift_plus_ticks: u32,
    /// Ticks to pull the expiry earlier.
    pub drift_minus_ticks: u32,
    /// Ticks to grow the reserved slot.
    pub slot_plus_ticks: u32,
    /// Ticks to shrink the reserved slot.
    pub slot_minus_ticks: u32,
    /// New lazy count; 0 leaves the current value.
    pub lazy: u16,
    /// Force the next event to fire even while a lazy window is open.
    pub force: bool,
}

/// Expiry parameters delivered when a periodic entry fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerExpire {
    /// Sync pool handle the entry belongs to.
    pub handle: u16,
    /// Absolute expiry time in ticks.
    pub ticks_at_expire: u32,
    /// Sub-tick remainder at expiry.
    pub remainder: u32,
    /// Events silently passed since the last callback.
    pub lazy: u16,
    /// Whether this event was forced.
    pub force: bool,
}

/// Completion callback for an asynchronous ticker operation.
pub type TickerOpCallback = Box<dyn FnOnce(TickerOpStatus) + Send>;

/// External periodic event scheduler collaborator.
pub trait PeriodicTicker {
    /// Start a periodic entry.
    fn start(
        &mut self,
        user: ExecContext,
        id: TickerId,
        req: TickerStart,
        op_cb: TickerOpCallback,
    ) -> TickerRequest;

    /// Update a running entry.
    fn update(
        &mut self,
        user: ExecContext,
        id: TickerId,
        req: TickerUpdate,
        op_cb: TickerOpCallback,
    ) -> TickerRequest;

    /// Stop an entry, reporting completion asynchronously.
    fn stop(&mut self, user: ExecContext, id: TickerId, op_cb: TickerOpCallback) -> TickerRequest;

    /// Stop an entry with the mark-and-wait discipline used by thread-context
    /// termination. Idempotent: both outcomes are acceptable; the entry is
    /// guaranteed not to fire again after either.
    fn stop_with_mark(&mut self, user: ExecContext, id: TickerId) -> StopMark;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_ticker_id_is_stable() {
        assert_eq!(sync_ticker_id(0), TICKER_ID_SYNC_BASE);
        assert_eq!(sync_ticker_id(3), TICKER_ID_SYNC_BASE + 3);
        assert_ne!(sync_ticker_id(0), sync_ticker_id(1));
    }
}
