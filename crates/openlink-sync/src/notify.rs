//! Host-facing notification queue boundary.
//!
//! The controller never allocates while reporting: transport links and node
//! buffers are acquired up front during sync creation, held by the sync
//! context, and consumed exactly once. The queue itself is an external
//! collaborator reached through [`NotificationQueue`].

use openlink_errors::CtrlFault;

use crate::timing::Phy;

/// Sync handle carried in a report when no context applies (cancellation
/// before establishment).
pub const HANDLE_NONE: u16 = 0xFFFF;

/// Transport link for one queued notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxLink(pub u16);

/// Pre-allocated, empty notification node buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxNodeBuf(pub u16);

/// Establishment report status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstabStatus {
    /// Synchronization established.
    Success,
    /// Establishment cancelled by host request before completion.
    CancelledByHost,
}

/// A notification payload produced by this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReport {
    /// Establishment outcome.
    Established {
        /// Outcome of the establishment attempt.
        status: EstabStatus,
        /// Periodic interval in 1.25 ms units.
        interval: u16,
        /// PHY the train was found on.
        phy: Phy,
        /// Remote sleep-clock accuracy field value.
        sca: u8,
    },
    /// Supervision declared the sync lost.
    Lost,
}

/// A populated notification node ready for delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxNode {
    /// Sync handle the report refers to, or [`HANDLE_NONE`].
    pub handle: u16,
    /// The report payload.
    pub report: SyncReport,
}

/// External notification queue collaborator.
///
/// Allocation methods return `None` on exhaustion; the caller unwinds all
/// prior allocations of the same operation before surfacing a capacity
/// error.
pub trait NotificationQueue {
    /// Allocate a transport link.
    fn alloc_link(&mut self) -> Option<RxLink>;
    /// Return an unused transport link.
    fn release_link(&mut self, link: RxLink);
    /// Allocate an empty node buffer.
    fn alloc_node(&mut self) -> Option<RxNodeBuf>;
    /// Return an unused node buffer.
    fn release_node(&mut self, node: RxNodeBuf);
    /// Enqueue a populated node on its link.
    fn put(&mut self, link: RxLink, node: RxNode);
    /// Request delivery of everything enqueued so far.
    fn sched(&mut self);
}

/// State tag of a pre-allocated loss notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoticeState {
    /// No link held.
    #[default]
    Idle,
    /// Link held, ready to be consumed once.
    Armed,
    /// Link consumed; arming again requires a reset.
    Consumed,
}

/// The reusable loss-notification resource owned by a sync context.
///
/// Produced once at creation and consumed exactly once at either
/// cancellation, termination, or loss. The state tag exists to catch
/// double delivery.
#[derive(Debug, Default)]
pub struct LossNotice {
    link: Option<RxLink>,
    state: NoticeState,
}

impl LossNotice {
    /// Arm the notice with its transport link at creation time.
    pub fn arm(&mut self, link: RxLink) {
        self.link = Some(link);
        self.state = NoticeState::Armed;
    }

    /// Consume the link. Exactly-once: a second consume reports a
    /// controller fault.
    ///
    /// # Errors
    ///
    /// Returns [`CtrlFault::NoticeDoubleConsume`] when the notice is not
    /// armed.
    pub fn consume(&mut self) -> Result<RxLink, CtrlFault> {
        match (self.state, self.link.take()) {
            (NoticeState::Armed, Some(link)) => {
                self.state = NoticeState::Consumed;
                Ok(link)
            }
            _ => Err(CtrlFault::NoticeDoubleConsume),
        }
    }

    /// Current state tag.
    #[must_use]
    pub fn state(&self) -> NoticeState {
        self.state
    }

    /// Drop any held link and return to idle. Used when the context is
    /// reinitialized.
    pub fn reset(&mut self) -> Option<RxLink> {
        self.state = NoticeState::Idle;
        self.link.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_consume_exactly_once() {
        let mut notice = LossNotice::default();
        assert_eq!(notice.state(), NoticeState::Idle);
        assert_eq!(notice.consume(), Err(CtrlFault::NoticeDoubleConsume));

        notice.arm(RxLink(3));
        assert_eq!(notice.state(), NoticeState::Armed);
        assert_eq!(notice.consume(), Ok(RxLink(3)));
        assert_eq!(notice.state(), NoticeState::Consumed);

        assert_eq!(notice.consume(), Err(CtrlFault::NoticeDoubleConsume));
    }

    #[test]
    fn test_notice_reset_returns_link() {
        let mut notice = LossNotice::default();
        notice.arm(RxLink(9));
        assert_eq!(notice.reset(), Some(RxLink(9)));
        assert_eq!(notice.state(), NoticeState::Idle);
        assert_eq!(notice.reset(), None);
    }
}
