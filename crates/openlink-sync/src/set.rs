//! Per-role sync context: the state tracked for one periodic-listening
//! relationship.

use std::sync::atomic::{AtomicU16, Ordering};

use crate::chanmap::ChanMapStore;
use crate::notify::LossNotice;
use crate::timing::Phy;

/// Radio-facing timing context, read by the radio-prepare step each
/// scheduled event and mutated only by the supervision engine and that
/// step.
#[derive(Debug, Default)]
pub struct RadioTiming {
    /// Access address of the periodic train.
    pub access_addr: [u8; 4],
    /// CRC initialization value.
    pub crc_init: [u8; 3],
    /// CSA#2 channel identifier derived from the access address.
    pub data_chan_id: u16,
    /// Event counter of the next periodic event.
    pub event_counter: u16,
    /// PHY the train runs on.
    pub phy: Phy,
    /// Skip counter latched for the upcoming prepare.
    pub skip_prepare: u16,
    /// Live scheduled-absence budget, decremented by the radio-prepare step.
    pub skip_event: u16,
    /// Window widening accumulated for the upcoming prepare, in us.
    pub window_widening_prepare_us: u32,
    /// Window widening accumulated for the current event, in us.
    pub window_widening_event_us: u32,
    /// Widening added per elapsed interval, in us.
    pub window_widening_periodic_us: u32,
    /// Ceiling on accumulated widening, in us.
    pub window_widening_max_us: u32,
    /// First-event listen window size (descriptor offset unit), in us.
    pub window_size_event_us: u32,
    /// Whether reports are delivered to the host.
    pub rx_enabled: bool,
    /// Double-buffered channel map.
    pub chm: ChanMapStore,
}

/// One sync set context.
///
/// Field ownership follows the single-writer convention: the thread context
/// writes during creation, cancellation and termination; the high-priority
/// controller context writes from scheduler callbacks once the entry is
/// live. `timeout_reload` is the one field read across contexts: it is the
/// establishment flag arbitrating the cancellation race, hence atomic.
#[derive(Debug, Default)]
pub struct SyncSet {
    /// Configured consecutive events the receiver may skip.
    pub skip: u16,
    /// Configured supervision timeout in 10 ms units.
    pub timeout_10ms: u16,
    /// Supervision reload in events; 0 until established.
    timeout_reload: AtomicU16,
    /// Live supervision countdown; 0 means inactive.
    pub timeout_expire: u16,
    /// Pre-allocated loss notification resource.
    pub loss_notice: LossNotice,
    /// Opaque broadcast-isochronous-stream linkage.
    pub iso_handle: Option<u16>,
    /// Lower-level radio timing context.
    pub radio: RadioTiming,
}

impl SyncSet {
    /// Reinitialize for a fresh creation. The loss notice must already have
    /// been drained by the caller.
    pub fn init(&mut self, skip: u16, timeout_10ms: u16, rx_enabled: bool) {
        self.skip = skip;
        self.timeout_10ms = timeout_10ms;
        self.timeout_reload.store(0, Ordering::Relaxed);
        self.timeout_expire = 0;
        self.iso_handle = None;
        self.radio = RadioTiming {
            rx_enabled,
            ..RadioTiming::default()
        };
        self.radio.chm.align();
    }

    /// Whether establishment has completed.
    ///
    /// Uses acquire ordering: paired with the release store in
    /// [`SyncSet::mark_established`], this is the read side of the
    /// cancellation handshake.
    #[must_use]
    pub fn is_established(&self) -> bool {
        self.timeout_reload.load(Ordering::Acquire) != 0
    }

    /// Supervision reload value in events.
    #[must_use]
    pub fn timeout_reload(&self) -> u16 {
        self.timeout_reload.load(Ordering::Acquire)
    }

    /// Publish the supervision reload, marking the context established.
    pub fn mark_established(&self, reload: u16) {
        self.timeout_reload.store(reload, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeState, RxLink};

    #[test]
    fn test_init_clears_timers() {
        let mut set = SyncSet::default();
        set.mark_established(5);
        set.timeout_expire = 3;
        set.iso_handle = Some(2);

        set.init(2, 100, true);
        assert!(!set.is_established());
        assert_eq!(set.timeout_expire, 0);
        assert_eq!(set.skip, 2);
        assert_eq!(set.timeout_10ms, 100);
        assert!(set.radio.rx_enabled);
        assert!(set.iso_handle.is_none());
        assert!(!set.radio.chm.update_in_progress());
    }

    #[test]
    fn test_established_flag() {
        let set = SyncSet::default();
        assert!(!set.is_established());
        set.mark_established(7);
        assert!(set.is_established());
        assert_eq!(set.timeout_reload(), 7);
    }

    #[test]
    fn test_init_preserves_notice_state_for_caller() {
        // init does not touch the notice; draining it is the caller's job
        let mut set = SyncSet::default();
        set.loss_notice.arm(RxLink(1));
        set.init(0, 10, false);
        assert_eq!(set.loss_notice.state(), NoticeState::Armed);
    }
}
