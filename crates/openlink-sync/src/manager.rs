//! Periodic sync lifecycle controller.
//!
//! Host commands (create, cancel, terminate, slot update) enter in the
//! thread context; establishment and scheduler callbacks enter in the
//! high-priority controller context. The manager owns the sync set pool and
//! the discovery pending-target slots and drives the external ticker,
//! notification queue and cross-context dispatcher collaborators.
//!
//! Resource discipline: everything a sync context will ever need to notify
//! the host (two transport links and a node buffer) is allocated during
//! `create`, before the context becomes reachable from any other execution
//! context. Failure paths release in reverse acquisition order so a failed
//! command leaves no trace.

use std::sync::Arc;

use openlink_errors::{CtrlFault, SlotUpdateError, SyncError, SyncResult};

use crate::config::SyncConfig;
use crate::dispatch::{CrossContextDispatcher, ExecContext, Task};
use crate::notify::{
    EstabStatus, HANDLE_NONE, NotificationQueue, RxLink, RxNode, RxNodeBuf, SyncReport,
};
use crate::pool::{SyncHandle, SyncPool};
use crate::scan::{PeriodicScanState, ScanPhy};
use crate::scheduler::{
    PeriodicTicker, StopMark, TickerOpCallback, TickerOpStatus, TickerRequest, TickerStart,
    TickerUpdate, sync_ticker_id,
};
use crate::syncinfo::{SyncInfo, channel_id};
use crate::timing::{
    EVENT_JITTER_US, EVENT_OVERHEAD_END_US, EVENT_OVERHEAD_START_US, EVENT_OVERHEAD_XTAL_US,
    OFFS_ADJUST_US, OFFS_UNIT_30_US, OFFS_UNIT_300_US, Phy, TICKER_RES_MARGIN_US, pdu_airtime_us,
    pdu_airtime_max_us, sca_ppm, supervision_reload, ticker_remainder, us_to_ticks,
    window_widening_max_us, window_widening_periodic_us,
};

/// Identity of the periodic broadcaster to synchronize to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncTarget {
    /// Advertising set id.
    pub sid: u8,
    /// Remote address type.
    pub adv_addr_type: u8,
    /// Remote address.
    pub adv_addr: [u8; 6],
}

/// Host options for a sync creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Match against the periodic advertiser filter list instead of the
    /// explicit target identity.
    pub use_filter_list: bool,
    /// Deliver periodic reports to the host once established.
    pub reporting_enabled: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            use_filter_list: false,
            reporting_enabled: true,
        }
    }
}

/// Reception metadata accompanying a descriptor handed over by discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRxMeta {
    /// Scheduler tick count at the start of the received event.
    pub ticks_anchor: u32,
    /// Microseconds from that anchor to the end of the received packet.
    pub radio_end_us: u32,
    /// PHY the referencing packet was received on.
    pub phy: Phy,
    /// Payload length of the referencing packet.
    pub pdu_len: u8,
}

/// The periodic sync manager.
///
/// Generic over the scheduler and notification queue collaborators so tests
/// drive it with instrumented doubles; the dispatcher is shared with
/// scheduler callbacks and therefore dynamic.
pub struct SyncManager<T, N> {
    pub(crate) config: SyncConfig,
    pub(crate) pool: SyncPool,
    pub(crate) scan_1m: PeriodicScanState,
    pub(crate) scan_coded: Option<PeriodicScanState>,
    /// Establishment link and node buffer held between create and setup.
    pub(crate) estab_res: Option<(RxLink, RxNodeBuf)>,
    pub(crate) ticker: T,
    pub(crate) notify: N,
    pub(crate) dispatch: Arc<dyn CrossContextDispatcher>,
}

impl<T: PeriodicTicker, N: NotificationQueue> SyncManager<T, N> {
    /// Create a manager with all pool slots free.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] when the configuration fails
    /// validation.
    pub fn new(
        config: SyncConfig,
        ticker: T,
        notify: N,
        dispatch: Arc<dyn CrossContextDispatcher>,
    ) -> SyncResult<Self> {
        config.validate()?;
        let pool = SyncPool::new(config.pool_capacity);
        let scan_coded = config.coded_phy.then(PeriodicScanState::default);
        Ok(Self {
            config,
            pool,
            scan_1m: PeriodicScanState::default(),
            scan_coded,
            estab_res: None,
            ticker,
            notify,
            dispatch,
        })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The sync set pool.
    #[must_use]
    pub fn pool(&self) -> &SyncPool {
        &self.pool
    }

    /// Discovery state for a PHY, if that PHY is enabled.
    #[must_use]
    pub fn scan(&self, phy: ScanPhy) -> Option<&PeriodicScanState> {
        match phy {
            ScanPhy::M1 => Some(&self.scan_1m),
            ScanPhy::Coded => self.scan_coded.as_ref(),
        }
    }

    fn any_create_pending(&self) -> bool {
        self.scan_1m.pending.peek().is_some()
            || self
                .scan_coded
                .as_ref()
                .is_some_and(|s| s.pending.peek().is_some())
    }

    /// Begin establishing synchronization to a periodic broadcast train.
    ///
    /// Allocates every notification resource the context will ever need,
    /// initializes a pool slot and attaches it to each enabled discovery
    /// PHY as the pending sync target. Establishment completes later
    /// through [`SyncManager::setup`] when discovery hands over a
    /// descriptor.
    ///
    /// # Errors
    ///
    /// [`SyncError::Disallowed`] when a creation is already pending;
    /// [`SyncError::CapacityExceeded`] when a link, node buffer or pool
    /// slot is unavailable. On capacity failure every resource acquired so
    /// far has been released.
    pub fn create(
        &mut self,
        target: SyncTarget,
        skip: u16,
        timeout_10ms: u16,
        options: SyncOptions,
    ) -> SyncResult<SyncHandle> {
        if self.any_create_pending() {
            return Err(SyncError::Disallowed("sync establishment already pending"));
        }

        // Acquire in fixed order; unwind in reverse on any failure.
        let Some(link_estab) = self.notify.alloc_link() else {
            return Err(SyncError::CapacityExceeded("establishment link"));
        };
        let Some(link_lost) = self.notify.alloc_link() else {
            self.notify.release_link(link_estab);
            return Err(SyncError::CapacityExceeded("loss link"));
        };
        let Some(node) = self.notify.alloc_node() else {
            self.notify.release_link(link_lost);
            self.notify.release_link(link_estab);
            return Err(SyncError::CapacityExceeded("rx node buffer"));
        };
        let Some(handle) = self.pool.acquire() else {
            self.notify.release_node(node);
            self.notify.release_link(link_lost);
            self.notify.release_link(link_estab);
            return Err(SyncError::CapacityExceeded("sync set pool"));
        };

        let Some(set) = self.pool.get_mut(handle) else {
            // Freshly acquired handle is always occupied.
            return Err(SyncError::UnknownHandle(handle));
        };
        set.init(skip, timeout_10ms, options.reporting_enabled);
        set.loss_notice.arm(link_lost);
        self.estab_res = Some((link_estab, node));

        for scan in [Some(&mut self.scan_1m), self.scan_coded.as_mut()]
            .into_iter()
            .flatten()
        {
            scan.filter_policy = options.use_filter_list;
            if !options.use_filter_list {
                scan.sid = target.sid;
                scan.adv_addr_type = target.adv_addr_type;
                scan.adv_addr = target.adv_addr;
            }
            scan.pending.attach(handle);
        }

        tracing::debug!(handle, skip, timeout_10ms, "sync establishment pending");
        Ok(handle)
    }

    /// Cancel a pending sync establishment.
    ///
    /// Detaches the pending target from every discovery PHY first and only
    /// then inspects the establishment flag; the swap orders the two
    /// against a setup racing in the high-priority context, so exactly one
    /// side wins.
    ///
    /// Returns the cancellation report node for the caller to deliver.
    ///
    /// # Errors
    ///
    /// [`SyncError::Disallowed`] when nothing is pending or establishment
    /// has already completed; in the latter case the context stays live and
    /// must be terminated instead.
    pub fn create_cancel(&mut self) -> SyncResult<RxNode> {
        let taken_1m = self.scan_1m.pending.take();
        let taken_coded = self.scan_coded.as_ref().and_then(|s| s.pending.take());
        let Some(handle) = taken_1m.or(taken_coded) else {
            return Err(SyncError::Disallowed("no sync establishment pending"));
        };

        let set = self
            .pool
            .get_mut(handle)
            .ok_or(SyncError::UnknownHandle(handle))?;
        if set.is_established() {
            // Lost the race; setup already published the context.
            return Err(SyncError::Disallowed(
                "establishment completed; terminate instead",
            ));
        }

        // The context never became reachable elsewhere: hand everything back.
        let loss_link = set.loss_notice.reset();
        if let Some(link) = loss_link {
            self.notify.release_link(link);
        }
        if let Some((link_estab, node)) = self.estab_res.take() {
            self.notify.release_node(node);
            self.notify.release_link(link_estab);
        }
        self.pool.release(handle);

        tracing::debug!(handle, "sync establishment cancelled");
        Ok(RxNode {
            handle: HANDLE_NONE,
            report: SyncReport::Established {
                status: EstabStatus::CancelledByHost,
                interval: 0,
                phy: Phy::M1,
                sca: 0,
            },
        })
    }

    /// Complete establishment from a received descriptor.
    ///
    /// Called by discovery in the high-priority context with the decoded
    /// descriptor and the reception metadata of the packet that carried it.
    /// A descriptor whose channel map is below the usable-channel floor is
    /// dropped without touching the pending state; discovery keeps looking.
    ///
    /// The establishment notification is enqueued before the periodic entry
    /// is started, so the host observes establishment no later than the
    /// first periodic report.
    ///
    /// # Panics
    ///
    /// Panics with [`CtrlFault::TickerFailure`] when the scheduler rejects
    /// the start request or its completion reports failure; both indicate a
    /// scheduler capacity or logic defect.
    pub fn setup(&mut self, scan_phy: ScanPhy, si: &SyncInfo, meta: &ScanRxMeta) {
        let Some(handle) = self.scan(scan_phy).and_then(|s| s.pending.peek()) else {
            tracing::debug!(?scan_phy, "descriptor without pending sync target");
            return;
        };

        let map = si.channel_map();
        let interval_us = si.interval_us();
        let sca = si.sca();

        let Some(set) = self.pool.get_mut(handle) else {
            tracing::warn!(handle, "pending target without pool context");
            return;
        };
        if !set.radio.chm.install_active(map) {
            tracing::debug!(handle, "descriptor channel map below usable floor");
            return;
        }

        set.radio.access_addr = si.access_addr;
        set.radio.crc_init = si.crc_init;
        set.radio.data_chan_id = channel_id(si.access_addr);
        set.radio.event_counter = si.event_counter;
        set.radio.phy = meta.phy;
        set.radio.window_size_event_us = if si.offs_units {
            OFFS_UNIT_300_US
        } else {
            OFFS_UNIT_30_US
        };
        set.radio.window_widening_periodic_us =
            window_widening_periodic_us(self.config.local_sca_ppm, sca_ppm(sca), interval_us);
        set.radio.window_widening_max_us = window_widening_max_us(interval_us);
        set.radio.window_widening_prepare_us = 0;
        set.radio.window_widening_event_us = 0;
        let widening_periodic_us = set.radio.window_widening_periodic_us;

        // Publishing the reload marks the context established; a concurrent
        // cancel that already swapped the pending slot sees it and backs off.
        let reload = supervision_reload(set.timeout_10ms, interval_us);
        set.mark_established(reload);

        self.scan_1m.pending.clear();
        if let Some(scan) = self.scan_coded.as_ref() {
            scan.pending.clear();
        }

        if let Some((link, _node)) = self.estab_res.take() {
            self.notify.put(
                link,
                RxNode {
                    handle,
                    report: SyncReport::Established {
                        status: EstabStatus::Success,
                        interval: si.interval,
                        phy: meta.phy,
                        sca,
                    },
                },
            );
            self.notify.sched();
        }

        // First listen point: walk forward by the descriptor offset, then
        // back off the tail of the referencing packet and the fixed margins.
        let unit_us = if si.offs_units {
            OFFS_UNIT_300_US
        } else {
            OFFS_UNIT_30_US
        };
        let ready_delay_us = meta.phy.rx_ready_delay_us();
        let mut offset_us = meta
            .radio_end_us
            .saturating_add(u32::from(si.offs).saturating_mul(unit_us));
        if si.offs_adjust {
            offset_us = offset_us.saturating_add(OFFS_ADJUST_US);
        }
        offset_us = offset_us
            .saturating_sub(pdu_airtime_us(meta.pdu_len, meta.phy))
            .saturating_sub(TICKER_RES_MARGIN_US)
            .saturating_sub(EVENT_JITTER_US)
            .saturating_sub(ready_delay_us);

        let interval_sched_us = interval_us.saturating_sub(widening_periodic_us);
        let slot_us = EVENT_OVERHEAD_START_US
            .saturating_add(ready_delay_us)
            .saturating_add(pdu_airtime_max_us(meta.phy))
            .saturating_add(EVENT_OVERHEAD_END_US);
        let slot_offset_ticks =
            us_to_ticks(EVENT_OVERHEAD_XTAL_US).saturating_add(us_to_ticks(EVENT_OVERHEAD_START_US));

        let req = TickerStart {
            anchor_ticks: meta.ticks_anchor.wrapping_sub(slot_offset_ticks),
            first_offset_ticks: us_to_ticks(offset_us),
            interval_ticks: us_to_ticks(interval_sched_us),
            remainder: ticker_remainder(interval_sched_us),
            lazy: 0,
            slot_ticks: us_to_ticks(slot_us),
        };
        let ret = self.ticker.start(
            ExecContext::UllHigh,
            sync_ticker_id(handle),
            req,
            Box::new(start_op_cb),
        );
        assert!(
            matches!(ret, TickerRequest::Accepted | TickerRequest::Busy),
            "{}: periodic entry start rejected",
            CtrlFault::TickerFailure
        );

        tracing::info!(
            handle,
            interval = si.interval,
            ?scan_phy,
            "periodic sync established"
        );
    }

    /// Terminate an established sync.
    ///
    /// Stops the periodic entry with the mark-and-wait discipline, then
    /// releases the loss notification resource and the pool slot. No host
    /// notification results; the command outcome is the only signal.
    ///
    /// # Errors
    ///
    /// [`SyncError::UnknownHandle`] for a handle with no occupied slot
    /// (including one already terminated); [`SyncError::Disallowed`] while
    /// establishment is still pending or when a stop for this entry is
    /// already in flight.
    pub fn terminate(&mut self, handle: SyncHandle) -> SyncResult<()> {
        let set = self
            .pool
            .get(handle)
            .ok_or(SyncError::UnknownHandle(handle))?;
        if !set.is_established() {
            return Err(SyncError::Disallowed(
                "establishment still pending; cancel instead",
            ));
        }

        match self
            .ticker
            .stop_with_mark(ExecContext::Thread, sync_ticker_id(handle))
        {
            StopMark::Stopped => {}
            StopMark::AlreadyStopping => {
                return Err(SyncError::Disallowed("sync stop already in progress"));
            }
        }

        if let Some(set) = self.pool.get_mut(handle) {
            if let Some(link) = set.loss_notice.reset() {
                self.notify.release_link(link);
            }
        }
        self.pool.release(handle);
        tracing::info!(handle, "periodic sync terminated");
        Ok(())
    }

    /// Tear down every sync context and any pending establishment. Used on
    /// controller reset.
    pub fn reset(&mut self) {
        if let Err(err) = self.create_cancel() {
            tracing::debug!(%err, "reset: no establishment to cancel");
        }
        for handle in 0..self.pool.capacity() {
            if let Err(err) = self.terminate(handle) {
                tracing::trace!(handle, %err, "reset: slot not terminated");
            }
        }
    }

    /// Grow or shrink the reserved slot of a running entry, blocking until
    /// the scheduler reports the outcome.
    ///
    /// Thread-context only: the completion is produced by the scheduler's
    /// own context, so waiting here cannot deadlock.
    ///
    /// # Errors
    ///
    /// [`SlotUpdateError::AlreadyStopped`] when the entry is gone (sync
    /// terminated or lost concurrently), [`SlotUpdateError::QueueFull`]
    /// when the request could not be queued, and [`SlotUpdateError::Fault`]
    /// when a queued request completes with failure.
    pub fn slot_update(
        &mut self,
        handle: SyncHandle,
        slot_plus_us: u32,
        slot_minus_us: u32,
    ) -> Result<(), SlotUpdateError> {
        if self.pool.established(handle).is_none() {
            return Err(SlotUpdateError::AlreadyStopped);
        }

        let (tx, rx) = crossbeam::channel::bounded(1);
        let op_cb: TickerOpCallback = Box::new(move |status| {
            let _sent = tx.send(status);
        });
        let req = TickerUpdate {
            slot_plus_ticks: us_to_ticks(slot_plus_us),
            slot_minus_ticks: us_to_ticks(slot_minus_us),
            ..TickerUpdate::default()
        };

        match self
            .ticker
            .update(ExecContext::Thread, sync_ticker_id(handle), req, op_cb)
        {
            TickerRequest::Accepted | TickerRequest::Busy => match rx.recv() {
                Ok(TickerOpStatus::Failure) | Err(_) => Err(SlotUpdateError::Fault),
                Ok(_) => Ok(()),
            },
            TickerRequest::Rejected => match rx.try_recv() {
                // A synchronous failure completion means the entry no longer
                // exists; anything else means the request never queued.
                Ok(TickerOpStatus::Failure) => Err(SlotUpdateError::AlreadyStopped),
                _ => Err(SlotUpdateError::QueueFull),
            },
        }
    }

    /// Periodic entry expiry, entered from the scheduler in the
    /// high-priority context. Hands the radio-prepare task to the
    /// hard-real-time context.
    ///
    /// # Panics
    ///
    /// Panics with [`CtrlFault::DispatchOverflow`] when the dispatcher
    /// rejects the task; the queues are sized for worst-case load, so
    /// rejection is a capacity bug.
    pub fn on_ticker_expire(&mut self, expire: crate::scheduler::TickerExpire) {
        if self.pool.established(expire.handle).is_none() {
            tracing::warn!(handle = expire.handle, "expiry for released sync context");
            return;
        }
        if let Err(task) =
            self.dispatch
                .enqueue(ExecContext::UllHigh, ExecContext::Lll, Task::RadioPrepare(expire))
        {
            panic!("{}: {task:?}", CtrlFault::DispatchOverflow);
        }
    }

    /// Feed the additional controller advertising data of a received
    /// periodic packet to the channel-map update procedure.
    ///
    /// Silent on every rejection: unknown handle, malformed or absent
    /// record, an update already in flight, or a map below the
    /// usable-channel floor all leave the active map untouched.
    pub fn on_acad(&mut self, handle: SyncHandle, acad: &[u8]) {
        let Some(set) = self.pool.established_mut(handle) else {
            tracing::debug!(handle, "acad for unknown sync context");
            return;
        };
        if set.radio.chm.update_in_progress() {
            return;
        }
        let Some(ind) = crate::acad::find_chm_update(acad) else {
            return;
        };
        if set.radio.chm.stage(ind.map, ind.instant) {
            tracing::debug!(handle, instant = ind.instant, "channel map update staged");
        } else {
            tracing::debug!(handle, "channel map update rejected");
        }
    }
}

/// Completion handler for the establishment start request.
fn start_op_cb(status: TickerOpStatus) {
    assert!(
        matches!(status, TickerOpStatus::Success | TickerOpStatus::Busy),
        "{}: periodic entry start failed",
        CtrlFault::TickerFailure
    );
}
