//! Supervision engine: the per-event bookkeeping that keeps an established
//! sync alive or declares it lost.
//!
//! Runs at the close of every scheduled event in the background controller
//! context. Anchor activity feeds the drift corrector and re-opens the
//! scheduled-absence budget; only verified reception clears the supervision
//! countdown, which otherwise winds down until loss. All scheduler
//! corrections go out as one update request.

use openlink_errors::CtrlFault;

use crate::dispatch::ExecContext;
use crate::manager::SyncManager;
use crate::notify::NotificationQueue;
use crate::scheduler::{PeriodicTicker, TickerOpStatus, TickerRequest, TickerUpdate, sync_ticker_id};
use crate::timing::drift_ticks;

/// Close-of-event report from the radio-prepare step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDone {
    /// Pool handle of the sync context.
    pub handle: u16,
    /// Whether the radio saw any traffic this event, valid or not.
    pub trx: bool,
    /// Whether a packet of the train passed its integrity check.
    pub received: bool,
    /// Measured start-to-reception time, in us. Meaningful when `trx`.
    pub anchor_actual_us: u32,
    /// Expected start-to-reception time for a drift-free clock, in us.
    pub anchor_expected_us: u32,
}

/// Scheduler adjustments decided for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Nothing to adjust.
    Idle,
    /// Apply the update request.
    Adjust(TickerUpdate),
    /// Supervision expired; tear the context down.
    Lost,
}

impl<T: PeriodicTicker, N: NotificationQueue> SyncManager<T, N> {
    /// Close out one scheduled event for an established sync.
    ///
    /// Unknown or already-released handles are ignored; the teardown path
    /// races event completion by design.
    pub fn on_event_done(&mut self, done: &EventDone) {
        let verdict = {
            let Some(set) = self.pool.established_mut(done.handle) else {
                tracing::trace!(handle = done.handle, "event done for released context");
                return;
            };

            let reload = set.timeout_reload();
            let skip_event_prev = set.radio.skip_event;
            let elapsed = u32::from(skip_event_prev).saturating_add(1);

            // Any anchor activity re-opens the absence budget and feeds the
            // drift corrector, even when the packet fails its check.
            let (drift_plus, drift_minus) = if done.trx {
                set.radio.skip_event = set.skip;
                drift_ticks(done.anchor_actual_us, done.anchor_expected_us)
            } else {
                (0, 0)
            };

            // Only a verified packet clears the supervision countdown.
            if done.received {
                set.timeout_expire = 0;
            } else if set.timeout_expire == 0 {
                set.timeout_expire = reload;
            }

            let mut force = false;
            let mut lost = false;
            if set.timeout_expire != 0 {
                if u32::from(set.timeout_expire) > elapsed {
                    set.timeout_expire = u32::from(set.timeout_expire)
                        .saturating_sub(elapsed)
                        .try_into()
                        .unwrap_or(0);
                    // Listen every event while the countdown runs.
                    set.radio.skip_event = 0;
                    if skip_event_prev != 0 {
                        force = true;
                    }
                } else {
                    lost = true;
                }
            }

            if lost {
                tracing::warn!(handle = done.handle, "supervision timeout");
                Verdict::Lost
            } else {
                let lazy = if force || set.radio.skip_event != skip_event_prev {
                    set.radio.skip_event.saturating_add(1)
                } else {
                    0
                };
                if drift_plus != 0 || drift_minus != 0 || lazy != 0 || force {
                    Verdict::Adjust(TickerUpdate {
                        drift_plus_ticks: drift_plus,
                        drift_minus_ticks: drift_minus,
                        lazy,
                        force,
                        ..TickerUpdate::default()
                    })
                } else {
                    Verdict::Idle
                }
            }
        };

        match verdict {
            Verdict::Idle => {}
            Verdict::Adjust(req) => {
                let ret = self.ticker.update(
                    ExecContext::UllLow,
                    sync_ticker_id(done.handle),
                    req,
                    Box::new(update_op_cb),
                );
                if ret == TickerRequest::Rejected {
                    // Benign: a concurrent stop is dismantling the entry.
                    tracing::debug!(handle = done.handle, "drift update rejected during stop");
                }
            }
            Verdict::Lost => self.timeout_cleanup(done.handle),
        }
    }
}

/// Completion handler for supervision updates. A concurrent disable is an
/// accepted race; outright failure is a scheduler defect.
fn update_op_cb(status: TickerOpStatus) {
    assert!(
        !matches!(status, TickerOpStatus::Failure),
        "{}: drift update failed",
        CtrlFault::TickerFailure
    );
}
