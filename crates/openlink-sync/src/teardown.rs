//! Teardown coordinator: the two-hop path from a supervision timeout to the
//! host-visible loss notification.
//!
//! The entry is stopped from the controller context; the stop completion
//! fires in the scheduler's own context, which must stay short, so it only
//! dispatches a loss task back to the high-priority context. That task
//! consumes the pre-allocated loss notice and releases the pool slot. The
//! stop-completion path never touches the sync context itself.

use openlink_errors::CtrlFault;

use crate::dispatch::{ExecContext, Task};
use crate::manager::SyncManager;
use crate::notify::{NotificationQueue, RxNode, SyncReport};
use crate::pool::SyncHandle;
use crate::scheduler::{PeriodicTicker, TickerOpCallback, TickerOpStatus, TickerRequest, sync_ticker_id};

impl<T: PeriodicTicker, N: NotificationQueue> SyncManager<T, N> {
    /// Stop the periodic entry of a context whose supervision expired.
    ///
    /// The context stays in the pool until [`SyncManager::on_sync_lost`]
    /// runs; the handle remains valid for the dispatched task.
    pub(crate) fn timeout_cleanup(&mut self, handle: SyncHandle) {
        let dispatch = std::sync::Arc::clone(&self.dispatch);
        let op_cb: TickerOpCallback = Box::new(move |status| {
            assert!(
                status == TickerOpStatus::Success,
                "{}: stop of expired entry failed",
                CtrlFault::TickerFailure
            );
            if let Err(task) =
                dispatch.enqueue(ExecContext::UllLow, ExecContext::UllHigh, Task::SyncLost { handle })
            {
                panic!("{}: {task:?}", CtrlFault::DispatchOverflow);
            }
        });

        let ret = self
            .ticker
            .stop(ExecContext::UllHigh, sync_ticker_id(handle), op_cb);
        assert!(
            matches!(ret, TickerRequest::Accepted | TickerRequest::Busy),
            "{}: stop of expired entry rejected",
            CtrlFault::TickerFailure
        );
    }

    /// Deliver the loss notification and release the context.
    ///
    /// Entered from the dispatched [`Task::SyncLost`] in the high-priority
    /// context, after the periodic entry is guaranteed stopped. Consumes
    /// the loss notice exactly once; a handle already released (terminate
    /// racing loss) is logged and ignored.
    pub fn on_sync_lost(&mut self, handle: SyncHandle) {
        let Some(set) = self.pool.get_mut(handle) else {
            tracing::debug!(handle, "loss for released sync context");
            return;
        };
        let link = match set.loss_notice.consume() {
            Ok(link) => link,
            Err(fault) => {
                tracing::error!(handle, %fault, "loss notice unavailable");
                return;
            }
        };

        self.notify.put(
            link,
            RxNode {
                handle,
                report: SyncReport::Lost,
            },
        );
        self.notify.sched();
        self.pool.release(handle);
        tracing::info!(handle, "periodic sync lost");
    }
}
