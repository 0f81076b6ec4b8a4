//! Instrumented collaborator doubles for the sync manager.
//!
//! Each double records every call into shared state reachable through a
//! probe handle, so tests keep inspecting after the double has moved into
//! the manager. Completion callbacks fire synchronously by default
//! (`auto_complete`); switch that off to hold completions and fire them
//! by hand, which is how the asynchronous teardown hops are exercised.

use std::sync::Arc;

use parking_lot::Mutex;

use openlink_sync::dispatch::{CrossContextDispatcher, ExecContext, Task};
use openlink_sync::notify::{NotificationQueue, RxLink, RxNode, RxNodeBuf};
use openlink_sync::scheduler::{
    PeriodicTicker, StopMark, TickerId, TickerOpCallback, TickerOpStatus, TickerRequest,
    TickerStart, TickerUpdate,
};

/// One recorded scheduler request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerOp {
    Start(TickerId, TickerStart),
    Update(TickerId, TickerUpdate),
    Stop(TickerId),
    StopWithMark(TickerId),
}

struct TickerState {
    ops: Vec<TickerOp>,
    pending: Vec<(TickerId, TickerOpCallback)>,
    start_response: TickerRequest,
    update_response: TickerRequest,
    stop_response: TickerRequest,
    stop_mark_response: StopMark,
    auto_complete: Option<TickerOpStatus>,
}

/// Scheduler double.
pub struct MockTicker {
    state: Arc<Mutex<TickerState>>,
}

/// Inspection and control handle for a [`MockTicker`].
#[derive(Clone)]
pub struct TickerProbe {
    state: Arc<Mutex<TickerState>>,
}

impl MockTicker {
    /// All requests accepted, completions fire synchronously with success.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(TickerState {
                ops: Vec::new(),
                pending: Vec::new(),
                start_response: TickerRequest::Accepted,
                update_response: TickerRequest::Accepted,
                stop_response: TickerRequest::Accepted,
                stop_mark_response: StopMark::Stopped,
                auto_complete: Some(TickerOpStatus::Success),
            })),
        }
    }

    pub fn probe(&self) -> TickerProbe {
        TickerProbe {
            state: Arc::clone(&self.state),
        }
    }

    fn issue(&self, op: TickerOp, response: TickerRequest, id: TickerId, op_cb: TickerOpCallback) {
        let auto = {
            let mut state = self.state.lock();
            state.ops.push(op);
            state.auto_complete
        };
        // Callback runs outside the lock; it may recurse into a probe.
        match auto {
            Some(status) => op_cb(status),
            None => {
                if response != TickerRequest::Rejected {
                    self.state.lock().pending.push((id, op_cb));
                }
            }
        }
    }
}

impl Default for MockTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicTicker for MockTicker {
    fn start(
        &mut self,
        _user: ExecContext,
        id: TickerId,
        req: TickerStart,
        op_cb: TickerOpCallback,
    ) -> TickerRequest {
        let response = self.state.lock().start_response;
        self.issue(TickerOp::Start(id, req), response, id, op_cb);
        response
    }

    fn update(
        &mut self,
        _user: ExecContext,
        id: TickerId,
        req: TickerUpdate,
        op_cb: TickerOpCallback,
    ) -> TickerRequest {
        let response = self.state.lock().update_response;
        self.issue(TickerOp::Update(id, req), response, id, op_cb);
        response
    }

    fn stop(&mut self, _user: ExecContext, id: TickerId, op_cb: TickerOpCallback) -> TickerRequest {
        let response = self.state.lock().stop_response;
        self.issue(TickerOp::Stop(id), response, id, op_cb);
        response
    }

    fn stop_with_mark(&mut self, _user: ExecContext, id: TickerId) -> StopMark {
        let mut state = self.state.lock();
        state.ops.push(TickerOp::StopWithMark(id));
        state.stop_mark_response
    }
}

impl TickerProbe {
    /// Every request issued so far, in order.
    pub fn ops(&self) -> Vec<TickerOp> {
        self.state.lock().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.state.lock().ops.clear();
    }

    /// Completions held back while `auto_complete` is off.
    pub fn pending_count(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Fire the oldest held completion with the given status. Returns the
    /// entry id it belonged to.
    pub fn complete_next(&self, status: TickerOpStatus) -> Option<TickerId> {
        let (id, cb) = {
            let mut state = self.state.lock();
            if state.pending.is_empty() {
                return None;
            }
            state.pending.remove(0)
        };
        cb(status);
        Some(id)
    }

    pub fn set_start_response(&self, response: TickerRequest) {
        self.state.lock().start_response = response;
    }

    pub fn set_update_response(&self, response: TickerRequest) {
        self.state.lock().update_response = response;
    }

    pub fn set_stop_response(&self, response: TickerRequest) {
        self.state.lock().stop_response = response;
    }

    pub fn set_stop_mark_response(&self, response: StopMark) {
        self.state.lock().stop_mark_response = response;
    }

    /// `Some(status)`: every callback fires synchronously with `status`,
    /// even for rejected requests (an entry that no longer exists reports
    /// failure through the callback). `None`: callbacks of non-rejected
    /// requests are held for [`TickerProbe::complete_next`].
    pub fn set_auto_complete(&self, status: Option<TickerOpStatus>) {
        self.state.lock().auto_complete = status;
    }
}

struct NotifyState {
    link_capacity: u16,
    node_capacity: u16,
    links_out: u16,
    nodes_out: u16,
    next_link: u16,
    next_node: u16,
    delivered: Vec<(RxLink, RxNode)>,
    sched_count: u32,
}

/// Notification queue double with allocation accounting.
///
/// Delivery consumes one link and one node buffer, so after any complete
/// lifecycle both outstanding counts return to zero; a failed or cancelled
/// command must also leave them at zero.
pub struct MockNotify {
    state: Arc<Mutex<NotifyState>>,
}

/// Inspection handle for a [`MockNotify`].
#[derive(Clone)]
pub struct NotifyProbe {
    state: Arc<Mutex<NotifyState>>,
}

impl MockNotify {
    pub fn new() -> Self {
        Self::with_capacity(8, 8)
    }

    pub fn with_capacity(links: u16, nodes: u16) -> Self {
        Self {
            state: Arc::new(Mutex::new(NotifyState {
                link_capacity: links,
                node_capacity: nodes,
                links_out: 0,
                nodes_out: 0,
                next_link: 0,
                next_node: 0,
                delivered: Vec::new(),
                sched_count: 0,
            })),
        }
    }

    pub fn probe(&self) -> NotifyProbe {
        NotifyProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockNotify {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationQueue for MockNotify {
    fn alloc_link(&mut self) -> Option<RxLink> {
        let mut state = self.state.lock();
        if state.links_out >= state.link_capacity {
            return None;
        }
        state.links_out += 1;
        let link = RxLink(state.next_link);
        state.next_link = state.next_link.wrapping_add(1);
        Some(link)
    }

    fn release_link(&mut self, _link: RxLink) {
        let mut state = self.state.lock();
        state.links_out = state.links_out.saturating_sub(1);
    }

    fn alloc_node(&mut self) -> Option<RxNodeBuf> {
        let mut state = self.state.lock();
        if state.nodes_out >= state.node_capacity {
            return None;
        }
        state.nodes_out += 1;
        let node = RxNodeBuf(state.next_node);
        state.next_node = state.next_node.wrapping_add(1);
        Some(node)
    }

    fn release_node(&mut self, _node: RxNodeBuf) {
        let mut state = self.state.lock();
        state.nodes_out = state.nodes_out.saturating_sub(1);
    }

    fn put(&mut self, link: RxLink, node: RxNode) {
        let mut state = self.state.lock();
        state.links_out = state.links_out.saturating_sub(1);
        state.nodes_out = state.nodes_out.saturating_sub(1);
        state.delivered.push((link, node));
    }

    fn sched(&mut self) {
        self.state.lock().sched_count += 1;
    }
}

impl NotifyProbe {
    pub fn delivered(&self) -> Vec<(RxLink, RxNode)> {
        self.state.lock().delivered.clone()
    }

    pub fn last_delivered(&self) -> Option<RxNode> {
        self.state.lock().delivered.last().map(|(_, node)| *node)
    }

    pub fn sched_count(&self) -> u32 {
        self.state.lock().sched_count
    }

    /// Links currently allocated and neither released nor delivered.
    pub fn links_out(&self) -> u16 {
        self.state.lock().links_out
    }

    /// Node buffers currently allocated and neither released nor delivered.
    pub fn nodes_out(&self) -> u16 {
        self.state.lock().nodes_out
    }
}

struct DispatchState {
    queued: Vec<(ExecContext, ExecContext, Task)>,
    reject: bool,
}

/// Cross-context dispatcher double. Tests drain the queued tasks and feed
/// them back into the manager, playing the target execution context.
pub struct MockDispatcher {
    state: Mutex<DispatchState>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DispatchState {
                queued: Vec::new(),
                reject: false,
            }),
        }
    }

    /// Make every enqueue fail, simulating queue exhaustion.
    pub fn set_reject(&self, reject: bool) {
        self.state.lock().reject = reject;
    }

    /// Take every queued task, oldest first.
    pub fn drain(&self) -> Vec<(ExecContext, ExecContext, Task)> {
        std::mem::take(&mut self.state.lock().queued)
    }

    pub fn len(&self) -> usize {
        self.state.lock().queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().queued.is_empty()
    }
}

impl Default for MockDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl CrossContextDispatcher for MockDispatcher {
    fn enqueue(&self, from: ExecContext, to: ExecContext, task: Task) -> Result<(), Task> {
        let mut state = self.state.lock();
        if state.reject {
            return Err(task);
        }
        state.queued.push((from, to, task));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_records_and_autocompletes() {
        let mut ticker = MockTicker::new();
        let probe = ticker.probe();
        let fired = Arc::new(Mutex::new(None));
        let fired_cb = Arc::clone(&fired);

        let ret = ticker.stop(
            ExecContext::Thread,
            3,
            Box::new(move |status| {
                *fired_cb.lock() = Some(status);
            }),
        );
        assert_eq!(ret, TickerRequest::Accepted);
        assert_eq!(probe.ops(), vec![TickerOp::Stop(3)]);
        assert_eq!(*fired.lock(), Some(TickerOpStatus::Success));
    }

    #[test]
    fn test_ticker_held_completions() {
        let mut ticker = MockTicker::new();
        let probe = ticker.probe();
        probe.set_auto_complete(None);

        let fired = Arc::new(Mutex::new(None));
        let fired_cb = Arc::clone(&fired);
        let ret = ticker.stop(
            ExecContext::Thread,
            5,
            Box::new(move |status| {
                *fired_cb.lock() = Some(status);
            }),
        );
        assert_eq!(ret, TickerRequest::Accepted);

        assert!(fired.lock().is_none());
        assert_eq!(probe.pending_count(), 1);
        assert_eq!(probe.complete_next(TickerOpStatus::Busy), Some(5));
        assert_eq!(*fired.lock(), Some(TickerOpStatus::Busy));
    }

    #[test]
    fn test_notify_accounting_balances_on_delivery() {
        let mut notify = MockNotify::with_capacity(1, 1);
        let probe = notify.probe();

        let link = notify.alloc_link().unwrap();
        let _node = notify.alloc_node().unwrap();
        assert!(notify.alloc_link().is_none());

        notify.put(
            link,
            RxNode {
                handle: 0,
                report: openlink_sync::notify::SyncReport::Lost,
            },
        );
        assert_eq!(probe.links_out(), 0);
        assert_eq!(probe.nodes_out(), 0);
        assert_eq!(probe.delivered().len(), 1);
    }

    #[test]
    fn test_dispatcher_drain_and_reject() {
        let dispatch = MockDispatcher::new();
        let task = Task::SyncLost { handle: 2 };
        dispatch
            .enqueue(ExecContext::UllLow, ExecContext::UllHigh, task)
            .unwrap();
        assert_eq!(dispatch.len(), 1);
        assert_eq!(dispatch.drain().len(), 1);
        assert!(dispatch.is_empty());

        dispatch.set_reject(true);
        assert_eq!(
            dispatch.enqueue(ExecContext::UllLow, ExecContext::UllHigh, task),
            Err(task)
        );
    }
}
