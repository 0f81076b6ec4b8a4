//! Cross-context task dispatch boundary.
//!
//! Four execution contexts of increasing preemption priority cooperate
//! without sharing locks. Work crosses between them as plain task messages
//! through a bounded, non-blocking dispatcher. Rejection is not a runtime
//! condition: the queues are sized for worst-case load, so a failed enqueue
//! indicates a capacity bug and the caller halts.

use crate::scheduler::TickerExpire;

/// Execution contexts, ordered low to high preemption priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecContext {
    /// Host-facing thread context (API calls).
    Thread,
    /// Background controller context.
    UllLow,
    /// High-priority controller context (periodic scheduler callbacks).
    UllHigh,
    /// Hard-real-time radio-prepare context.
    Lll,
}

/// A task message crossing execution contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Kick the radio-prepare step for a fired periodic event.
    RadioPrepare(TickerExpire),
    /// Build and deliver the loss notification for a stopped sync context.
    SyncLost {
        /// Pool handle of the lost context.
        handle: u16,
    },
}

/// Bounded, non-blocking cross-context dispatcher collaborator.
pub trait CrossContextDispatcher: Send + Sync {
    /// Enqueue a task to run in the target context.
    ///
    /// # Errors
    ///
    /// Returns the task back on rejection. Rejection indicates a queue
    /// capacity bug; callers treat it as fatal.
    fn enqueue(&self, from: ExecContext, to: ExecContext, task: Task) -> Result<(), Task>;
}
