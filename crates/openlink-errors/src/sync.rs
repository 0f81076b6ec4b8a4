//! Host-facing errors for periodic-sync commands.
//!
//! These errors are returned to the host command path. They mirror the
//! controller's command-status taxonomy: a disallowed operation, a capacity
//! failure with full rollback already performed, an unknown identifier, or a
//! rejected configuration. Malformed input from the remote peer is never
//! reported through this type; protocol robustness policy is to silently
//! retain prior state.

use crate::common::ErrorSeverity;

/// Result alias for periodic-sync command paths.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors returned by periodic-sync commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// Operation not allowed in the current state (request already pending,
    /// sync already established, or terminate on a non-established context).
    #[error("Command disallowed: {0}")]
    Disallowed(&'static str),

    /// A required resource (pool slot, notification buffer or link) was
    /// unavailable. All partially acquired resources have been released.
    #[error("Memory capacity exceeded: {0}")]
    CapacityExceeded(&'static str),

    /// No established sync context exists for the given handle.
    #[error("Unknown sync handle: {0}")]
    UnknownHandle(u16),

    /// Rejected configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

impl SyncError {
    /// Get the error severity.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SyncError::Disallowed(_) => ErrorSeverity::Warning,
            SyncError::CapacityExceeded(_) => ErrorSeverity::Error,
            SyncError::UnknownHandle(_) => ErrorSeverity::Warning,
            SyncError::InvalidConfig(_) => ErrorSeverity::Error,
        }
    }

    /// Check if the caller may retry the command unchanged once resources
    /// have been freed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::CapacityExceeded(_))
    }
}

/// Outcome of a blocking slot-duration update that did not apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SlotUpdateError {
    /// The scheduler entry for this context is already stopped.
    #[error("Scheduler entry already stopped")]
    AlreadyStopped,

    /// The scheduler update job queue was full; the request was not queued.
    #[error("Scheduler update queue full")]
    QueueFull,

    /// The update was queued but completed with a failure status.
    #[error("Scheduler update failed")]
    Fault,
}
