//! Periodic synchronization manager for the OpenLink link-layer controller.
//!
//! Tracks periodic broadcast trains announced by remote devices: the host
//! requests synchronization to an advertiser, discovery hands over the
//! train's timing descriptor, and this crate schedules the periodic listen
//! events, supervises reception, follows channel map changes, and tears the
//! relationship down on host request or supervision timeout.
//!
//! # Architecture
//!
//! - [`manager`]: lifecycle controller (create / cancel / setup /
//!   terminate / slot update)
//! - [`supervise`]: per-event supervision and drift correction
//! - [`teardown`]: timeout-to-loss-notification coordination
//! - [`pool`], [`set`]: the fixed sync context arena
//! - [`chanmap`], [`syncinfo`], [`acad`]: wire formats and the
//!   double-buffered channel map store
//! - [`scheduler`], [`notify`], [`dispatch`], [`scan`]: collaborator
//!   boundaries
//! - [`timing`]: on-air timing constants and conversions
//!
//! # Execution contexts
//!
//! Host commands run in the thread context; scheduler callbacks run in the
//! controller contexts. State crosses between them either as owned task
//! messages through the dispatcher or through the two documented atomics
//! (the pending-target slot and the establishment flag). Nothing else is
//! shared.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use openlink_sync::prelude::*;
//! # use openlink_test_helpers::prelude::*;
//! # fn collaborators() -> (MockTicker, MockNotify, Arc<MockDispatcher>) {
//! #     (MockTicker::new(), MockNotify::new(), Arc::new(MockDispatcher::new()))
//! # }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let (ticker, notify, dispatch) = collaborators();
//! let config = SyncConfig::builder().pool_capacity(2).build()?;
//! let mut manager = SyncManager::new(config, ticker, notify, dispatch)?;
//!
//! let target = SyncTarget { sid: 2, ..SyncTarget::default() };
//! let handle = manager.create(target, 0, 100, SyncOptions::default())?;
//! assert!(manager.terminate(handle).is_err()); // still pending; cancel instead
//! manager.create_cancel()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod acad;
pub mod chanmap;
pub mod config;
pub mod dispatch;
pub mod manager;
pub mod notify;
pub mod pool;
pub mod prelude;
pub mod scan;
pub mod scheduler;
pub mod set;
pub mod supervise;
pub mod syncinfo;
pub mod teardown;
pub mod timing;

pub use config::SyncConfig;
pub use manager::{ScanRxMeta, SyncManager, SyncOptions, SyncTarget};
pub use pool::SyncHandle;
pub use supervise::EventDone;
