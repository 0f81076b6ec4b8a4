//! Prelude module for convenient periodic-sync imports.

pub use openlink_errors::prelude::*;

pub use crate::{
    chanmap::{ChanMapStore, ChannelMap},
    config::{SyncConfig, SyncConfigBuilder},
    dispatch::{CrossContextDispatcher, ExecContext, Task},
    manager::{ScanRxMeta, SyncManager, SyncOptions, SyncTarget},
    notify::{EstabStatus, HANDLE_NONE, NotificationQueue, RxNode, SyncReport},
    pool::SyncHandle,
    scan::ScanPhy,
    scheduler::{PeriodicTicker, TickerExpire},
    supervise::EventDone,
    syncinfo::SyncInfo,
    timing::Phy,
};
