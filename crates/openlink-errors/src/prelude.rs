//! Prelude module for convenient error handling imports.
//!
//! # Example
//!
//! ```
//! use openlink_errors::prelude::*;
//!
//! fn lookup(handle: u16) -> SyncResult<u16> {
//!     if handle >= 4 {
//!         return Err(SyncError::UnknownHandle(handle));
//!     }
//!     Ok(handle)
//! }
//! ```

pub use crate::{
    common::ErrorSeverity,
    fault::CtrlFault,
    sync::{SlotUpdateError, SyncError, SyncResult},
};
