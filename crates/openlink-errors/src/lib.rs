//! Centralized error types for the OpenLink controller.
//!
//! This crate provides the error handling system shared by the controller
//! crates, supporting both the host-facing thread paths and the controller
//! callback paths with appropriate safety guarantees.
//!
//! # Architecture
//!
//! - [`common`]: severity classification shared by all error types
//! - [`sync`]: host-facing periodic-sync command errors
//! - [`fault`]: fatal controller faults with RT-safe semantics
//!
//! # RT Safety
//!
//! [`fault::CtrlFault`] is designed for controller callback paths:
//! - `Copy` semantics, no heap allocations
//! - Fixed `#[repr(u8)]` representation with pre-allocated codes
//!
//! # Example
//!
//! ```
//! use openlink_errors::prelude::*;
//!
//! fn check_handle(handle: u16, capacity: u16) -> SyncResult<()> {
//!     if handle >= capacity {
//!         return Err(SyncError::UnknownHandle(handle));
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod common;
pub mod fault;
pub mod prelude;
pub mod sync;

pub use common::ErrorSeverity;
pub use fault::CtrlFault;
pub use sync::{SlotUpdateError, SyncError, SyncResult};
