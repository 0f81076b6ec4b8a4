//! Shared test utilities for the OpenLink controller.
//!
//! This crate provides instrumented collaborator doubles and fixture
//! builders to reduce code duplication across the test suite.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`mock`] - Instrumented scheduler, notification queue and dispatcher doubles
//! - [`fixtures`] - Wire-format fixture builders
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! openlink-test-helpers = { path = "crates/openlink-test-helpers" }
//! ```
//!
//! Then import the prelude:
//!
//! ```rust,ignore
//! use openlink_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod fixtures;
pub mod mock;
pub mod must;
pub mod prelude;

pub use must::*;

/// Install a tracing subscriber that routes through the test harness
/// capture. Safe to call from every test; later calls are no-ops.
pub fn init_test_logging() {
    let _ignored = tracing_subscriber::fmt()
        .with_test_writer()
        .compact()
        .try_init();
}
