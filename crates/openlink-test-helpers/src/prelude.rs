//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use openlink_test_helpers::prelude::*;
//! ```

pub use crate::init_test_logging;
pub use crate::must::{must, must_err, must_some};

pub use crate::fixtures::{SyncInfoFixture, chm_update_record, filler_record, rx_meta};

pub use crate::mock::{
    MockDispatcher, MockNotify, MockTicker, NotifyProbe, TickerOp, TickerProbe,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
