//! Fatal controller faults for callback paths.
//!
//! These faults are RT-safe:
//! - `Copy` semantics, no heap allocations
//! - Fixed `#[repr(u8)]` representation with pre-allocated codes
//!
//! A fault indicates a logic or capacity-sizing defect, not a runtime
//! condition to recover from. Silent continuation after one of these would
//! corrupt scheduling state, so the paths that detect them halt the
//! controller instead of propagating an error upward.

use core::fmt;

use crate::common::ErrorSeverity;

/// Fatal controller fault codes.
///
/// # Examples
///
/// ```
/// use openlink_errors::{CtrlFault, ErrorSeverity};
///
/// let fault = CtrlFault::TickerFailure;
/// assert_eq!(fault.code(), 1);
/// assert_eq!(fault.severity(), ErrorSeverity::Critical);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CtrlFault {
    /// A periodic-ticker operation completed with a failure status that is
    /// not one of the accepted benign outcomes.
    TickerFailure = 1,
    /// The cross-context dispatcher rejected a task (queue capacity bug).
    DispatchOverflow = 2,
    /// A ticker start was issued for an entry that is already live.
    TickerEntryLive = 3,
    /// A pre-allocated notification buffer was consumed twice.
    NoticeDoubleConsume = 4,
}

impl CtrlFault {
    /// Get the numeric fault code.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Get the fault severity. All controller faults are critical.
    #[must_use]
    pub fn severity(self) -> ErrorSeverity {
        ErrorSeverity::Critical
    }

    /// Create a fault from a code.
    ///
    /// Returns `None` if the code does not correspond to a known fault.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(CtrlFault::TickerFailure),
            2 => Some(CtrlFault::DispatchOverflow),
            3 => Some(CtrlFault::TickerEntryLive),
            4 => Some(CtrlFault::NoticeDoubleConsume),
            _ => None,
        }
    }
}

impl fmt::Display for CtrlFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtrlFault::TickerFailure => write!(f, "Ticker operation failed"),
            CtrlFault::DispatchOverflow => write!(f, "Cross-context dispatch queue overflow"),
            CtrlFault::TickerEntryLive => write!(f, "Ticker entry already live"),
            CtrlFault::NoticeDoubleConsume => write!(f, "Notification buffer consumed twice"),
        }
    }
}

impl std::error::Error for CtrlFault {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_codes_round_trip() {
        for code in 1..=4 {
            let fault = CtrlFault::from_code(code).unwrap();
            assert_eq!(fault.code(), code);
        }
        assert_eq!(CtrlFault::from_code(0), None);
        assert_eq!(CtrlFault::from_code(255), None);
    }

    #[test]
    fn test_fault_severity() {
        assert_eq!(CtrlFault::TickerFailure.severity(), ErrorSeverity::Critical);
        assert_eq!(
            CtrlFault::DispatchOverflow.severity(),
            ErrorSeverity::Critical
        );
    }

    #[test]
    fn test_fault_display() {
        assert!(
            CtrlFault::DispatchOverflow
                .to_string()
                .contains("dispatch queue")
        );
    }

    #[test]
    fn test_fault_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<CtrlFault>();
    }
}
