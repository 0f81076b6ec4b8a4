//! Severity classification shared by all OpenLink error types.

use core::fmt;

/// Error severity levels for escalation decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational, no action needed
    Info,
    /// Warning, operation degraded but continuing
    Warning,
    /// Error, operation failed but system stable
    Error,
    /// Critical, timing or resource state may be corrupted
    Critical,
}

impl ErrorSeverity {
    /// Check if this severity requires operator attention.
    #[must_use]
    pub fn is_actionable(self) -> bool {
        self >= ErrorSeverity::Error
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn test_severity_actionable() {
        assert!(!ErrorSeverity::Info.is_actionable());
        assert!(!ErrorSeverity::Warning.is_actionable());
        assert!(ErrorSeverity::Error.is_actionable());
        assert!(ErrorSeverity::Critical.is_actionable());
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(ErrorSeverity::Critical.to_string(), "CRITICAL");
    }
}
