//! Ticker error types

use thiserror::Error;

/// Terminal failure of a submitted task.
///
/// Timeout and reset are distinguished from ordinary task failures so
/// callers can branch on cause.
#[derive(Debug, Error)]
pub enum TickError {
    /// The task's deadline elapsed before it settled. Timeouts bypass the
    /// retry path.
    #[error("Timeout")]
    Timeout,

    /// The task was still queued when the ticker was reset or shut down.
    #[error("Reset")]
    Reset,

    /// The task's callback failed and its retry budget is exhausted. Carries
    /// the failure from the final attempt.
    #[error(transparent)]
    Task(#[from] eyre::Report),
}

impl TickError {
    /// Check if this is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, TickError::Timeout)
    }

    /// Check if this is a queue reset
    pub fn is_reset(&self) -> bool {
        matches!(self, TickError::Reset)
    }

    /// Get the underlying task failure, if any
    pub fn task_error(&self) -> Option<&eyre::Report> {
        match self {
            TickError::Task(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::eyre;

    #[test]
    fn test_predicates() {
        assert!(TickError::Timeout.is_timeout());
        assert!(!TickError::Timeout.is_reset());

        assert!(TickError::Reset.is_reset());
        assert!(!TickError::Reset.is_timeout());

        let err = TickError::Task(eyre!("boom"));
        assert!(!err.is_timeout());
        assert!(!err.is_reset());
        assert!(err.task_error().is_some());
    }

    #[test]
    fn test_display_markers() {
        assert_eq!(TickError::Timeout.to_string(), "Timeout");
        assert_eq!(TickError::Reset.to_string(), "Reset");
        assert_eq!(TickError::Task(eyre!("boom")).to_string(), "boom");
    }

    #[test]
    fn test_from_report() {
        let err: TickError = eyre!("boom").into();
        assert!(matches!(err, TickError::Task(_)));
    }
}
