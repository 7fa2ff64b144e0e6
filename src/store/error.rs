//! Store-level failures.

use thiserror::Error;

/// Failure raised by a Store Gateway operation.
///
/// The carried message is what protocol clients see in an `ERROR` envelope,
/// so it must never contain a backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backing store cannot be reached.
    #[error("{0}")]
    Unavailable(String),
    /// The operation did not complete in time.
    #[error("{0}")]
    Timeout(String),
    /// The store rejected the write.
    #[error("{0}")]
    Constraint(String),
    /// Anything else the store reported.
    #[error("{0}")]
    Internal(String),
}

impl StoreError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::Unavailable(_) => "unavailable",
            StoreError::Timeout(_) => "timeout",
            StoreError::Constraint(_) => "constraint",
            StoreError::Internal(_) => "internal",
        }
    }

    /// The store's message, as forwarded to clients.
    pub fn message(&self) -> &str {
        match self {
            StoreError::Unavailable(m)
            | StoreError::Timeout(m)
            | StoreError::Constraint(m)
            | StoreError::Internal(m) => m,
        }
    }
}
