//! Retry error types.

use thiserror::Error;

/// Failure raised while a policy records an operation failure.
///
/// Always fatal to the surrounding call: the proxy turns it into
/// [`RetryError::Terminated`] and stops retrying.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// The retry counter cannot be incremented any further.
    #[error("retry count overflowed")]
    CountOverflow,

    /// Error raised by a custom policy implementation.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl PolicyError {
    /// Create an error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Other(anyhow::anyhow!(message.into()))
    }
}

/// Error returned by [`RetryProxy`](crate::RetryProxy) when no attempt succeeded.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The last failure raised by the operation, unchanged.
    #[error("{0}")]
    Failed(E),

    /// Recording a failure into the retry context failed.
    #[error("terminated retry after error in policy")]
    Terminated {
        /// The policy-internal error.
        #[source]
        source: PolicyError,
    },

    /// The policy denied even the first attempt.
    #[error("retry exhausted with no attempts made")]
    Exhausted,
}

impl<E> RetryError<E> {
    /// Get the operation failure, if this error carries one.
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Consume the error and return the operation failure, if any.
    pub fn into_failure(self) -> Option<E> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Check whether the retry was aborted by a policy error.
    pub fn is_terminated(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }

    /// Check whether no attempt was made at all.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted)
    }
}

/// Result type for retried operations.
pub type RetryResult<T, E> = Result<T, RetryError<E>>;
