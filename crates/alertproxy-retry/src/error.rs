use std::fmt;

/// Wraps the final outcome of a retry loop. Never returned mid-loop — only
/// once the engine has decided no further attempt will be made.
#[derive(Debug, Clone)]
pub enum RetryError<E> {
    /// The classifier said this error isn't worth retrying; `op` ran exactly once.
    NonRetryable(E),
    /// `attempts` invocations all failed (the last is `source`).
    MaxRetriesExceeded { attempts: usize, source: E },
    /// Cancellation was observed. `during_backoff` distinguishes a
    /// cancellation seen while sleeping from one seen before an attempt.
    Cancelled {
        during_backoff: bool,
        source: Option<E>,
    },
}

impl<E> RetryError<E> {
    /// The wrapped error, when one exists (absent only for a cancellation
    /// observed before the first attempt ever ran).
    pub fn source(&self) -> Option<&E> {
        match self {
            RetryError::NonRetryable(e) => Some(e),
            RetryError::MaxRetriesExceeded { source, .. } => Some(source),
            RetryError::Cancelled { source, .. } => source.as_ref(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::NonRetryable(e) => write!(f, "non-retryable error: {e}"),
            RetryError::MaxRetriesExceeded { attempts, source } => {
                write!(f, "max retries ({attempts}) exceeded: {source}")
            }
            RetryError::Cancelled {
                during_backoff,
                source,
            } => match (during_backoff, source) {
                (true, Some(e)) => write!(f, "cancelled during backoff: {e}"),
                (true, None) => write!(f, "cancelled during backoff"),
                (false, Some(e)) => write!(f, "cancelled: {e}"),
                (false, None) => write!(f, "cancelled"),
            },
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryError<E> {}
