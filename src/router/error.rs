use crate::feed::FetchError;
use core::fmt;

/// Why an analytics request failed.
#[derive(Debug)]
pub enum AnalyticsError {
    /// The request itself is unacceptable. Never retried, never cached.
    Validation(String),

    /// The feed kept failing transiently until the retry budget was spent.
    TransientFetch(ohno::AppError),

    /// The feed refused the request outright.
    FatalFetch(ohno::AppError),

    /// Persisted state could not be read or written.
    Storage(ohno::AppError),
}

impl From<FetchError> for AnalyticsError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Transient(e, _) => Self::TransientFetch(e),
            FetchError::Fatal(e, _) => Self::FatalFetch(e),
        }
    }
}

impl fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(message) => f.write_str(message),
            Self::TransientFetch(e) => write!(f, "GitHub is temporarily unavailable: {e}"),
            Self::FatalFetch(e) => write!(f, "GitHub request failed: {e}"),
            Self::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}
