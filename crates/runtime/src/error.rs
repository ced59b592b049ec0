use std::time::Duration;

/// Error type for a single widget-data fetch attempt.
///
/// The runtime retries [`retryable`](FetchError::is_retryable) errors up to
/// its configured ceiling; authentication failures surface immediately.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// The backend rejected the bearer token (401). Never retried.
    #[error("Authentication failed")]
    Unauthorized,

    /// The endpoint answered with a non-2xx status other than 401.
    #[error("Widget data endpoint returned HTTP {0}")]
    HttpStatus(u16),

    /// The request never produced a response (connect error, DNS, reset).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The runtime's own request deadline elapsed.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Whether the runtime should retry after this error.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::Unauthorized)
    }
}
