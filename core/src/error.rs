use thiserror::Error;

/// Failure reported by a [`RecipeSource`](crate::service::RecipeSource).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("recipe '{0}' not found")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::NotFound(_) | FetchError::Decode(_) => false,
            FetchError::Network(_) => true,
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
        }
    }
}
