use std::time::Duration;
use thiserror::Error;

/// Why a call to a rate provider produced no usable value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    #[error("Network failure: {0}")]
    Network(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl FetchError {
    /// Classifies a reqwest error; `timeout` is the deadline the request ran under.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            FetchError::Timeout(timeout)
        } else if err.is_decode() {
            FetchError::MalformedPayload(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}
