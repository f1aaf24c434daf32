use crate::form::FormError;

/// Errors that can occur while relaying a webhook to Gotify
#[derive(thiserror::Error, Debug)]
pub enum RelayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("message serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read request body: {0}")]
    RequestBodyError(String),

    #[error("request body exceeds {0} bytes")]
    RequestBodyTooLarge(usize),

    #[error("invalid form data: {0}")]
    InvalidForm(#[from] FormError),

    #[error("upstream timeout for {0}")]
    UpstreamTimeout(String),

    #[error("upstream request failed for {0}: {1}")]
    UpstreamRequestFailed(String, String),

    #[error("failed to read response body: {0}")]
    ResponseBodyError(String),
}
