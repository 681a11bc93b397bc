use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong during a run.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unusable configuration, such as absent credentials.
    #[error("{0}")]
    ConfigurationError(String),

    /// Transport failure or an elapsed request deadline.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The token endpoint answered with something other than 200.
    #[error("status {status}: {body}")]
    AuthError {
        /// HTTP status of the token response.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },

    /// The search endpoint answered with a non-2xx status.
    #[error("search failed: {status}: {body}")]
    SearchError {
        /// HTTP status of the search response.
        status: StatusCode,
        /// Raw response body.
        body: String,
    },

    /// A response body that is not the expected JSON.
    #[error("Failed to decode response body: {0}")]
    DecodeError(#[from] serde_json::Error),

    /// Arguments outside the accepted range.
    #[error("Invalid input: {0}")]
    InvalidInputError(String),

    /// Writing the console output failed.
    #[error("Failed to write output: {0}")]
    OutputError(#[from] std::io::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::NetworkError("request deadline elapsed".into())
    }
}
