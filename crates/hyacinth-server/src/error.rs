//! Error types for the expectation server.

use hyacinth_core::XhrError;
use thiserror::Error;

/// Result type alias using [`ServerError`].
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors raised while building expectations or answering requests.
#[derive(Error, Debug)]
pub enum ServerError {
    /// A required constructor argument was not supplied.
    #[error("MissingArgumentError: {argument} is required")]
    MissingArgument {
        /// Name of the missing argument.
        argument: &'static str,
    },

    /// The bound request rejected an operation.
    #[error(transparent)]
    Xhr(#[from] XhrError),

    /// A JSON body could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A query string could not be decoded into the requested type.
    #[error("query error: {0}")]
    Query(#[from] serde_urlencoded::de::Error),

    /// A URL pattern failed to compile.
    #[error("invalid URL pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl ServerError {
    /// Creates a missing argument error.
    #[must_use]
    pub fn missing(argument: &'static str) -> Self {
        Self::MissingArgument { argument }
    }
}
