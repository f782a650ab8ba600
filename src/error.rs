//! Error types for schema introspection
//!
//! Completion itself never fails. These errors only travel as far as the
//! reload boundary in the completion service, where they are logged and turned
//! into an unloaded snapshot.

use thiserror::Error;

/// Result alias for introspection calls
pub type IntrospectionResult<T> = Result<T, IntrospectionError>;

/// Errors raised while fetching schema metadata
#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// Transport failure or non-success HTTP status
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL cannot address the endpoints
    #[error("Invalid introspection URL: {0}")]
    InvalidUrl(String),

    /// Endpoint answered with `success: false`
    #[error("Introspection rejected: {message}")]
    Rejected { message: String },

    /// Endpoint answered `success: true` without the expected body
    #[error("Introspection response is missing `{0}`")]
    MissingPayload(&'static str),

    /// Body could not be decoded
    #[error("Failed to decode introspection response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl IntrospectionError {
    /// Build a rejection from the optional server message
    pub fn rejected(message: Option<String>) -> Self {
        Self::Rejected {
            message: message.unwrap_or_else(|| "no message".to_string()),
        }
    }
}
