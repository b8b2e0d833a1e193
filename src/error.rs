//! Error types surfaced by the client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The controller answered with a non-2xx status.
    #[error("request to {uri} failed with status {status}")]
    Http {
        uri: String,
        status: StatusCode,
        /// Sanitized/truncated response body, for diagnostics only.
        body: String,
    },

    /// Network-level failure reported by the transport.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A 2xx response body that is not valid JSON.
    #[error("malformed JSON from {uri}")]
    MalformedJson {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    /// A required JSON attribute or link was absent when it was needed.
    #[error("attribute {attribute} is missing from resource {resource}")]
    MissingAttribute { attribute: String, resource: String },

    /// The resource does not advertise the requested action.
    #[error("action {action} is missing from resource {resource}")]
    MissingAction { action: String, resource: String },

    /// A caller-supplied value is outside the allowed set.
    #[error("invalid value {value:?} for parameter {parameter}, valid values: {valid_values:?}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
        valid_values: Vec<String>,
    },

    /// A structured request body failed JSON-Schema validation.
    #[error("request body failed schema validation: {detail}")]
    SchemaValidation { detail: String },

    /// The library has no variant for the requested version or subtype.
    #[error("not supported: {0}")]
    NotSupported(String),

    /// A create-style action response lacked the `Location` header.
    #[error("response from {uri} is missing the Location header")]
    MissingLocationHeader { uri: String },

    /// Malformed base URL or member path.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
