//! Adapter error types.
//!
//! Outbound errors (validation, unsupported content) are returned to the `send` caller.
//! Inbound errors (parse, normalization) are logged by the webhook and never surface to a caller.

use crate::schema::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("unsupported content type: {0} (only Note is accepted)")]
    UnsupportedContentType(String),

    #[error("request body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot normalize request: {0}")]
    Normalization(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("binding to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
