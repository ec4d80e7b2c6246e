//! Error types for protocol and local file operations

/// Errors from a single protocol call or local record operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("response missing field: {0}")]
    MissingField(&'static str),

    #[error("credential parse error: {0}")]
    CredentialParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
