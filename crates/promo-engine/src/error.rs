//! Error types for engine operations
//!
//! Every variant is recoverable by waiting and retrying at the layer that
//! produced it; none of them stops the process.

/// Errors from one step of a credential cycle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("redemption failed: {0}")]
    RedeemFailure(String),

    #[error("failed to persist code: {0}")]
    Persist(String),
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
