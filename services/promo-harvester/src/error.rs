//! Service-specific error types

use std::path::PathBuf;
use thiserror::Error;

/// Startup failures that end the process with a dedicated exit code.
///
/// Configuration and I/O problems go through `anyhow` and exit 1; this enum
/// only carries the conditions operators script against.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No valid credentials in {}", path.display())]
    NoCredentials { path: PathBuf },
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NoCredentials { .. } => 2,
        }
    }
}

/// Result alias using service Error
pub type Result<T> = std::result::Result<T, Error>;
