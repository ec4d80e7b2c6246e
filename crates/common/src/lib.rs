//! Shared types for the promo harvester workspace

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
