//! Error types for ouilookup.

use thiserror::Error;

/// Error type for ouilookup operations.
///
/// Every variant is terminal to the operation that produced it; the crate
/// performs no automatic retries.
#[derive(Error, Debug)]
pub enum Error {
    /// No dataset file could be located, or a source file is absent
    #[error("unable to locate: {0}")]
    NotFound(String),

    /// Network acquisition of the registry source failed
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A dataset file exists but cannot be structurally decoded
    #[error("corrupt dataset: {0}")]
    Corrupt(String),

    /// A new dataset could not be persisted
    #[error("write failed: {0}")]
    Write(String),
}

/// Result type alias for ouilookup operations.
pub type Result<T> = std::result::Result<T, Error>;
