//! Boundary error type for the archiver library.
//!
//! Internals use `anyhow` with context; the public entry points convert into
//! `ArchiveError` so callers can match on the failure class without losing
//! the context chain.

use thiserror::Error;

/// Errors surfaced by the public archival entry points.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// Missing or invalid configuration (environment, CLI flags).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Browser discovery, download or launch failed.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Navigation to the target page failed or timed out.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// The captured document could not be parsed or serialized.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Upload to the object store failed.
    #[error("Store error: {0}")]
    Store(String),

    /// Anything that does not fit the classes above.
    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for ArchiveError {
    fn from(err: anyhow::Error) -> Self {
        // `{:#}` flattens the context chain into one line.
        ArchiveError::Other(format!("{err:#}"))
    }
}

/// Convenience alias used by the public API.
pub type Result<T> = std::result::Result<T, ArchiveError>;
