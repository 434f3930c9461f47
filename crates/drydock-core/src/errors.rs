//! Error types for drydock-core.
//!
//! Every fallible engine function returns `DrydockResult<T>`. Variants map to the
//! fatal failure classes of a load (`Parse`, `Version`, `MissingHull`) plus the
//! usual plumbing errors for configuration and serialization.
//!
//! Recoverable gaps are never errors: they are recorded in a
//! [`MigrationReport`](crate::report::MigrationReport) and the load continues.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type DrydockResult<T> = Result<T, DrydockError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrydockError {
    /// Input is not well-formed structured text.
    #[error("parse error: {0}")]
    Parse(String),

    /// Declared schema version cannot be loaded by this engine.
    #[error("version error: {0}")]
    Version(String),

    /// Hull reference absent or unknown to the catalog.
    #[error("missing hull: {0}")]
    MissingHull(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl DrydockError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn version(msg: impl Into<String>) -> Self {
        Self::Version(msg.into())
    }

    pub fn missing_hull(msg: impl Into<String>) -> Self {
        Self::MissingHull(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// True for the three failure classes that abort a load.
    pub fn is_fatal_load_error(&self) -> bool {
        matches!(self, Self::Parse(_) | Self::Version(_) | Self::MissingHull(_))
    }
}

impl From<serde_json::Error> for DrydockError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
