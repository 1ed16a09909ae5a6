//! Error types for snapshot operations.
//!
//! Only render, write, and deadline failures abort a snapshot. Per-resource
//! fetch and extraction failures are absorbed inside the inlining engine and
//! surface as log warnings, never as errors.

use std::fmt;

/// Terminal failure classes for a snapshot operation.
#[derive(Debug, Clone)]
pub enum SnapshotError {
    /// Browser launch, navigation, or render timeout failure
    Render(String),
    /// Destination file could not be written
    Write(String),
    /// Whole-operation deadline exceeded
    Timeout(String),
    /// Other errors
    Other(String),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Write(msg) => write!(f, "Write error: {msg}"),
            Self::Timeout(msg) => write!(f, "Timeout: {msg}"),
            Self::Other(msg) => write!(f, "Snapshot error: {msg}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<anyhow::Error> for SnapshotError {
    fn from(err: anyhow::Error) -> Self {
        // Use {:#} to preserve the full error chain with context
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `SnapshotError`
pub type SnapshotResult<T> = Result<T, SnapshotError>;
