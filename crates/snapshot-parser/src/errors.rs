//! Error types for snapshot parsing

use thiserror::Error;

/// Snapshot parse error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SnapshotError {
    /// The snapshot text is not well-formed XML
    #[error("Malformed snapshot: {0}")]
    Malformed(String),
}
