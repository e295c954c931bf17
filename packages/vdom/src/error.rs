//! Error types for host adapters and reconciliation

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("index {index} out of bounds for parent with {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("unknown host node: {0}")]
    UnknownNode(String),

    #[error("host node {child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    #[error("host operation failed: {0}")]
    Operation(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// The live host tree no longer matches the baseline the diff was computed against
    #[error("structural mismatch at host index {index}: {reason}")]
    StructuralMismatch { index: usize, reason: String },

    #[error(transparent)]
    Host(#[from] HostError),
}

pub type HostResult<T> = Result<T, HostError>;

pub type VdomResult<T> = Result<T, ReconcileError>;
