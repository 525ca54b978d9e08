//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("frame shape mismatch: expected {expected} values, got {actual}")]
    FrameShape { expected: usize, actual: usize },

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    #[error("invalid matrix kind: {0}")]
    InvalidMatrixKind(String),

    #[error("invalid frame kind: {0}")]
    InvalidFrameKind(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
