//! Error types shared across the Plectrum engine

use thiserror::Error;

/// Engine-wide error kinds (see)
#[derive(Error, Debug)]
pub enum PlectrumError {
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("wrong parameter type for {0}")]
    WrongType(String),

    #[error("value out of range for {0}")]
    OutOfRange(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing resource: {0}")]
    MissingResource(String),

    #[error("format error: {0}")]
    FormatError(String),

    #[error("concurrency error: {0}")]
    ConcurrencyError(String),

    #[error("no credible pitch peak")]
    TransientDsp,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias used throughout the workspace
pub type PlectrumResult<T> = Result<T, PlectrumError>;
