use thiserror::Error;

/// Coarse classification of construction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    InvalidBounds,
    DimensionMismatch,
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("Configuration has {found} entries but the model declares {expected}")]
    ConfigMismatch { expected: usize, found: usize },
    #[error("Unknown distribution `{0}`")]
    UnknownDistribution(String),
    #[error("Parameter `{0}` is missing from the live points")]
    MissingParameter(String),
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::InvalidBounds(_) => ErrorKind::InvalidBounds,
            ModelError::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            ModelError::InvalidArgument(_)
            | ModelError::ConfigMismatch { .. }
            | ModelError::UnknownDistribution(_)
            | ModelError::MissingParameter(_)
            | ModelError::Arrow(_) => ErrorKind::InvalidArgument,
        }
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
