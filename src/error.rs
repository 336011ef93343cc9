use thiserror::Error;

/// Errors that can occur when building or querying an LSH index.
///
/// Configuration errors are raised eagerly by [`LshIndex::build`] and never
/// leave a partial index behind. Data errors are raised by the call that
/// detects them; the index stays usable for other queries.
///
/// [`LshIndex::build`]: crate::index::LshIndex::build
#[derive(Debug, Error)]
pub enum LshError {
    #[error("dimension must be greater than 0")]
    ZeroDimension,

    #[error("num_projections must be greater than 0, got {0}")]
    InvalidNumProjections(usize),

    #[error("num_tables must be greater than 0, got {0}")]
    InvalidNumTables(usize),

    #[error("bandwidth must be finite and greater than 0, got {0}")]
    InvalidBandwidth(f32),

    #[error("cannot build an index over an empty corpus")]
    EmptyCorpus,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("flat data of length {len} leaves a partial row for dimension {dim}")]
    PartialRow { len: usize, dim: usize },

    #[error("query index {index} out of range for corpus of {len} points")]
    QueryOutOfRange { index: usize, len: usize },

    #[error("corpus mismatch: index was built over {expected} points, corpus has {got}")]
    CorpusMismatch { expected: usize, got: usize },

    #[cfg(feature = "persistence")]
    #[error("serialization error: {0}")]
    Serialization(String),

    #[cfg(feature = "persistence")]
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LshError {
    /// True for errors caused by invalid build or query parameters.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LshError::ZeroDimension
                | LshError::InvalidNumProjections(_)
                | LshError::InvalidNumTables(_)
                | LshError::InvalidBandwidth(_)
                | LshError::EmptyCorpus
                | LshError::InvalidConfig(_)
        )
    }
}

/// A specialized Result type for LSH index operations.
pub type Result<T> = std::result::Result<T, LshError>;
