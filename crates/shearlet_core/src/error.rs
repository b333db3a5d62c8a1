//! Error type shared by the public entry points of the crate.

/// Common result type for shearlet operations.
pub type Result<T> = std::result::Result<T, ShearletError>;

/// Errors surfaced by system construction, analysis, synthesis and
/// coefficient editing.
#[derive(Debug, thiserror::Error)]
pub enum ShearletError {
    /// A matrix does not have the dimensions the operation was configured for.
    #[error("dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// A coefficient collection does not hold one band per shearlet.
    #[error("coefficient count mismatch: expected {expected} bands, got {actual}")]
    CoefficientCountMismatch { expected: usize, actual: usize },

    /// A band index past the end of a coefficient collection.
    #[error("index {index} out of range for {len} bands")]
    IndexOutOfRange { index: usize, len: usize },

    /// A filter stage is larger than the grid it has to be padded into.
    #[error("filter of size {filter:?} does not fit in a {target:?} grid")]
    FilterDoesNotFit {
        filter: (usize, usize),
        target: (usize, usize),
    },

    /// Rejected configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Buffer length does not match the requested shape.
    #[error("shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
