//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum GenrepError {
    /// A `(low, high)` pair with `high <= low`.
    #[error("Invalid bounds for {field}[{index}]: low = {low}, high = {high}")]
    InvalidBounds {
        /// Name of the field.
        field: String,
        /// Index within the field.
        index: usize,
        /// Lower bound.
        low: f32,
        /// Upper bound.
        high: f32,
    },

    /// A vector does not have the expected number of elements.
    #[error("Dimension mismatch for {0}: expected {1}, got {2}")]
    DimensionMismatch(String, usize, usize),

    /// The width of a feature row does not match the input width of a model.
    #[error("Feature width mismatch: model expects {expected}, transitions have {actual}")]
    FeatureWidthMismatch {
        /// Width expected by the model.
        expected: usize,
        /// Width of the transition layout.
        actual: usize,
    },

    /// The loss of the generative model became NaN or infinite.
    #[error("Non-finite generative model loss {loss} at training cycle {cycle}")]
    NonFiniteLoss {
        /// The loss value.
        loss: f32,
        /// The training cycle in which the loss was observed.
        cycle: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}
