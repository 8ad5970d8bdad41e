//! Error types for the shared pipeline types.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Forecast step {0} is outside 0..=48")]
    StepOutOfRange(u32),

    #[error("Invalid cycle hour {0}: must be one of 00, 06, 12, 18")]
    InvalidCycleHour(u32),

    #[error("Invalid cycle specification '{0}': expected YYYYMMDDHH")]
    InvalidCycle(String),

    #[error("Field shape mismatch: {values} values for a {width}x{height} grid")]
    FieldShape {
        values: usize,
        width: usize,
        height: usize,
    },

    #[error("Coordinate shape mismatch: {0}")]
    CoordinateShape(String),
}
