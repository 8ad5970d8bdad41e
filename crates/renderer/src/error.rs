//! Error types for chart rendering.

use thiserror::Error;

/// Errors that can occur while rendering or saving a chart.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The field has no finite values to contour.
    #[error("field has no valid values to render")]
    EmptyField,

    #[error("invalid canvas: {0}")]
    InvalidCanvas(String),

    #[error("font error: {0}")]
    Font(String),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
