//! Contour chart rendering for mean sea-level pressure fields.
//!
//! - Contour extraction (marching squares)
//! - Cool-to-warm line coloring
//! - Inline contour labels and H/L pressure-center marks
//! - PNG encoding (indexed or RGBA)

pub mod chart;
pub mod colormap;
pub mod contour;
pub mod error;
pub mod extrema;
pub mod labels;
pub mod png;
pub mod text;

pub use chart::{render_chart, ChartOptions, ExtremumMark, RenderedChart};
pub use error::{RenderError, RenderResult};
