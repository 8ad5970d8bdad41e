//! HRRR mean sea-level pressure charts.
//!
//! Downloads the MSLMA field of every forecast step of a cycle from the
//! NOMADS grib filter and renders each one as a contour chart.

pub mod decode;
pub mod fetch;
pub mod layout;
pub mod pipeline;

pub use decode::{decode_mslp, decode_mslp_bytes, DecodeError};
pub use fetch::{FetchError, GridFetcher, DEFAULT_BASE_URL};
pub use layout::OutputLayout;
pub use pipeline::{Pipeline, PipelineConfig, RunSummary};
