//! Common types shared across the MSLP chart pipeline.

pub mod cycle;
pub mod error;
pub mod field;
pub mod files;
pub mod step;

pub use cycle::ForecastCycle;
pub use error::{CommonError, CommonResult};
pub use field::{DecodedField, GeoBounds, GridCell, GridCoordinates};
pub use files::{grib_file_name, png_file_name};
pub use step::ForecastStep;
