//! GRIB2 parser (WMO FM 92 GRIB Edition 2).
//!
//! Splits a GRIB2 file into messages, parses the metadata sections needed to
//! pick a field and place it on the globe, and unpacks the data values.

pub mod sections;
pub mod tables;
pub mod unpacking;

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

pub use sections::{
    decode_grib2_signed, Bitmap, DataRepresentation, DataSection, GridDefinition, GridTemplate,
    Identification, Indicator, LambertGrid, LatLonGrid, ProductDefinition,
};
pub use tables::{Grib2Tables, LevelDescription};
pub use unpacking::{unpack_simple, unpack_with_grib};

#[derive(Debug, Error)]
pub enum Grib2Error {
    #[error("Invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    #[error("Invalid section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    #[error("Message truncated: header declares {declared} bytes, {available} available")]
    Truncated { declared: u64, available: usize },

    #[error("Unpacking error: {0}")]
    UnpackingError(String),
}

/// One GRIB2 message with its parsed sections.
#[derive(Debug, Clone)]
pub struct Grib2Message {
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    pub bitmap: Option<Bitmap>,
    pub data_section: DataSection,
    raw: Bytes,
}

impl Grib2Message {
    fn parse(raw: Bytes, indicator: Indicator, tables: &Grib2Tables) -> Result<Self, Grib2Error> {
        let data = raw.as_ref();

        let identification = sections::parse_identification(data)?;
        let grid_definition = sections::parse_grid_definition(data)?;
        let product_definition =
            sections::parse_product_definition(data, indicator.discipline, tables)?;
        let data_representation = sections::parse_data_representation(data)?;
        let bitmap = sections::parse_bitmap(data)?;
        let data_section = sections::parse_data_section(data)?;

        Ok(Self {
            indicator,
            identification,
            grid_definition,
            product_definition,
            data_representation,
            bitmap,
            data_section,
            raw,
        })
    }

    /// Parameter short name, e.g. `MSLMA`.
    pub fn parameter(&self) -> &str {
        &self.product_definition.parameter_short_name
    }

    /// Level description, e.g. `mean sea level`.
    pub fn level(&self) -> &str {
        &self.product_definition.level_description
    }

    /// Whether this message carries the given parameter code and level type.
    pub fn matches(&self, key: tables::ParamKey, level_type: u8) -> bool {
        let product = &self.product_definition;
        (
            self.indicator.discipline,
            product.parameter_category,
            product.parameter_number,
        ) == key
            && product.level_type == level_type
    }

    /// The raw message bytes, from `GRIB` through `7777`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Unpack every grid point in scan order. Missing points are NaN.
    pub fn unpack_data(&self) -> Result<Vec<f32>, Grib2Error> {
        let num_points = self.grid_definition.num_points as usize;
        let repr = &self.data_representation;

        let values = match repr.template {
            0 => unpack_simple(
                &self.data_section.data,
                num_points,
                repr,
                self.bitmap.as_ref().map(|b| b.data.as_ref()),
            )?,
            template => {
                debug!(template, "Delegating unpacking to grib crate");
                unpack_with_grib(&self.raw)?
            }
        };

        if values.len() != num_points {
            return Err(Grib2Error::UnpackingError(format!(
                "Unpacked {} values for {} grid points",
                values.len(),
                num_points
            )));
        }

        Ok(values)
    }
}

/// Sequential reader over the messages of a GRIB2 file.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
    tables: Arc<Grib2Tables>,
}

impl Grib2Reader {
    pub fn new(data: Bytes, tables: Arc<Grib2Tables>) -> Self {
        Self {
            data,
            offset: 0,
            tables,
        }
    }

    /// Parse the next message, or `None` once no `GRIB` marker remains.
    pub fn next_message(&mut self) -> Result<Option<Grib2Message>, Grib2Error> {
        let remaining = &self.data[self.offset..];
        let start = match remaining.windows(4).position(|w| w == b"GRIB") {
            Some(pos) => self.offset + pos,
            None => {
                self.offset = self.data.len();
                return Ok(None);
            }
        };

        let indicator = sections::parse_indicator(&self.data[start..])?;
        let available = self.data.len() - start;
        let length = usize::try_from(indicator.message_length)
            .ok()
            .filter(|len| *len <= available && *len >= 20)
            .ok_or(Grib2Error::Truncated {
                declared: indicator.message_length,
                available,
            })?;

        let end = start + length;
        if &self.data[end - 4..end] != b"7777" {
            return Err(Grib2Error::InvalidFormat(
                "Message does not end with 7777".to_string(),
            ));
        }

        self.offset = end;
        let raw = self.data.slice(start..end);
        Grib2Message::parse(raw, indicator, &self.tables).map(Some)
    }
}

impl Iterator for Grib2Reader {
    type Item = Result<Grib2Message, Grib2Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.next_message().transpose();
        if matches!(result, Some(Err(_))) {
            // Stop after the first malformed message
            self.offset = self.data.len();
        }
        result
    }
}
