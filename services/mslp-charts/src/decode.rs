//! Extract the MSLMA field from a downloaded GRIB2 file.
//!
//! The returned field is in hPa, row 0 northernmost, with latitude and
//! longitude for every cell.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use grib2_parser::sections::{SCAN_ALTERNATING, SCAN_I_NEGATIVE, SCAN_J_CONSECUTIVE, SCAN_J_POSITIVE};
use grib2_parser::{tables, Grib2Error, Grib2Message, Grib2Reader, Grib2Tables, GridTemplate};
use mslp_common::{CommonError, DecodedField, GridCoordinates};
use projection::lambert::normalize_longitude;
use projection::{LambertConformal, LambertParameters};
use thiserror::Error;
use tracing::{debug, instrument};

const PA_PER_HPA: f32 = 100.0;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Grib(#[from] Grib2Error),

    #[error("No MSLMA message at mean sea level")]
    FieldNotFound,

    #[error("Unsupported grid definition template 3.{0}")]
    UnsupportedTemplate(u16),

    #[error("Unsupported scanning mode 0x{0:02x}")]
    UnsupportedScanMode(u8),

    #[error("Decoded field is inconsistent: {0}")]
    Field(#[from] CommonError),
}

/// Read and decode the sea-level pressure field of a GRIB2 file.
#[instrument(skip_all, fields(path = %path.display()))]
pub async fn decode_mslp(path: &Path) -> Result<DecodedField, DecodeError> {
    let data = tokio::fs::read(path).await.map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_mslp_bytes(Bytes::from(data))
}

/// Decode the first MSLMA message at mean sea level in `data`.
pub fn decode_mslp_bytes(data: Bytes) -> Result<DecodedField, DecodeError> {
    let ncep = Arc::new(Grib2Tables::ncep());

    let mut message = None;
    for msg in Grib2Reader::new(data, ncep) {
        let msg = msg?;
        if msg.matches(tables::MSLMA, tables::LEVEL_MEAN_SEA_LEVEL) {
            message = Some(msg);
            break;
        }
        debug!(parameter = msg.parameter(), level = msg.level(), "Skipping message");
    }
    let message = message.ok_or(DecodeError::FieldNotFound)?;

    field_from_message(&message)
}

fn field_from_message(message: &Grib2Message) -> Result<DecodedField, DecodeError> {
    let grid = &message.grid_definition;
    let scanning_mode = grid.scanning_mode();
    if scanning_mode & (SCAN_I_NEGATIVE | SCAN_J_CONSECUTIVE | SCAN_ALTERNATING) != 0 {
        return Err(DecodeError::UnsupportedScanMode(scanning_mode));
    }
    let south_first = scanning_mode & SCAN_J_POSITIVE != 0;

    let (width, height) = grid.dims();
    let coordinates = match &grid.grid {
        GridTemplate::LatLon(g) => {
            let dj = if south_first { g.dj } else { -g.dj };
            GridCoordinates::Regular {
                latitudes: (0..height).map(|j| g.la1 + j as f64 * dj).collect(),
                longitudes: (0..width)
                    .map(|i| normalize_longitude(g.lo1 + i as f64 * g.di))
                    .collect(),
            }
        }
        GridTemplate::Lambert(g) => {
            let projection = LambertConformal::new(LambertParameters {
                lat1: g.la1,
                lon1: g.lo1,
                lov: g.lov,
                latin1: g.latin1,
                latin2: g.latin2,
                dx: g.dx,
                // cell_coordinates steps j northward
                dy: if south_first { g.dy } else { -g.dy },
                nx: width,
                ny: height,
                earth_radius: grid.earth_radius(),
            });
            let (latitudes, longitudes) = projection.cell_coordinates();
            GridCoordinates::Curvilinear {
                latitudes,
                longitudes,
            }
        }
        GridTemplate::Other { .. } => return Err(DecodeError::UnsupportedTemplate(grid.template)),
    };

    let values = message.unpack_data()?;
    let mut field = DecodedField::new(values, width, height, coordinates)?;
    field.divide_values(PA_PER_HPA);
    if south_first {
        field.flip_rows();
    }

    debug!(
        width,
        height,
        template = grid.template,
        scanning_mode,
        "Decoded MSLMA field"
    );
    Ok(field)
}
