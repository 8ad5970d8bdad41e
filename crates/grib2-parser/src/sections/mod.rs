//! GRIB2 section parsing.
//!
//! Each GRIB2 message is a sequence of numbered sections: indicator (0),
//! identification (1), optional local use (2), grid definition (3), product
//! definition (4), data representation (5), bitmap (6), data (7) and the
//! `7777` end marker (8). Only the first occurrence of each section is read;
//! files produced by the NOMADS filter carry one field per message.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};

use crate::tables::Grib2Tables;
use crate::Grib2Error;

/// Scanning mode flag: points scan in -i direction (east to west).
pub const SCAN_I_NEGATIVE: u8 = 0x80;
/// Scanning mode flag: points scan in +j direction (south to north).
pub const SCAN_J_POSITIVE: u8 = 0x40;
/// Scanning mode flag: adjacent points in j are consecutive (column-major).
pub const SCAN_J_CONSECUTIVE: u8 = 0x20;
/// Scanning mode flag: adjacent rows scan in opposite directions.
pub const SCAN_ALTERNATING: u8 = 0x10;

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub discipline: u8,
    pub edition: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub reference_time: DateTime<Utc>,
    pub production_status: u8,
    pub data_type: u8,
}

/// Section 3: Grid Definition Section
#[derive(Debug, Clone)]
pub struct GridDefinition {
    /// Grid definition template number (3.x)
    pub template: u16,
    pub num_points: u32,
    /// Shape of the earth (code table 3.2)
    pub earth_shape: u8,
    pub grid: GridTemplate,
}

/// Template-specific part of the grid definition.
#[derive(Debug, Clone)]
pub enum GridTemplate {
    /// Template 3.0
    LatLon(LatLonGrid),
    /// Template 3.30
    Lambert(LambertGrid),
    /// Any other template; only the dimensions are known.
    Other { ni: u32, nj: u32 },
}

/// Regular latitude/longitude grid. Angles in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct LatLonGrid {
    pub ni: u32,
    pub nj: u32,
    pub la1: f64,
    pub lo1: f64,
    pub la2: f64,
    pub lo2: f64,
    pub di: f64,
    pub dj: f64,
    pub scanning_mode: u8,
}

/// Lambert conformal grid. Angles in degrees, spacing in meters.
#[derive(Debug, Clone, PartialEq)]
pub struct LambertGrid {
    pub nx: u32,
    pub ny: u32,
    pub la1: f64,
    pub lo1: f64,
    pub lad: f64,
    pub lov: f64,
    pub dx: f64,
    pub dy: f64,
    pub projection_centre: u8,
    pub scanning_mode: u8,
    pub latin1: f64,
    pub latin2: f64,
}

impl GridDefinition {
    /// Number of points along a row and along a column, `(ni, nj)`.
    pub fn dims(&self) -> (usize, usize) {
        match &self.grid {
            GridTemplate::LatLon(g) => (g.ni as usize, g.nj as usize),
            GridTemplate::Lambert(g) => (g.nx as usize, g.ny as usize),
            GridTemplate::Other { ni, nj } => (*ni as usize, *nj as usize),
        }
    }

    pub fn scanning_mode(&self) -> u8 {
        match &self.grid {
            GridTemplate::LatLon(g) => g.scanning_mode,
            GridTemplate::Lambert(g) => g.scanning_mode,
            GridTemplate::Other { .. } => 0,
        }
    }

    /// Earth radius in meters implied by the shape code.
    pub fn earth_radius(&self) -> f64 {
        match self.earth_shape {
            0 => 6_367_470.0,
            _ => 6_371_229.0,
        }
    }
}

/// Section 4: Product Definition Section
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub template: u16,
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub parameter_short_name: String,
    pub level_type: u8,
    pub level_value: u32,
    pub level_description: String,
    pub forecast_time: u32,
}

/// Section 5: Data Representation Section
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    /// Number of packed values (excludes points masked by the bitmap)
    pub num_data_points: u32,
    /// Data representation template number (5.x)
    pub template: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

/// Section 6: Bitmap Section, present only when the indicator is 0.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub data: Bytes,
}

/// Section 7: Data Section
#[derive(Debug, Clone)]
pub struct DataSection {
    pub data: Bytes,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from the start of a message.
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "Not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "Invalid GRIB magic bytes".to_string(),
        ));
    }

    // Octets 5-6 reserved, 7 discipline, 8 edition, 9-16 total length
    let discipline = data[6];
    let edition = data[7];

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "Expected GRIB edition 2, got {}",
            edition
        )));
    }

    Ok(Indicator {
        discipline,
        edition,
        message_length: read_u64(&data[8..16]),
    })
}

/// Parse Section 1 (Identification), located right after the indicator.
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    let section = section_slice(data, find_section(data, 1)?, 1, 21)?;

    let center = read_u16(&section[5..7]);
    let sub_center = read_u16(&section[7..9]);

    let year = read_u16(&section[12..14]);
    let (month, day, hour, minute, second) =
        (section[14], section[15], section[16], section[17], section[18]);

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "Invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    Ok(Identification {
        center,
        sub_center,
        reference_time: DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc),
        production_status: section[19],
        data_type: section[20],
    })
}

/// Parse Section 3 (Grid Definition).
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, Grib2Error> {
    let section = section_slice(data, find_section(data, 3)?, 3, 14)?;

    let num_points = read_u32(&section[6..10]);
    let template = read_u16(&section[12..14]);

    // Template data starts at octet 15
    let gd = &section[14..];
    let too_short = |needed: usize| Grib2Error::InvalidSection {
        section: 3,
        reason: format!(
            "Template 3.{} needs at least {} bytes, got {}",
            template,
            needed,
            gd.len()
        ),
    };

    let grid = match template {
        0 => {
            if gd.len() < 58 {
                return Err(too_short(58));
            }
            GridTemplate::LatLon(LatLonGrid {
                ni: read_u32(&gd[16..20]),
                nj: read_u32(&gd[20..24]),
                la1: micro_degrees(&gd[32..36]),
                lo1: micro_degrees(&gd[36..40]),
                la2: micro_degrees(&gd[41..45]),
                lo2: micro_degrees(&gd[45..49]),
                di: read_u32(&gd[49..53]) as f64 * 1e-6,
                dj: read_u32(&gd[53..57]) as f64 * 1e-6,
                scanning_mode: gd[57],
            })
        }
        30 => {
            if gd.len() < 59 {
                return Err(too_short(59));
            }
            GridTemplate::Lambert(LambertGrid {
                nx: read_u32(&gd[16..20]),
                ny: read_u32(&gd[20..24]),
                la1: micro_degrees(&gd[24..28]),
                lo1: micro_degrees(&gd[28..32]),
                lad: micro_degrees(&gd[33..37]),
                lov: micro_degrees(&gd[37..41]),
                // Dx and Dy are in millimetres
                dx: read_u32(&gd[41..45]) as f64 * 1e-3,
                dy: read_u32(&gd[45..49]) as f64 * 1e-3,
                projection_centre: gd[49],
                scanning_mode: gd[50],
                latin1: micro_degrees(&gd[51..55]),
                latin2: micro_degrees(&gd[55..59]),
            })
        }
        _ => {
            if gd.len() < 24 {
                return Err(too_short(24));
            }
            GridTemplate::Other {
                ni: read_u32(&gd[16..20]),
                nj: read_u32(&gd[20..24]),
            }
        }
    };

    Ok(GridDefinition {
        template,
        num_points,
        earth_shape: gd.first().copied().unwrap_or(6),
        grid,
    })
}

/// Parse Section 4 (Product Definition).
///
/// Templates 4.0 and 4.8 (and most of their relatives) share the layout of
/// the fields read here.
pub fn parse_product_definition(
    data: &[u8],
    discipline: u8,
    tables: &Grib2Tables,
) -> Result<ProductDefinition, Grib2Error> {
    let section = section_slice(data, find_section(data, 4)?, 4, 34)?;

    let template = read_u16(&section[7..9]);
    let parameter_category = section[9];
    let parameter_number = section[10];
    let forecast_time = read_u32(&section[18..22]);
    let level_type = section[22];
    let level_value = read_u32(&section[24..28]);

    Ok(ProductDefinition {
        template,
        parameter_category,
        parameter_number,
        parameter_short_name: tables.get_parameter_name(
            discipline,
            parameter_category,
            parameter_number,
        ),
        level_type,
        level_value,
        level_description: tables.get_level_description(level_type, level_value),
        forecast_time,
    })
}

/// Parse Section 5 (Data Representation).
///
/// The leading fields of template 5.0 are shared by the complex packing
/// templates (5.2, 5.3) and the PNG/JPEG2000 templates.
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let section = section_slice(data, find_section(data, 5)?, 5, 21)?;

    Ok(DataRepresentation {
        num_data_points: read_u32(&section[5..9]),
        template: read_u16(&section[9..11]),
        reference_value: f32::from_be_bytes([section[11], section[12], section[13], section[14]]),
        binary_scale_factor: decode_grib2_signed_i16([section[15], section[16]]),
        decimal_scale_factor: decode_grib2_signed_i16([section[17], section[18]]),
        bits_per_value: section[19],
        original_data_type: section[20],
    })
}

/// Parse Section 6 (Bitmap). Returns `None` when no bitmap applies.
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Bitmap>, Grib2Error> {
    let offset = find_section(data, 6)?;
    let section = section_slice(data, offset, 6, 6)?;

    match section[5] {
        255 => Ok(None),
        0 => Ok(Some(Bitmap {
            data: Bytes::copy_from_slice(&section[6..]),
        })),
        indicator => Err(Grib2Error::InvalidSection {
            section: 6,
            reason: format!("Unsupported bitmap indicator {}", indicator),
        }),
    }
}

/// Parse Section 7 (Data).
pub fn parse_data_section(data: &[u8]) -> Result<DataSection, Grib2Error> {
    let section = section_slice(data, find_section(data, 7)?, 7, 5)?;

    Ok(DataSection {
        data: Bytes::copy_from_slice(&section[5..]),
    })
}

/// Decode a GRIB2 sign-magnitude 32-bit integer (high bit is the sign).
pub fn decode_grib2_signed(bytes: [u8; 4]) -> i32 {
    let raw = u32::from_be_bytes(bytes);
    let magnitude = (raw & 0x7FFF_FFFF) as i32;
    if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Decode a GRIB2 sign-magnitude 16-bit integer.
pub fn decode_grib2_signed_i16(bytes: [u8; 2]) -> i16 {
    let raw = u16::from_be_bytes(bytes);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

// ===== Helper Functions =====

/// Find a section by number within a message, returning its offset.
fn find_section(data: &[u8], section_num: u8) -> Result<usize, Grib2Error> {
    let not_found = |reason: &str| Grib2Error::InvalidSection {
        section: section_num,
        reason: reason.to_string(),
    };

    let mut offset = 16; // After Section 0

    loop {
        if offset + 4 <= data.len() && &data[offset..offset + 4] == b"7777" {
            return Err(not_found("Reached end of message without finding section"));
        }
        if offset + 5 > data.len() {
            return Err(not_found("Section not found"));
        }

        let section_length = read_u32(&data[offset..offset + 4]) as usize;
        if section_length < 5 || offset + section_length > data.len() {
            return Err(not_found("Invalid section length"));
        }

        if data[offset + 4] == section_num {
            return Ok(offset);
        }

        offset += section_length;
    }
}

/// Slice out a whole section, checking it holds at least `min_len` bytes.
fn section_slice(
    data: &[u8],
    offset: usize,
    section_num: u8,
    min_len: usize,
) -> Result<&[u8], Grib2Error> {
    let length = read_u32(&data[offset..offset + 4]) as usize;
    if length < min_len {
        return Err(Grib2Error::InvalidSection {
            section: section_num,
            reason: format!("Section is {} bytes, expected at least {}", length, min_len),
        });
    }
    Ok(&data[offset..offset + length])
}

fn micro_degrees(bytes: &[u8]) -> f64 {
    decode_grib2_signed([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64 * 1e-6
}

fn read_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_grib2_signed() {
        assert_eq!(decode_grib2_signed([0x00, 0x00, 0x00, 0x05]), 5);
        assert_eq!(decode_grib2_signed([0x80, 0x00, 0x00, 0x05]), -5);
        // 21.138123N in microdegrees
        assert_eq!(decode_grib2_signed(21_138_123u32.to_be_bytes()), 21_138_123);
        assert_eq!(
            decode_grib2_signed((0x8000_0000u32 | 97_500_000).to_be_bytes()),
            -97_500_000
        );
    }

    #[test]
    fn test_decode_grib2_signed_i16() {
        assert_eq!(decode_grib2_signed_i16([0x00, 0x03]), 3);
        assert_eq!(decode_grib2_signed_i16([0x80, 0x03]), -3);
        assert_eq!(decode_grib2_signed_i16([0x80, 0x00]), 0);
    }

    #[test]
    fn test_indicator_rejects_bad_magic() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIP");
        assert!(matches!(
            parse_indicator(&data),
            Err(Grib2Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_indicator_rejects_edition_one() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIB");
        data[7] = 1;
        assert!(parse_indicator(&data).is_err());
    }

    #[test]
    fn test_indicator_reads_full_length() {
        let mut data = vec![0u8; 16];
        data[..4].copy_from_slice(b"GRIB");
        data[7] = 2;
        data[8..16].copy_from_slice(&0x1_0000_0010u64.to_be_bytes());

        let indicator = parse_indicator(&data).unwrap();
        assert_eq!(indicator.message_length, 0x1_0000_0010);
    }

    #[test]
    fn test_find_section_stops_at_end_marker() {
        let mut data = vec![0u8; 16];
        data.extend_from_slice(b"7777");
        assert!(matches!(
            find_section(&data, 3),
            Err(Grib2Error::InvalidSection { section: 3, .. })
        ));
    }
}
