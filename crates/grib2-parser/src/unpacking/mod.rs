//! GRIB2 data unpacking.
//!
//! Simple packing (template 5.0) is decoded here. Everything else, notably
//! the complex packing with spatial differencing (5.3) that HRRR uses, is
//! handed to the `grib` crate.

use std::io::Cursor;

use tracing::debug;

use crate::sections::DataRepresentation;
use crate::Grib2Error;

/// Unpack simple packed GRIB2 data.
///
/// `Y = (R + X * 2^E) / 10^D` for every packed value `X`. Points masked out by
/// the bitmap carry no packed value and come back as NaN.
pub fn unpack_simple(
    packed_data: &[u8],
    num_points: usize,
    repr: &DataRepresentation,
    bitmap: Option<&[u8]>,
) -> Result<Vec<f32>, Grib2Error> {
    let reference = repr.reference_value as f64;
    let binary_scale = 2.0_f64.powi(repr.binary_scale_factor as i32);
    let decimal_scale = 10.0_f64.powi(-(repr.decimal_scale_factor as i32));
    let bits_per_value = repr.bits_per_value as usize;

    let mut values = Vec::with_capacity(num_points);
    let mut bit_position = 0;

    for i in 0..num_points {
        if let Some(bm) = bitmap {
            if !bitmap_is_set(bm, i)? {
                values.push(f32::NAN);
                continue;
            }
        }

        let packed_value = if bits_per_value == 0 {
            // Constant field
            0
        } else {
            let v = extract_bits(packed_data, bit_position, bits_per_value)?;
            bit_position += bits_per_value;
            v
        };

        let value = (reference + packed_value as f64 * binary_scale) * decimal_scale;
        values.push(value as f32);
    }

    Ok(values)
}

/// Decode one complete GRIB2 message with the `grib` crate.
///
/// Missing points come back as NaN.
pub fn unpack_with_grib(message: &[u8]) -> Result<Vec<f32>, Grib2Error> {
    let grib2 = grib::from_reader(Cursor::new(message))
        .map_err(|e| Grib2Error::UnpackingError(format!("grib crate could not read message: {}", e)))?;

    let ((section, submessage), submsg) = grib2
        .iter()
        .next()
        .ok_or_else(|| Grib2Error::UnpackingError("Message holds no submessage".to_string()))?;
    debug!(section, submessage, "Decoding submessage with grib crate");

    let decoder = grib::Grib2SubmessageDecoder::from(submsg)
        .map_err(|e| Grib2Error::UnpackingError(format!("Failed to create decoder: {}", e)))?;
    let values = decoder
        .dispatch()
        .map_err(|e| Grib2Error::UnpackingError(format!("Failed to decode values: {}", e)))?;

    Ok(values.collect())
}

fn bitmap_is_set(bitmap: &[u8], index: usize) -> Result<bool, Grib2Error> {
    // MSB first, 1 = value present
    let byte = bitmap.get(index / 8).ok_or_else(|| {
        Grib2Error::UnpackingError(format!("Bitmap too short for point {}", index))
    })?;
    Ok((byte >> (7 - index % 8)) & 1 == 1)
}

/// Extract `num_bits` bits starting at `start_bit`, MSB first.
fn extract_bits(data: &[u8], start_bit: usize, num_bits: usize) -> Result<u32, Grib2Error> {
    if num_bits > 32 {
        return Err(Grib2Error::UnpackingError(format!(
            "Invalid number of bits: {}",
            num_bits
        )));
    }

    if (start_bit + num_bits + 7) / 8 > data.len() {
        return Err(Grib2Error::UnpackingError(
            "Not enough data to extract bits".to_string(),
        ));
    }

    let mut result = 0u32;
    for i in 0..num_bits {
        let absolute_bit = start_bit + i;
        let bit = (data[absolute_bit / 8] >> (7 - absolute_bit % 8)) & 1;
        result = (result << 1) | bit as u32;
    }

    Ok(result)
}
