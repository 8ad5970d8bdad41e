//! Synthetic pressure fields.
//!
//! All generators return row-major `Vec<f32>` with row 0 first.

/// Standard sea-level pressure in Pa.
pub const STANDARD_PRESSURE_PA: f32 = 101_325.0;

/// A field in Pa with one low-pressure and one high-pressure system.
///
/// The low (about 990 hPa) sits in the upper-left quarter of the grid, the
/// high (about 1030 hPa) in the lower-right quarter, on a 1012 hPa
/// background.
pub fn create_pressure_systems(width: usize, height: usize) -> Vec<f32> {
    let w = width.max(1) as f32;
    let h = height.max(1) as f32;
    let (low_x, low_y) = (w * 0.3, h * 0.3);
    let (high_x, high_y) = (w * 0.7, h * 0.7);
    let radius2 = (w.min(h) * 0.25).powi(2).max(1.0);

    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let (x, y) = (col as f32, row as f32);
            let low = -22.0 * (-((x - low_x).powi(2) + (y - low_y).powi(2)) / radius2).exp();
            let high = 18.0 * (-((x - high_x).powi(2) + (y - high_y).powi(2)) / radius2).exp();
            data.push((1012.0 + low + high) * 100.0);
        }
    }
    data
}

/// Values rising linearly in row-major order from `min` to exactly `max`.
pub fn create_ramp_grid(width: usize, height: usize, min: f32, max: f32) -> Vec<f32> {
    let n = width * height;
    if n <= 1 {
        return vec![min; n];
    }
    (0..n)
        .map(|i| {
            if i == n - 1 {
                max
            } else {
                min + (max - min) * (i as f32 / (n - 1) as f32)
            }
        })
        .collect()
}

/// A flat field with a single minimum and a single maximum cell.
///
/// `low` and `high` are `(row, col, value)`.
pub fn create_extrema_grid(
    width: usize,
    height: usize,
    background: f32,
    low: (usize, usize, f32),
    high: (usize, usize, f32),
) -> Vec<f32> {
    let mut data = vec![background; width * height];
    data[low.0 * width + low.1] = low.2;
    data[high.0 * width + high.1] = high.2;
    data
}

/// A constant field.
pub fn create_constant_grid(width: usize, height: usize, value: f32) -> Vec<f32> {
    vec![value; width * height]
}

/// Replace the given `(row, col)` cells with NaN.
pub fn with_missing(mut data: Vec<f32>, width: usize, cells: &[(usize, usize)]) -> Vec<f32> {
    for &(row, col) in cells {
        data[row * width + col] = f32::NAN;
    }
    data
}
