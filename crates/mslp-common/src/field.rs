//! Decoded 2-D fields and their geographic coordinates.

use crate::error::{CommonError, CommonResult};

/// Index of a single grid cell. Row 0 is the northernmost row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub row: usize,
    pub col: usize,
}

impl GridCell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Geographic coordinates of every cell of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum GridCoordinates {
    /// Regular lat/lon grid: one latitude per row, one longitude per column.
    /// The field shape is the outer product of the two axes.
    Regular {
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
    },
    /// Projected grid (e.g. Lambert conformal): per-cell coordinates in the
    /// same row-major order as the field values.
    Curvilinear {
        latitudes: Vec<f64>,
        longitudes: Vec<f64>,
    },
}

impl GridCoordinates {
    fn validate(&self, width: usize, height: usize) -> CommonResult<()> {
        match self {
            Self::Regular {
                latitudes,
                longitudes,
            } => {
                if latitudes.len() != height || longitudes.len() != width {
                    return Err(CommonError::CoordinateShape(format!(
                        "{} latitudes x {} longitudes for a {}x{} grid",
                        latitudes.len(),
                        longitudes.len(),
                        width,
                        height
                    )));
                }
            }
            Self::Curvilinear {
                latitudes,
                longitudes,
            } => {
                let cells = width * height;
                if latitudes.len() != cells || longitudes.len() != cells {
                    return Err(CommonError::CoordinateShape(format!(
                        "{} latitudes / {} longitudes for {} cells",
                        latitudes.len(),
                        longitudes.len(),
                        cells
                    )));
                }
            }
        }
        Ok(())
    }

    /// (latitude, longitude) of a cell in degrees.
    fn location(&self, cell: GridCell, width: usize) -> (f64, f64) {
        match self {
            Self::Regular {
                latitudes,
                longitudes,
            } => (latitudes[cell.row], longitudes[cell.col]),
            Self::Curvilinear {
                latitudes,
                longitudes,
            } => {
                let idx = cell.row * width + cell.col;
                (latitudes[idx], longitudes[idx])
            }
        }
    }

    fn flip_rows(&mut self, width: usize) {
        match self {
            Self::Regular { latitudes, .. } => latitudes.reverse(),
            Self::Curvilinear {
                latitudes,
                longitudes,
            } => {
                reverse_rows(latitudes, width);
                reverse_rows(longitudes, width);
            }
        }
    }
}

/// Geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GeoBounds {
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }
}

/// A decoded scalar field in row-major order.
#[derive(Debug, Clone)]
pub struct DecodedField {
    values: Vec<f32>,
    width: usize,
    height: usize,
    coordinates: GridCoordinates,
}

impl DecodedField {
    /// Create a field, checking that values and coordinates match the shape.
    pub fn new(
        values: Vec<f32>,
        width: usize,
        height: usize,
        coordinates: GridCoordinates,
    ) -> CommonResult<Self> {
        if values.len() != width * height {
            return Err(CommonError::FieldShape {
                values: values.len(),
                width,
                height,
            });
        }
        coordinates.validate(width, height)?;

        Ok(Self {
            values,
            width,
            height,
            coordinates,
        })
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn coordinates(&self) -> &GridCoordinates {
        &self.coordinates
    }

    pub fn value(&self, cell: GridCell) -> f32 {
        self.values[cell.row * self.width + cell.col]
    }

    /// (latitude, longitude) of a cell in degrees.
    pub fn location(&self, cell: GridCell) -> (f64, f64) {
        self.coordinates.location(cell, self.width)
    }

    /// Cell for a row-major index.
    pub fn cell_at(&self, index: usize) -> GridCell {
        GridCell::new(index / self.width, index % self.width)
    }

    /// (latitude, longitude) at a fractional grid position.
    ///
    /// `x` is the column and `y` the row. Coordinates are interpolated
    /// bilinearly between the four surrounding cells; positions outside the
    /// grid are clamped to its edge.
    pub fn location_at(&self, x: f64, y: f64) -> (f64, f64) {
        let col = (x.max(0.0).floor() as usize).min(self.width.saturating_sub(2));
        let row = (y.max(0.0).floor() as usize).min(self.height.saturating_sub(2));
        let right = (col + 1).min(self.width.saturating_sub(1));
        let below = (row + 1).min(self.height.saturating_sub(1));
        let tx = (x - col as f64).clamp(0.0, 1.0);
        let ty = (y - row as f64).clamp(0.0, 1.0);

        let (lat00, lon00) = self.location(GridCell::new(row, col));
        let (lat01, lon01) = self.location(GridCell::new(row, right));
        let (lat10, lon10) = self.location(GridCell::new(below, col));
        let (lat11, lon11) = self.location(GridCell::new(below, right));

        let blend = |v00: f64, v01: f64, v10: f64, v11: f64| {
            let top = v00 + (v01 - v00) * tx;
            let bottom = v10 + (v11 - v10) * tx;
            top + (bottom - top) * ty
        };
        (blend(lat00, lat01, lat10, lat11), blend(lon00, lon01, lon10, lon11))
    }

    /// Latitude and longitude extent of all cells.
    pub fn bounds(&self) -> GeoBounds {
        let (latitudes, longitudes) = match &self.coordinates {
            GridCoordinates::Regular {
                latitudes,
                longitudes,
            }
            | GridCoordinates::Curvilinear {
                latitudes,
                longitudes,
            } => (latitudes, longitudes),
        };
        let extent = |axis: &[f64]| {
            axis.iter()
                .filter(|v| v.is_finite())
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };
        let (lat_min, lat_max) = extent(latitudes);
        let (lon_min, lon_max) = extent(longitudes);
        GeoBounds {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Divide every value, e.g. by 100 to go from Pa to hPa.
    pub fn divide_values(&mut self, divisor: f32) {
        for v in &mut self.values {
            *v /= divisor;
        }
    }

    /// Reverse the row order of values and coordinates.
    pub fn flip_rows(&mut self) {
        reverse_rows(&mut self.values, self.width);
        self.coordinates.flip_rows(self.width);
    }
}

fn reverse_rows<T>(data: &mut [T], width: usize) {
    if width == 0 {
        return;
    }
    let height = data.len() / width;
    for row in 0..height / 2 {
        let (top, bottom) = data.split_at_mut((height - 1 - row) * width);
        top[row * width..(row + 1) * width].swap_with_slice(&mut bottom[..width]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(width: usize, height: usize) -> GridCoordinates {
        GridCoordinates::Regular {
            latitudes: (0..height).map(|r| 50.0 - r as f64).collect(),
            longitudes: (0..width).map(|c| -100.0 + c as f64).collect(),
        }
    }

    #[test]
    fn test_new_validates_values() {
        let result = DecodedField::new(vec![0.0; 5], 3, 2, regular(3, 2));
        assert!(matches!(result, Err(CommonError::FieldShape { .. })));
    }

    #[test]
    fn test_new_validates_regular_axes() {
        let result = DecodedField::new(vec![0.0; 6], 3, 2, regular(2, 3));
        assert!(matches!(result, Err(CommonError::CoordinateShape(_))));
    }

    #[test]
    fn test_new_validates_curvilinear() {
        let coords = GridCoordinates::Curvilinear {
            latitudes: vec![0.0; 6],
            longitudes: vec![0.0; 5],
        };
        assert!(DecodedField::new(vec![0.0; 6], 3, 2, coords).is_err());
    }

    #[test]
    fn test_location_regular() {
        let field = DecodedField::new(vec![0.0; 12], 4, 3, regular(4, 3)).unwrap();
        assert_eq!(field.location(GridCell::new(2, 1)), (48.0, -99.0));
    }

    #[test]
    fn test_location_at_interpolates() {
        let field = DecodedField::new(vec![0.0; 12], 4, 3, regular(4, 3)).unwrap();

        assert_eq!(field.location_at(1.0, 2.0), (48.0, -99.0));
        assert_eq!(field.location_at(1.5, 0.25), (49.75, -98.5));
        // Last column and row sit on the far edge of the last cell
        assert_eq!(field.location_at(3.0, 2.0), (48.0, -97.0));
        assert_eq!(field.location_at(5.0, -1.0), (50.0, -97.0));
    }

    #[test]
    fn test_location_at_curvilinear() {
        // Longitude sheared by row, latitude by column
        let coords = GridCoordinates::Curvilinear {
            latitudes: vec![40.0, 41.0, 38.0, 39.0],
            longitudes: vec![-100.0, -98.0, -99.0, -97.0],
        };
        let field = DecodedField::new(vec![0.0; 4], 2, 2, coords).unwrap();

        let (lat, lon) = field.location_at(0.5, 0.5);
        assert!((lat - 39.5).abs() < 1e-12);
        assert!((lon - -98.5).abs() < 1e-12);

        let (lat, lon) = field.location_at(0.0, 0.5);
        assert!((lat - 39.0).abs() < 1e-12);
        assert!((lon - -99.5).abs() < 1e-12);
    }

    #[test]
    fn test_bounds() {
        let field = DecodedField::new(vec![0.0; 12], 4, 3, regular(4, 3)).unwrap();
        let bounds = field.bounds();
        assert_eq!(
            bounds,
            GeoBounds {
                lat_min: 48.0,
                lat_max: 50.0,
                lon_min: -100.0,
                lon_max: -97.0,
            }
        );
        assert_eq!(bounds.lat_span(), 2.0);
        assert_eq!(bounds.lon_span(), 3.0);

        let coords = GridCoordinates::Curvilinear {
            latitudes: vec![21.1, 21.5, 47.8, 52.6],
            longitudes: vec![-122.7, -72.3, -134.1, -60.9],
        };
        let field = DecodedField::new(vec![0.0; 4], 2, 2, coords).unwrap();
        assert_eq!(
            field.bounds(),
            GeoBounds {
                lat_min: 21.1,
                lat_max: 52.6,
                lon_min: -134.1,
                lon_max: -60.9,
            }
        );
    }

    #[test]
    fn test_divide_values() {
        let mut field =
            DecodedField::new(vec![101325.0, 99800.0], 2, 1, regular(2, 1)).unwrap();
        field.divide_values(100.0);
        assert!((field.values()[0] - 1013.25).abs() < 1e-3);
        assert!((field.values()[1] - 998.0).abs() < 1e-3);
    }

    #[test]
    fn test_flip_rows() {
        let coords = GridCoordinates::Curvilinear {
            latitudes: vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0],
            longitudes: vec![10.0, 11.0, 10.0, 11.0, 10.0, 11.0],
        };
        let mut field =
            DecodedField::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3, coords).unwrap();
        field.flip_rows();

        assert_eq!(field.values(), &[5.0, 6.0, 3.0, 4.0, 1.0, 2.0]);
        assert_eq!(field.location(GridCell::new(0, 1)), (3.0, 11.0));
        assert_eq!(field.location(GridCell::new(2, 0)), (1.0, 10.0));
    }

    #[test]
    fn test_cell_at() {
        let field = DecodedField::new(vec![0.0; 12], 4, 3, regular(4, 3)).unwrap();
        assert_eq!(field.cell_at(6), GridCell::new(1, 2));
    }
}
