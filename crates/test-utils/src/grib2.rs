//! Synthetic GRIB2 messages.
//!
//! Builds minimal but structurally valid GRIB2 messages: simple packing
//! (template 5.0) at 16 bits per value, grid template 3.0 or 3.30, product
//! template 4.0. NaN values are encoded through a bitmap (section 6).

/// Grid layout of a built message.
#[derive(Debug, Clone)]
enum GridLayout {
    /// Template 3.0. Angles in microdegrees.
    LatLon {
        la1: i32,
        lo1: i32,
        la2: i32,
        lo2: i32,
        di: u32,
        dj: u32,
    },
    /// Template 3.30. Angles in microdegrees, spacing in millimetres.
    Lambert {
        la1: i32,
        lo1: i32,
        lov: i32,
        latin1: i32,
        latin2: i32,
        dx: u32,
        dy: u32,
    },
    /// Polar stereographic header with only dimensions filled in.
    PolarStereographic,
}

/// Builder for one GRIB2 message.
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    center: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    ni: u32,
    nj: u32,
    layout: GridLayout,
    scanning_mode: u8,
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: u32,
    forecast_hour: u32,
    data_values: Vec<f32>,
}

impl Grib2Builder {
    /// MSLMA at mean sea level on a 1-degree lat/lon grid starting at
    /// 50N 250E, scanning north to south.
    pub fn mslma_latlon(ni: u32, nj: u32) -> Self {
        let la1 = 50_000_000;
        let lo1 = 250_000_000;
        Self::mslma(
            ni,
            nj,
            GridLayout::LatLon {
                la1,
                lo1,
                la2: la1 - (nj as i32 - 1) * 1_000_000,
                lo2: lo1 + (ni as i32 - 1) * 1_000_000,
                di: 1_000_000,
                dj: 1_000_000,
            },
            0x00,
        )
    }

    /// MSLMA at mean sea level on the south-west corner of the HRRR Lambert
    /// grid, scanning south to north as HRRR does.
    pub fn mslma_lambert(nx: u32, ny: u32) -> Self {
        Self::mslma(
            nx,
            ny,
            GridLayout::Lambert {
                la1: 21_138_123,
                lo1: 237_280_472,
                lov: 262_500_000,
                latin1: 38_500_000,
                latin2: 38_500_000,
                dx: 3_000_000,
                dy: 3_000_000,
            },
            0x40,
        )
    }

    fn mslma(ni: u32, nj: u32, layout: GridLayout, scanning_mode: u8) -> Self {
        Self {
            discipline: 0,
            center: 7,
            year: 2024,
            month: 6,
            day: 15,
            hour: 12,
            ni,
            nj,
            layout,
            scanning_mode,
            param_category: 3,
            param_number: 198,
            level_type: 101,
            level_value: 0,
            forecast_hour: 0,
            data_values: vec![101_325.0; (ni * nj) as usize],
        }
    }

    /// Switch to an unsupported grid template (3.20) with the same size.
    pub fn with_polar_stereographic_grid(mut self) -> Self {
        self.layout = GridLayout::PolarStereographic;
        self
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    pub fn with_scanning_mode(mut self, scanning_mode: u8) -> Self {
        self.scanning_mode = scanning_mode;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: u32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self
    }

    /// Values in scan order, NaN for missing points.
    pub fn with_data(mut self, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), (self.ni * self.nj) as usize, "data size");
        self.data_values = data;
        self
    }

    /// Build the complete GRIB2 message bytes.
    pub fn build(&self) -> Vec<u8> {
        let sections = [
            self.build_section1(),
            self.build_section3(),
            self.build_section4(),
            self.build_section5(),
            self.build_section6(),
            self.build_section7(),
        ];

        let message_length = 16 + sections.iter().map(Vec::len).sum::<usize>() + 4;

        let mut message = Vec::with_capacity(message_length);
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(self.discipline);
        message.push(2);
        message.extend_from_slice(&(message_length as u64).to_be_bytes());
        for section in &sections {
            message.extend_from_slice(section);
        }
        message.extend_from_slice(b"7777");

        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.center.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-center
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Start of forecast

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(0);
        section.push(0);

        section.push(0); // Operational
        section.push(1); // Forecast

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let (template, gd) = match &self.layout {
            GridLayout::LatLon {
                la1,
                lo1,
                la2,
                lo2,
                di,
                dj,
            } => {
                let mut gd = self.earth_and_dims();
                gd.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
                gd.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // Subdivisions
                gd.extend_from_slice(&encode_signed(*la1));
                gd.extend_from_slice(&encode_signed(*lo1));
                gd.push(48); // Resolution and component flags
                gd.extend_from_slice(&encode_signed(*la2));
                gd.extend_from_slice(&encode_signed(*lo2));
                gd.extend_from_slice(&di.to_be_bytes());
                gd.extend_from_slice(&dj.to_be_bytes());
                gd.push(self.scanning_mode);
                (0u16, gd)
            }
            GridLayout::Lambert {
                la1,
                lo1,
                lov,
                latin1,
                latin2,
                dx,
                dy,
            } => {
                let mut gd = self.earth_and_dims();
                gd.extend_from_slice(&encode_signed(*la1));
                gd.extend_from_slice(&encode_signed(*lo1));
                gd.push(8); // Resolution and component flags
                gd.extend_from_slice(&encode_signed(*latin1)); // LaD
                gd.extend_from_slice(&encode_signed(*lov));
                gd.extend_from_slice(&dx.to_be_bytes());
                gd.extend_from_slice(&dy.to_be_bytes());
                gd.push(0); // Projection centre: north pole
                gd.push(self.scanning_mode);
                gd.extend_from_slice(&encode_signed(*latin1));
                gd.extend_from_slice(&encode_signed(*latin2));
                gd.extend_from_slice(&encode_signed(-90_000_000)); // Southern pole
                gd.extend_from_slice(&encode_signed(0));
                (30u16, gd)
            }
            GridLayout::PolarStereographic => {
                let mut gd = self.earth_and_dims();
                gd.extend_from_slice(&[0u8; 41]);
                (20u16, gd)
            }
        };

        let mut section = Vec::new();
        section.extend_from_slice(&(14 + gd.len() as u32).to_be_bytes());
        section.push(3);
        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0);
        section.push(0);
        section.extend_from_slice(&template.to_be_bytes());
        section.extend_from_slice(&gd);

        section
    }

    /// Earth shape block followed by the two grid dimensions (24 bytes).
    fn earth_and_dims(&self) -> Vec<u8> {
        let mut gd = Vec::with_capacity(67);
        gd.push(6); // Spherical earth, radius 6371229 m
        gd.push(0);
        gd.extend_from_slice(&0u32.to_be_bytes());
        gd.push(0);
        gd.extend_from_slice(&0u32.to_be_bytes());
        gd.push(0);
        gd.extend_from_slice(&0u32.to_be_bytes());
        gd.extend_from_slice(&self.ni.to_be_bytes());
        gd.extend_from_slice(&self.nj.to_be_bytes());
        gd
    }

    fn build_section4(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // Coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0

        section.push(self.param_category);
        section.push(self.param_number);
        section.push(2); // Forecast
        section.push(0);
        section.push(83); // HRRR generating process
        section.extend_from_slice(&0u16.to_be_bytes());
        section.push(0);
        section.push(1); // Hours
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());

        section.push(self.level_type);
        section.push(0);
        section.extend_from_slice(&self.level_value.to_be_bytes());

        section.push(255); // No second surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn present_values(&self) -> Vec<f32> {
        self.data_values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .collect()
    }

    fn packing(&self) -> Packing {
        let present = self.present_values();
        let (min, max) = present.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), &v| (min.min(v as f64), max.max(v as f64)),
        );
        if present.is_empty() {
            return Packing {
                reference: 0.0,
                binary_scale_factor: 0,
                bits_per_value: 0,
            };
        }

        let range = max - min;
        if range == 0.0 {
            return Packing {
                reference: min as f32,
                binary_scale_factor: 0,
                bits_per_value: 0,
            };
        }

        // packed = (value - R) / 2^E must fit in 16 bits
        Packing {
            reference: min as f32,
            binary_scale_factor: (range / 65535.0).log2().ceil() as i16,
            bits_per_value: 16,
        }
    }

    fn build_section5(&self) -> Vec<u8> {
        let packing = self.packing();

        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5);

        section.extend_from_slice(&(self.present_values().len() as u32).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0

        section.extend_from_slice(&packing.reference.to_be_bytes());
        section.extend_from_slice(&encode_signed_i16(packing.binary_scale_factor));
        section.extend_from_slice(&encode_signed_i16(0)); // Decimal scale factor
        section.push(packing.bits_per_value);
        section.push(0); // Floating point

        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();

        if !self.data_values.iter().any(|v| v.is_nan()) {
            section.extend_from_slice(&6u32.to_be_bytes());
            section.push(6);
            section.push(255);
            return section;
        }

        let mut bitmap = vec![0u8; (self.data_values.len() + 7) / 8];
        for (i, v) in self.data_values.iter().enumerate() {
            if !v.is_nan() {
                bitmap[i / 8] |= 0x80 >> (i % 8);
            }
        }

        section.extend_from_slice(&(6 + bitmap.len() as u32).to_be_bytes());
        section.push(6);
        section.push(0);
        section.extend_from_slice(&bitmap);
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let packing = self.packing();
        let mut packed = Vec::new();

        if packing.bits_per_value == 16 {
            let scale = 2.0_f64.powi(packing.binary_scale_factor as i32);
            for v in self.present_values() {
                let x = ((v as f64 - packing.reference as f64) / scale)
                    .round()
                    .clamp(0.0, 65535.0) as u16;
                packed.extend_from_slice(&x.to_be_bytes());
            }
        }

        let mut section = Vec::new();
        section.extend_from_slice(&(5 + packed.len() as u32).to_be_bytes());
        section.push(7);
        section.extend_from_slice(&packed);
        section
    }
}

struct Packing {
    reference: f32,
    binary_scale_factor: i16,
    bits_per_value: u8,
}

/// GRIB2 sign-magnitude encoding of a 32-bit integer.
pub fn encode_signed(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 {
        magnitude | 0x8000_0000
    } else {
        magnitude
    };
    raw.to_be_bytes()
}

/// GRIB2 sign-magnitude encoding of a 16-bit integer.
pub fn encode_signed_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_latlon_message() {
        let data = Grib2Builder::mslma_latlon(4, 3).build();

        assert_eq!(&data[0..4], b"GRIB");
        assert_eq!(data[7], 2);
        assert_eq!(&data[data.len() - 4..], b"7777");
        assert_eq!(
            u64::from_be_bytes(data[8..16].try_into().unwrap()) as usize,
            data.len()
        );
    }

    #[test]
    fn test_lambert_section_length() {
        let data = Grib2Builder::mslma_lambert(5, 4).build();
        // Section 3 follows the 16-byte indicator and the 21-byte section 1
        let len = u32::from_be_bytes(data[37..41].try_into().unwrap());
        assert_eq!(data[41], 3);
        assert_eq!(len, 81);
    }

    #[test]
    fn test_bitmap_only_for_missing_values() {
        let values: Vec<f32> = (0..9).map(|i| 100_000.0 + i as f32 * 10.0).collect();
        let full = Grib2Builder::mslma_latlon(3, 3).with_data(values.clone()).build();

        let mut masked_values = values;
        masked_values[4] = f32::NAN;
        let masked = Grib2Builder::mslma_latlon(3, 3).with_data(masked_values).build();

        // Two bitmap bytes added, one 16-bit value dropped
        assert_eq!(masked.len(), full.len());
        assert_ne!(masked, full);
    }

    #[test]
    fn test_sign_magnitude() {
        assert_eq!(encode_signed(-5), [0x80, 0, 0, 5]);
        assert_eq!(encode_signed(5), [0, 0, 0, 5]);
        assert_eq!(encode_signed_i16(-3), [0x80, 3]);
    }
}
