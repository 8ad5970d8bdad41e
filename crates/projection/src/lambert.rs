//! Lambert Conformal Conic projection.
//!
//! HRRR publishes its CONUS output on a Lambert conformal grid. GRIB2
//! describes such a grid (template 3.30) by its first grid point, the
//! orientation meridian (LoV), one or two standard parallels and the grid
//! spacing in meters. This module turns grid indices into latitude and
//! longitude.
//!
//! Grid indices follow GRIB2 conventions: `i` grows eastward along a row and
//! `j` grows northward, with `(0, 0)` at the first grid point.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

/// Grid description in degrees and meters, as carried in GRIB2 template 3.30.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertParameters {
    /// Latitude of the first grid point
    pub lat1: f64,
    /// Longitude of the first grid point
    pub lon1: f64,
    /// Orientation meridian (LoV)
    pub lov: f64,
    pub latin1: f64,
    pub latin2: f64,
    /// Grid spacing along i, meters
    pub dx: f64,
    /// Grid spacing along j, meters
    pub dy: f64,
    pub nx: usize,
    pub ny: usize,
    pub earth_radius: f64,
}

/// Lambert Conformal Conic projection bound to a grid.
#[derive(Debug, Clone)]
pub struct LambertConformal {
    params: LambertParameters,
    /// Central meridian in radians
    lon0: f64,
    /// Cone constant
    n: f64,
    f: f64,
    /// Rho at the first grid point
    rho0: f64,
    /// Projected position of the first grid point
    x0: f64,
    y0: f64,
}

impl LambertConformal {
    pub fn new(params: LambertParameters) -> Self {
        let lat1 = params.lat1.to_radians();
        let lon1 = params.lon1.to_radians();
        let lon0 = params.lov.to_radians();
        let latin1 = params.latin1.to_radians();
        let latin2 = params.latin2.to_radians();

        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone
            latin1.sin()
        } else {
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio =
                ((FRAC_PI_4 + latin2 / 2.0).tan() / (FRAC_PI_4 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        let f = latin1.cos() * (FRAC_PI_4 + latin1 / 2.0).tan().powf(n) / n;
        let rho0 = params.earth_radius * f / (FRAC_PI_4 + lat1 / 2.0).tan().powf(n);

        let theta0 = n * wrap_radians(lon1 - lon0);
        let x0 = rho0 * theta0.sin();
        let y0 = rho0 - rho0 * theta0.cos();

        Self {
            params,
            lon0,
            n,
            f,
            rho0,
            x0,
            y0,
        }
    }

    /// Grid dimensions `(nx, ny)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.params.nx, self.params.ny)
    }

    /// Grid indices to `(lat, lon)` in degrees, longitude in `[-180, 180)`.
    pub fn grid_to_geo(&self, i: f64, j: f64) -> (f64, f64) {
        let x = self.x0 + i * self.params.dx;
        let y = self.y0 + j * self.params.dy;

        let rho = (x * x + (self.rho0 - y) * (self.rho0 - y)).sqrt();
        let rho = if self.n < 0.0 { -rho } else { rho };
        let theta = (x / (self.rho0 - y)).atan();

        let lat = 2.0 * (self.params.earth_radius * self.f / rho).powf(1.0 / self.n).atan()
            - FRAC_PI_2;
        let lon = self.lon0 + theta / self.n;

        (lat.to_degrees(), normalize_longitude(lon.to_degrees()))
    }

    /// Latitude and longitude of every grid point, row-major with `j`
    /// (south to north) as the outer index.
    pub fn cell_coordinates(&self) -> (Vec<f64>, Vec<f64>) {
        let (nx, ny) = self.dimensions();
        let mut lats = Vec::with_capacity(nx * ny);
        let mut lons = Vec::with_capacity(nx * ny);

        for j in 0..ny {
            for i in 0..nx {
                let (lat, lon) = self.grid_to_geo(i as f64, j as f64);
                lats.push(lat);
                lons.push(lon);
            }
        }

        (lats, lons)
    }
}

/// Map a longitude in degrees into `[-180, 180)`.
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

fn wrap_radians(mut angle: f64) -> f64 {
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
