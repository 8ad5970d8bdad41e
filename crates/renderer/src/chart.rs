//! Mean sea-level pressure chart: contour lines, inline labels and H/L marks
//! on a transparent canvas.

use std::collections::HashMap;
use std::path::Path;

use mslp_common::{DecodedField, GeoBounds, GridCell};
use rayon::prelude::*;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, info};

use crate::colormap::Colormap;
use crate::contour::{contour_levels, generate_contours, Point};
use crate::error::{RenderError, RenderResult};
use crate::extrema::find_extrema;
use crate::labels::{place_labels, split_at_gaps, LabelLayout, Occupied, Polyline};
use crate::png::create_png_auto;
use crate::text::{Fonts, TextSprite};

const LOW_COLOR: [u8; 4] = [0, 0, 255, 255];
const HIGH_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Figure and typography settings. Sizes are in points unless noted.
#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub dpi: f32,
    /// Figure width in inches
    pub figure_width: f32,
    /// Figure height in inches
    pub figure_height: f32,
    /// Contour interval in hPa
    pub interval: f32,
    pub line_width: f32,
    pub label_size: f32,
    pub marker_size: f32,
    /// Target distance between labels along one line
    pub label_spacing: f32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            dpi: 850.0,
            figure_width: 10.0,
            figure_height: 7.0,
            interval: 2.0,
            line_width: 1.0,
            label_size: 8.0,
            marker_size: 24.0,
            label_spacing: 216.0,
        }
    }
}

impl ChartOptions {
    /// Convert points to pixels at the configured DPI.
    pub fn px(&self, points: f32) -> f32 {
        points * self.dpi / 72.0
    }
}

/// An H or L mark and the grid cell it marks.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremumMark {
    pub cell: GridCell,
    /// Pressure in hPa
    pub value: f32,
    pub latitude: f64,
    pub longitude: f64,
    /// Mark center in output image pixels
    pub x: f32,
    pub y: f32,
}

/// A rendered chart, cropped to its content.
pub struct RenderedChart {
    width: u32,
    height: u32,
    /// Straight-alpha RGBA, row-major
    pixels: Vec<u8>,
    levels: Vec<f32>,
    low: ExtremumMark,
    high: ExtremumMark,
}

impl RenderedChart {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Contour levels drawn, ascending.
    pub fn levels(&self) -> &[f32] {
        &self.levels
    }

    pub fn low(&self) -> &ExtremumMark {
        &self.low
    }

    pub fn high(&self) -> &ExtremumMark {
        &self.high
    }

    /// RGBA of the pixel at `(x, y)`, if inside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        create_png_auto(&self.pixels, self.width as usize, self.height as usize)
    }

    pub fn write_png(&self, path: impl AsRef<Path>) -> RenderResult<()> {
        let png = self.encode_png()?;
        std::fs::write(path.as_ref(), &png)?;
        debug!(
            path = %path.as_ref().display(),
            bytes = png.len(),
            "Wrote chart PNG"
        );
        Ok(())
    }
}

/// Maps longitude and latitude onto the canvas.
///
/// Longitude runs left to right and latitude bottom to top, each scaled
/// linearly over the field's extent to fill the figure. A margin of one
/// marker size keeps H/L marks on the boundary on the canvas.
struct Canvas {
    width: u32,
    height: u32,
    pad: f32,
    bounds: GeoBounds,
    x_scale: f64,
    y_scale: f64,
}

impl Canvas {
    fn new(bounds: GeoBounds, options: &ChartOptions) -> RenderResult<Self> {
        let width = (options.figure_width * options.dpi).round();
        let height = (options.figure_height * options.dpi).round();
        let pad = options.px(options.marker_size).ceil();
        let usable_width = width - 2.0 * pad;
        let usable_height = height - 2.0 * pad;
        if !usable_width.is_finite()
            || !usable_height.is_finite()
            || usable_width <= 0.0
            || usable_height <= 0.0
        {
            return Err(RenderError::InvalidCanvas(format!(
                "figure {}x{} in at {} dpi leaves no drawing area",
                options.figure_width, options.figure_height, options.dpi
            )));
        }

        // NaN spans fail this too
        if !(bounds.lon_span() > 0.0 && bounds.lat_span() > 0.0) {
            return Err(RenderError::InvalidCanvas(format!(
                "field covers no area: lat {}..{}, lon {}..{}",
                bounds.lat_min, bounds.lat_max, bounds.lon_min, bounds.lon_max
            )));
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            pad,
            bounds,
            x_scale: usable_width as f64 / bounds.lon_span(),
            y_scale: usable_height as f64 / bounds.lat_span(),
        })
    }

    fn project(&self, latitude: f64, longitude: f64) -> Point {
        Point::new(
            self.pad + ((longitude - self.bounds.lon_min) * self.x_scale) as f32,
            self.pad + ((self.bounds.lat_max - latitude) * self.y_scale) as f32,
        )
    }

    /// Pixel position of a contour vertex given in grid space.
    fn grid_to_pixel(&self, field: &DecodedField, grid: Point) -> Point {
        let (latitude, longitude) = field.location_at(grid.x as f64, grid.y as f64);
        self.project(latitude, longitude)
    }

    fn cell_center(&self, field: &DecodedField, cell: GridCell) -> Point {
        let (latitude, longitude) = field.location(cell);
        self.project(latitude, longitude)
    }
}

/// Render a pressure field (hPa, row 0 north) into a chart.
pub fn render_chart(field: &DecodedField, options: &ChartOptions) -> RenderResult<RenderedChart> {
    let (grid_width, grid_height) = (field.width(), field.height());
    if grid_width < 2 || grid_height < 2 {
        return Err(RenderError::InvalidCanvas(format!(
            "grid {}x{} is too small to contour",
            grid_width, grid_height
        )));
    }

    let values = field.values();
    let extrema = find_extrema(values).ok_or(RenderError::EmptyField)?;
    let (min, max) = (values[extrema.min], values[extrema.max]);
    let levels = contour_levels(min, max, options.interval);
    if levels.is_empty() {
        return Err(RenderError::InvalidCanvas(format!(
            "contour interval {} yields no levels",
            options.interval
        )));
    }

    let canvas = Canvas::new(field.bounds(), options)?;
    let mut pixmap = Pixmap::new(canvas.width, canvas.height).ok_or_else(|| {
        RenderError::InvalidCanvas(format!("cannot allocate {}x{}", canvas.width, canvas.height))
    })?;

    debug!(
        grid_width,
        grid_height,
        canvas_width = canvas.width,
        canvas_height = canvas.height,
        min,
        max,
        levels = levels.len(),
        "Rendering chart"
    );

    let fonts = Fonts::load()?;
    let colormap = Colormap::coolwarm(levels[0], levels[levels.len() - 1]);

    // Marks go down last but claim their space before any label is placed
    let low_cell = field.cell_at(extrema.min);
    let high_cell = field.cell_at(extrema.max);
    let marker_px = options.px(options.marker_size);
    let low_sprite = TextSprite::render(&fonts.bold, "L", marker_px, LOW_COLOR)?;
    let high_sprite = TextSprite::render(&fonts.bold, "H", marker_px, HIGH_COLOR)?;
    let mut occupied: Occupied = vec![
        (canvas.cell_center(field, low_cell), marker_px * 0.75),
        (canvas.cell_center(field, high_cell), marker_px * 0.75),
    ];

    let label_px = options.px(options.label_size);
    let mut label_sprites: HashMap<u32, TextSprite> = HashMap::with_capacity(levels.len());
    for &level in &levels {
        let sprite =
            TextSprite::render(&fonts.regular, &format!("{:.0}", level), label_px, colormap.color(level))?;
        label_sprites.insert(level.to_bits(), sprite);
    }

    let layout = LabelLayout {
        spacing: options.px(options.label_spacing),
        padding: label_px * 0.25,
        canvas_width: canvas.width as f32,
        canvas_height: canvas.height as f32,
    };

    let mut stroke = Stroke::default();
    stroke.width = options.px(options.line_width);
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;

    let contours = generate_contours(values, grid_width, grid_height, &levels);
    let mut labels = Vec::new();

    for contour in &contours {
        let points: Vec<Point> = contour
            .points
            .iter()
            .map(|p| canvas.grid_to_pixel(field, *p))
            .collect();
        let line = Polyline::new(&points);
        let color = colormap.color(contour.level);

        let placements = match label_sprites.get(&contour.level.to_bits()) {
            Some(sprite) => place_labels(&line, sprite.width(), sprite.height(), &layout, &mut occupied),
            None => Vec::new(),
        };
        let gaps: Vec<(f32, f32)> = placements.iter().map(|p| p.gap).collect();

        let mut paint = Paint::default();
        paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
        paint.anti_alias = true;

        for piece in split_at_gaps(&line, &gaps, contour.closed) {
            let mut pb = PathBuilder::new();
            pb.move_to(piece[0].x, piece[0].y);
            for point in &piece[1..] {
                pb.line_to(point.x, point.y);
            }
            if contour.closed && gaps.is_empty() {
                pb.close();
            }
            if let Some(path) = pb.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }

        labels.extend(placements.into_iter().map(|p| (contour.level, p)));
    }

    for (level, placement) in &labels {
        if let Some(sprite) = label_sprites.get(&level.to_bits()) {
            sprite.draw(&mut pixmap, placement.center, placement.angle_deg);
        }
    }

    low_sprite.draw(&mut pixmap, canvas.cell_center(field, low_cell), 0.0);
    high_sprite.draw(&mut pixmap, canvas.cell_center(field, high_cell), 0.0);

    let (x0, y0, x1, y1) = content_bounds(&pixmap).ok_or(RenderError::EmptyField)?;
    let pixels = crop_demultiplied(&pixmap, x0, y0, x1, y1);
    drop(pixmap);

    let mark = |cell: GridCell| {
        let (latitude, longitude) = field.location(cell);
        let center = canvas.cell_center(field, cell);
        ExtremumMark {
            cell,
            value: field.value(cell),
            latitude,
            longitude,
            x: center.x - x0 as f32,
            y: center.y - y0 as f32,
        }
    };
    let low = mark(low_cell);
    let high = mark(high_cell);

    info!(
        width = x1 - x0,
        height = y1 - y0,
        contours = contours.len(),
        labels = labels.len(),
        low = low.value,
        high = high.value,
        "Rendered MSLP chart"
    );

    Ok(RenderedChart {
        width: x1 - x0,
        height: y1 - y0,
        pixels,
        levels,
        low,
        high,
    })
}

/// Bounding box `(x0, y0, x1, y1)` of non-transparent pixels, end-exclusive.
fn content_bounds(pixmap: &Pixmap) -> Option<(u32, u32, u32, u32)> {
    let width = pixmap.width() as usize;
    let rows: Vec<Option<(usize, usize)>> = pixmap
        .pixels()
        .par_chunks(width)
        .map(|row| {
            let first = row.iter().position(|p| p.alpha() > 0)?;
            let last = row.iter().rposition(|p| p.alpha() > 0)?;
            Some((first, last))
        })
        .collect();

    let y0 = rows.iter().position(Option::is_some)?;
    let y1 = rows.iter().rposition(Option::is_some)?;
    let (x0, x1) = rows
        .iter()
        .flatten()
        .fold((usize::MAX, 0), |(lo, hi), &(first, last)| (lo.min(first), hi.max(last)));

    Some((x0 as u32, y0 as u32, x1 as u32 + 1, y1 as u32 + 1))
}

/// Copy a region out of the pixmap as straight-alpha RGBA.
fn crop_demultiplied(pixmap: &Pixmap, x0: u32, y0: u32, x1: u32, y1: u32) -> Vec<u8> {
    let width = pixmap.width() as usize;
    let (x0, x1) = (x0 as usize, x1 as usize);
    pixmap
        .pixels()
        .par_chunks(width)
        .skip(y0 as usize)
        .take((y1 - y0) as usize)
        .flat_map_iter(|row| {
            row[x0..x1].iter().flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
        })
        .collect()
}
