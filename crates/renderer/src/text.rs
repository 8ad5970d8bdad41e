//! Text rasterization for contour labels and pressure-center marks.
//!
//! Glyphs are rasterized with rusttype into a small sprite pixmap, which is
//! then composited onto the chart with an arbitrary rotation.

use rusttype::{point, Font, Scale};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

use crate::contour::Point;
use crate::error::{RenderError, RenderResult};

/// Embedded font data - DejaVu Sans, regular and bold
const REGULAR_FONT: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const BOLD_FONT: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");

/// The two faces used on a chart.
pub struct Fonts {
    pub regular: Font<'static>,
    pub bold: Font<'static>,
}

impl Fonts {
    pub fn load() -> RenderResult<Self> {
        let regular = Font::try_from_bytes(REGULAR_FONT)
            .ok_or_else(|| RenderError::Font("failed to parse DejaVuSans.ttf".to_string()))?;
        let bold = Font::try_from_bytes(BOLD_FONT)
            .ok_or_else(|| RenderError::Font("failed to parse DejaVuSans-Bold.ttf".to_string()))?;
        Ok(Self { regular, bold })
    }
}

/// Text rendered into its own transparent pixmap, cropped to the ink.
pub struct TextSprite {
    pixmap: Pixmap,
}

impl TextSprite {
    /// Rasterize `text` at `size_px` pixels per em in `color`.
    pub fn render(font: &Font<'_>, text: &str, size_px: f32, color: [u8; 4]) -> RenderResult<Self> {
        let scale = Scale::uniform(size_px);
        let v_metrics = font.v_metrics(scale);
        let glyphs: Vec<_> = font
            .layout(text, scale, point(0.0, v_metrics.ascent))
            .collect();

        let (min_x, min_y, max_x, max_y) = glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box())
            .fold(
                (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
                |(x0, y0, x1, y1), bb| {
                    (x0.min(bb.min.x), y0.min(bb.min.y), x1.max(bb.max.x), y1.max(bb.max.y))
                },
            );
        if min_x >= max_x || min_y >= max_y {
            return Err(RenderError::Font(format!("no visible glyphs in {:?}", text)));
        }

        let width = (max_x - min_x) as usize;
        let height = (max_y - min_y) as usize;
        let mut pixmap = Pixmap::new(width as u32, height as u32).ok_or_else(|| {
            RenderError::InvalidCanvas(format!("text sprite {}x{}", width, height))
        })?;

        let pixels = pixmap.pixels_mut();
        for glyph in &glyphs {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let x = (bb.min.x - min_x) as usize + gx as usize;
                let y = (bb.min.y - min_y) as usize + gy as usize;
                if x >= width || y >= height {
                    return;
                }
                let idx = y * width + x;
                let alpha = (coverage * color[3] as f32).round().clamp(0.0, 255.0) as u8;
                // Overlapping glyph edges keep the stronger coverage
                if alpha > pixels[idx].alpha() {
                    if let Some(px) = premultiply(color, alpha) {
                        pixels[idx] = px;
                    }
                }
            });
        }

        Ok(Self { pixmap })
    }

    pub fn width(&self) -> f32 {
        self.pixmap.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.pixmap.height() as f32
    }

    /// Composite the sprite centered on `center`, rotated by `angle_deg`.
    pub fn draw(&self, canvas: &mut Pixmap, center: Point, angle_deg: f32) {
        let transform = Transform::from_translate(center.x, center.y)
            .pre_rotate(angle_deg)
            .pre_translate(-self.width() / 2.0, -self.height() / 2.0);

        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };

        canvas.draw_pixmap(0, 0, self.pixmap.as_ref(), &paint, transform, None);
    }
}

fn premultiply(color: [u8; 4], alpha: u8) -> Option<PremultipliedColorU8> {
    let scale = |c: u8| ((c as u16 * alpha as u16 + 127) / 255) as u8;
    PremultipliedColorU8::from_rgba(scale(color[0]), scale(color[1]), scale(color[2]), alpha)
}
