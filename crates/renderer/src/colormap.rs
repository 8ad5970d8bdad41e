//! Diverging cool-to-warm color scale for contour lines.

/// Anchor colors of the cool-to-warm scale, evenly spaced over `[0, 1]`.
const COOLWARM: [[u8; 3]; 9] = [
    [59, 76, 192],
    [98, 130, 234],
    [141, 176, 254],
    [184, 208, 249],
    [221, 221, 221],
    [245, 196, 173],
    [244, 154, 123],
    [222, 96, 77],
    [180, 4, 38],
];

/// A color scale normalized over a value range.
#[derive(Debug, Clone, Copy)]
pub struct Colormap {
    stops: &'static [[u8; 3]],
    min: f32,
    max: f32,
}

impl Colormap {
    /// Blue at `min` through light grey to red at `max`.
    pub fn coolwarm(min: f32, max: f32) -> Self {
        Self {
            stops: &COOLWARM,
            min,
            max,
        }
    }

    /// Opaque RGBA color for `value`; values outside the range are clamped.
    pub fn color(&self, value: f32) -> [u8; 4] {
        let t = if self.max > self.min {
            ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
        } else {
            0.5
        };

        let segments = (self.stops.len() - 1) as f32;
        let pos = t * segments;
        let i = (pos.floor() as usize).min(self.stops.len() - 2);
        let frac = pos - i as f32;

        let (a, b) = (self.stops[i], self.stops[i + 1]);
        let lerp = |c: usize| (a[c] as f32 + (b[c] as f32 - a[c] as f32) * frac).round() as u8;

        [lerp(0), lerp(1), lerp(2), 255]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        let cmap = Colormap::coolwarm(998.0, 1034.0);
        assert_eq!(cmap.color(998.0), [59, 76, 192, 255]);
        assert_eq!(cmap.color(1034.0), [180, 4, 38, 255]);
        assert_eq!(cmap.color(1016.0), [221, 221, 221, 255]);
    }

    #[test]
    fn test_clamped_outside_range() {
        let cmap = Colormap::coolwarm(0.0, 10.0);
        assert_eq!(cmap.color(-5.0), cmap.color(0.0));
        assert_eq!(cmap.color(50.0), cmap.color(10.0));
    }

    #[test]
    fn test_cool_to_warm() {
        let cmap = Colormap::coolwarm(0.0, 1.0);
        let cool = cmap.color(0.2);
        let warm = cmap.color(0.8);
        assert!(cool[2] > cool[0]);
        assert!(warm[0] > warm[2]);
    }

    #[test]
    fn test_degenerate_range_is_midpoint() {
        let cmap = Colormap::coolwarm(5.0, 5.0);
        assert_eq!(cmap.color(5.0), [221, 221, 221, 255]);
    }
}
