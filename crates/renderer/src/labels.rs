//! Inline contour labels.
//!
//! Labels are placed along each contour in pixel space, rotated to follow
//! the line and kept upright. The line itself is cut where a label sits so
//! the text reads against a transparent background.

use crate::contour::Point;

/// A polyline with cumulative arc length for distance-based lookups.
pub struct Polyline<'a> {
    points: &'a [Point],
    cumulative: Vec<f32>,
}

impl<'a> Polyline<'a> {
    pub fn new(points: &'a [Point]) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, p) in points.iter().enumerate() {
            if i > 0 {
                total += points[i - 1].distance(*p);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point at arc length `s`, clamped to the ends.
    pub fn point_at(&self, s: f32) -> Point {
        if self.points.is_empty() {
            return Point::new(0.0, 0.0);
        }
        let idx = self.cumulative.partition_point(|&c| c < s);
        if idx == 0 {
            return self.points[0];
        }
        if idx >= self.points.len() {
            return self.points[self.points.len() - 1];
        }

        let (a, b) = (self.points[idx - 1], self.points[idx]);
        let seg = self.cumulative[idx] - self.cumulative[idx - 1];
        if seg <= 0.0 {
            return b;
        }
        let t = (s - self.cumulative[idx - 1]) / seg;
        Point::new(a.x + t * (b.x - a.x), a.y + t * (b.y - a.y))
    }

    /// The part of the line between arc lengths `from` and `to`.
    pub fn sub_path(&self, from: f32, to: f32) -> Vec<Point> {
        let mut out = vec![self.point_at(from)];
        out.extend(
            self.points
                .iter()
                .zip(&self.cumulative)
                .filter(|(_, c)| **c > from && **c < to)
                .map(|(p, _)| *p),
        );
        out.push(self.point_at(to));
        out
    }
}

/// Spacing and clearance rules for label placement, in pixels.
#[derive(Debug, Clone)]
pub struct LabelLayout {
    /// Target distance between labels on the same line
    pub spacing: f32,
    /// Line cleared on each side of the text
    pub padding: f32,
    pub canvas_width: f32,
    pub canvas_height: f32,
}

/// A label accepted on a contour.
#[derive(Debug, Clone)]
pub struct LabelPlacement {
    pub center: Point,
    /// Rotation in degrees, always within [-90, 90]
    pub angle_deg: f32,
    /// Arc-length interval removed from the line
    pub gap: (f32, f32),
}

/// Space already claimed by text: center and clearance radius.
pub type Occupied = Vec<(Point, f32)>;

/// Choose label positions along one contour.
///
/// Every line long enough to carry its label gets at least one; longer
/// lines get one per `spacing`. Candidates that would leave the canvas or
/// collide with text in `occupied` are dropped, and accepted labels are
/// added to `occupied`.
pub fn place_labels(
    line: &Polyline<'_>,
    label_width: f32,
    label_height: f32,
    layout: &LabelLayout,
    occupied: &mut Occupied,
) -> Vec<LabelPlacement> {
    let length = line.length();
    let gap_len = label_width + 2.0 * layout.padding;
    if length < gap_len * 1.5 {
        return vec![];
    }

    let count = ((length / layout.spacing.max(1.0)).floor() as usize).max(1);
    let radius = (label_width.powi(2) + label_height.powi(2)).sqrt() / 2.0;

    let mut placements = Vec::new();
    for k in 0..count {
        let s = length * (k as f32 + 0.5) / count as f32;
        let (start, end) = (s - gap_len / 2.0, s + gap_len / 2.0);
        if start < 0.0 || end > length {
            continue;
        }

        let center = line.point_at(s);
        if center.x - radius < 0.0
            || center.y - radius < 0.0
            || center.x + radius > layout.canvas_width
            || center.y + radius > layout.canvas_height
        {
            continue;
        }

        if occupied
            .iter()
            .any(|(p, r)| p.distance(center) < r + radius)
        {
            continue;
        }

        let (a, b) = (line.point_at(start), line.point_at(end));
        let angle_deg = upright((b.y - a.y).atan2(b.x - a.x).to_degrees());

        occupied.push((center, radius));
        placements.push(LabelPlacement {
            center,
            angle_deg,
            gap: (start, end),
        });
    }

    placements
}

/// Flip an angle so the text is never upside down
fn upright(angle: f32) -> f32 {
    if angle > 90.0 {
        angle - 180.0
    } else if angle < -90.0 {
        angle + 180.0
    } else {
        angle
    }
}

/// Split a line into the visible pieces left after cutting out `gaps`.
///
/// `gaps` must be sorted and non-overlapping. For closed lines the piece
/// that wraps past the starting point is joined into one.
pub fn split_at_gaps(line: &Polyline<'_>, gaps: &[(f32, f32)], closed: bool) -> Vec<Vec<Point>> {
    if gaps.is_empty() {
        return vec![line.points.to_vec()];
    }

    let length = line.length();
    let mut pieces = Vec::with_capacity(gaps.len() + 1);

    for pair in gaps.windows(2) {
        pieces.push(line.sub_path(pair[0].1, pair[1].0));
    }

    let (first, last) = (gaps[0], gaps[gaps.len() - 1]);
    if closed {
        let mut wrap = line.sub_path(last.1, length);
        let head = line.sub_path(0.0, first.0);
        wrap.extend(head.into_iter().skip(1));
        pieces.push(wrap);
    } else {
        pieces.insert(0, line.sub_path(0.0, first.0));
        pieces.push(line.sub_path(last.1, length));
    }

    pieces.retain(|p| p.len() >= 2 && Polyline::new(p).length() > 0.0);
    pieces
}
