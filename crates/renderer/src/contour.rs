//! Contour line (isoline) extraction using the marching squares algorithm.
//!
//! Contours are produced in grid space: `x` is the column and `y` the row of
//! the input field, so row 0 is the top of the chart.

use rayon::prelude::*;
use std::collections::HashMap;

/// A point in grid (or, after scaling, pixel) coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// A grid edge crossed by a contour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    /// Between `(row, col)` and `(row, col + 1)`
    Horizontal { row: usize, col: usize },
    /// Between `(row, col)` and `(row + 1, col)`
    Vertical { row: usize, col: usize },
}

/// A line segment inside one grid cell.
///
/// Both endpoints lie on cell edges; neighbouring cells that cross the same
/// edge share the identical endpoint.
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
    pub start_edge: Edge,
    pub end_edge: Edge,
}

/// A complete contour line (polyline).
///
/// Closed contours repeat their first point at the end.
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// Contour levels for a field spanning `min..=max`.
///
/// Levels start at `floor(min)` and step by `interval` while they do not
/// exceed `max`; one further level above the maximum closes the set.
pub fn contour_levels(min: f32, max: f32, interval: f32) -> Vec<f32> {
    if interval <= 0.0 || !min.is_finite() || !max.is_finite() || max < min {
        return vec![];
    }

    let start = min.floor() as f64;
    let interval = interval as f64;
    let max = max as f64;

    let mut levels = Vec::new();
    for k in 0.. {
        let level = start + k as f64 * interval;
        levels.push(level as f32);
        if level > max {
            break;
        }
    }
    levels
}

/// Marching squares over a row-major grid for a single level.
///
/// Cells with a NaN corner produce no segments.
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0u8;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            if cell_index == 0 || cell_index == 15 {
                continue;
            }

            push_cell_segments(&mut segments, cell_index, x, y, [tl, tr, br, bl], level);
        }
    }

    segments
}

fn push_cell_segments(
    segments: &mut Vec<Segment>,
    cell_index: u8,
    x: usize,
    y: usize,
    corners: [f32; 4],
    level: f32,
) {
    let [tl, tr, br, bl] = corners;
    let (fx, fy) = (x as f32, y as f32);

    let top = || {
        (
            interpolate_edge(fx, fy, fx + 1.0, fy, tl, tr, level),
            Edge::Horizontal { row: y, col: x },
        )
    };
    let bottom = || {
        (
            interpolate_edge(fx, fy + 1.0, fx + 1.0, fy + 1.0, bl, br, level),
            Edge::Horizontal { row: y + 1, col: x },
        )
    };
    let left = || {
        (
            interpolate_edge(fx, fy, fx, fy + 1.0, tl, bl, level),
            Edge::Vertical { row: y, col: x },
        )
    };
    let right = || {
        (
            interpolate_edge(fx + 1.0, fy, fx + 1.0, fy + 1.0, tr, br, level),
            Edge::Vertical { row: y, col: x + 1 },
        )
    };

    let mut push = |(start, start_edge): (Point, Edge), (end, end_edge): (Point, Edge)| {
        segments.push(Segment {
            start,
            end,
            start_edge,
            end_edge,
        });
    };

    match cell_index {
        1 | 14 => push(left(), top()),
        2 | 13 => push(top(), right()),
        3 | 12 => push(left(), right()),
        4 | 11 => push(right(), bottom()),
        5 => {
            // Saddle
            push(left(), top());
            push(right(), bottom());
        }
        6 | 9 => push(top(), bottom()),
        7 | 8 => push(left(), bottom()),
        10 => {
            // Saddle
            push(top(), right());
            push(left(), bottom());
        }
        _ => {}
    }
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    val1: f32,
    val2: f32,
    level: f32,
) -> Point {
    if (val2 - val1).abs() < 1e-6 {
        return Point::new((x1 + x2) / 2.0, (y1 + y2) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);

    Point::new(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
}

/// Join segments into continuous polylines.
///
/// Segments are linked through the grid edge they share, so joining is
/// linear in the number of segments.
pub fn connect_segments(segments: &[Segment], level: f32) -> Vec<Contour> {
    if segments.is_empty() {
        return vec![];
    }

    let mut by_edge: HashMap<Edge, Vec<usize>> = HashMap::with_capacity(segments.len() * 2);
    for (i, seg) in segments.iter().enumerate() {
        by_edge.entry(seg.start_edge).or_default().push(i);
        by_edge.entry(seg.end_edge).or_default().push(i);
    }

    // Next unused segment through `edge`: its far endpoint and far edge
    let follow = |edge: Edge, used: &[bool]| -> Option<(usize, Point, Edge)> {
        by_edge.get(&edge)?.iter().find(|&&i| !used[i]).map(|&i| {
            let seg = &segments[i];
            if seg.start_edge == edge {
                (i, seg.end, seg.end_edge)
            } else {
                (i, seg.start, seg.start_edge)
            }
        })
    };

    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];

    for first in 0..segments.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let seg = &segments[first];
        let head_edge = seg.start_edge;
        let mut tail_edge = seg.end_edge;
        let mut points = vec![seg.start, seg.end];

        while let Some((next, point, edge)) = follow(tail_edge, &used) {
            used[next] = true;
            points.push(point);
            tail_edge = edge;
        }

        let closed = tail_edge == head_edge && points.len() > 2;
        if !closed {
            let mut head = Vec::new();
            let mut edge = head_edge;
            while let Some((next, point, far_edge)) = follow(edge, &used) {
                used[next] = true;
                head.push(point);
                edge = far_edge;
            }
            if !head.is_empty() {
                head.reverse();
                head.extend(points);
                points = head;
            }
        }

        contours.push(Contour {
            level,
            points,
            closed,
        });
    }

    contours
}

/// Generate all contours for the given levels.
///
/// Levels are traced in parallel; the result is ordered by level.
pub fn generate_contours(data: &[f32], width: usize, height: usize, levels: &[f32]) -> Vec<Contour> {
    let per_level: Vec<Vec<Contour>> = levels
        .par_iter()
        .map(|&level| connect_segments(&march_squares(data, width, height, level), level))
        .collect();

    let contours: Vec<Contour> = per_level.into_iter().flatten().collect();

    tracing::debug!(
        levels = levels.len(),
        contours = contours.len(),
        total_points = contours.iter().map(|c| c.points.len()).sum::<usize>(),
        "Generated contours"
    );

    contours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contour_levels() {
        let levels = contour_levels(998.0, 1032.0, 2.0);
        let expected: Vec<f32> = (0..=18).map(|k| 998.0 + 2.0 * k as f32).collect();
        assert_eq!(levels, expected);

        assert_eq!(contour_levels(997.4, 1001.0, 2.0), vec![997.0, 999.0, 1001.0, 1003.0]);
        assert_eq!(contour_levels(1000.5, 1000.5, 2.0), vec![1000.0, 1002.0]);
        assert!(contour_levels(0.0, 10.0, 0.0).is_empty());
        assert!(contour_levels(10.0, 0.0, 2.0).is_empty());
    }

    #[test]
    fn test_interpolate_edge() {
        let p = interpolate_edge(0.0, 0.0, 1.0, 0.0, 0.0, 10.0, 5.0);
        assert!((p.x - 0.5).abs() < 0.01);
        assert!((p.y - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_march_squares_flat() {
        let data = vec![5.0; 9];
        assert!(march_squares(&data, 3, 3, 5.0).is_empty());
    }

    #[test]
    fn test_shared_edges_match() {
        let data = vec![0.0, 0.0, 0.0, 10.0, 10.0, 10.0];
        let segments = march_squares(&data, 3, 2, 5.0);
        assert_eq!(segments.len(), 2);
        let shared = Edge::Vertical { row: 0, col: 1 };
        let points: Vec<Point> = segments
            .iter()
            .flat_map(|s| [(s.start_edge, s.start), (s.end_edge, s.end)])
            .filter(|(e, _)| *e == shared)
            .map(|(_, p)| p)
            .collect();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0], points[1]);
    }

    #[test]
    fn test_peak_forms_closed_ring() {
        let data = vec![
            0.0, 0.0, 0.0, 0.0, //
            0.0, 10.0, 10.0, 0.0, //
            0.0, 10.0, 10.0, 0.0, //
            0.0, 0.0, 0.0, 0.0,
        ];
        let contours = connect_segments(&march_squares(&data, 4, 4, 5.0), 5.0);
        assert_eq!(contours.len(), 1);
        let ring = &contours[0];
        assert!(ring.closed);
        assert_eq!(ring.points.first(), ring.points.last());
        assert_eq!(ring.points.len(), 9);
    }
}
