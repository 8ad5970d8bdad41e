//! Global pressure minimum and maximum.

/// Row-major indices of the lowest and highest values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extrema {
    pub min: usize,
    pub max: usize,
}

/// Locate the global extrema, ignoring NaN.
///
/// Ties resolve to the first occurrence in row-major order. Returns `None`
/// when no value is finite.
pub fn find_extrema(values: &[f32]) -> Option<Extrema> {
    let mut min: Option<usize> = None;
    let mut max: Option<usize> = None;

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if min.map_or(true, |m| v < values[m]) {
            min = Some(i);
        }
        if max.map_or(true, |m| v > values[m]) {
            max = Some(i);
        }
    }

    Some(Extrema {
        min: min?,
        max: max?,
    })
}
