//! Nearest-segment lookup.

use super::Segment;

/// Index of the segment whose start is closest to `timestamp`.
///
/// Returns `None` for an empty slice. Ties keep the earliest segment.
pub fn find_segment_index(segments: &[Segment], timestamp: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;

    for (i, segment) in segments.iter().enumerate() {
        let distance = (segment.start - timestamp).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((i, distance)),
        }
    }

    best.map(|(i, _)| i)
}
