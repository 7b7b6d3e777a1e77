//! Context windows expanded to sentence boundaries.

use crate::transcript::Segment;

/// Segments surrounding a moment, as inclusive indices into the segment list.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextWindow {
    pub start_index: usize,
    pub end_index: usize,
    pub text: String,
}

impl ContextWindow {
    /// Start time of the first segment in the window.
    pub fn start_time(&self, segments: &[Segment]) -> f64 {
        segments[self.start_index..=self.end_index]
            .iter()
            .map(|s| s.start)
            .fold(f64::INFINITY, f64::min)
    }

    /// End time of the last segment in the window.
    pub fn end_time(&self, segments: &[Segment]) -> f64 {
        segments[self.start_index..=self.end_index]
            .iter()
            .map(|s| s.end)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

fn ends_sentence(text: &str) -> bool {
    text.trim_end().ends_with(['.', '!', '?'])
}

fn starts_lowercase(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_lowercase())
}

/// Window of `±base_window` segments around `center`, grown by at most one
/// segment on each side so it does not cut a sentence in half.
///
/// Returns `None` when there are no segments.
pub fn extract_semantic_context(
    segments: &[Segment],
    center: usize,
    base_window: usize,
) -> Option<ContextWindow> {
    if segments.is_empty() {
        return None;
    }
    let last = segments.len() - 1;
    let center = center.min(last);

    let mut start = center.saturating_sub(base_window);
    let mut end = center.saturating_add(base_window).min(last);

    if start > 0 && starts_lowercase(&segments[start].text) && !ends_sentence(&segments[start - 1].text) {
        start -= 1;
    }
    if end < last && !ends_sentence(&segments[end].text) {
        end += 1;
    }

    let text = segments[start..=end]
        .iter()
        .map(|s| s.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    Some(ContextWindow {
        start_index: start,
        end_index: end,
        text,
    })
}

/// Base window size for a video of the given length: one extra segment per
/// ten minutes on top of 5, at most 15.
pub fn adaptive_window_size(duration_seconds: f64) -> usize {
    let minutes = if duration_seconds.is_finite() {
        (duration_seconds / 60.0).max(0.0)
    } else {
        0.0
    };
    (5 + (minutes / 10.0).floor() as usize).clamp(5, 15)
}
