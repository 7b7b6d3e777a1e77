//! Heuristic content-break detection over transcript segments.

use crate::transcript::Segment;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::LazyLock;
use tracing::debug;

/// Phrases that usually open a new section of a talk.
const TRANSITION_PHRASES: &[&str] = &[
    "moving on to",
    "let's move on",
    "let's talk about",
    "let's turn to",
    "let's look at",
    "now let's",
    "the next point",
    "the next thing",
    "next topic",
    "switching gears",
    "another thing",
    "to summarize",
    "in summary",
    "in conclusion",
    "to wrap up",
];

/// Numbers, percentages, currency and metric vocabulary.
static TECHNICAL_TERMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \d+(?:\.\d+)?\s?%
        | \$\s?\d[\d,]*(?:\.\d+)?
        | \b\d+(?:[.,]\d+)*\b
        | \b(?:kpis?|metrics?|revenue|percent(?:age)?|roi|growth|benchmark|throughput|latency|q[1-4])\b
        ",
    )
    .expect("Invalid regex")
});

/// Segments summed into one rolling density value.
const DENSITY_WINDOW: usize = 3;
/// Previous rolling values averaged for the spike baseline.
const DENSITY_HISTORY: usize = 10;
const DENSITY_SPIKE_FACTOR: f64 = 3.0;
const DENSITY_MIN_ABSOLUTE: usize = 3;
const EXCERPT_CHARS: usize = 100;

/// Why a segment was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakReason {
    TransitionPhrase,
    TechnicalDensity,
    Pause,
}

impl std::fmt::Display for BreakReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakReason::TransitionPhrase => write!(f, "transition phrase"),
            BreakReason::TechnicalDensity => write!(f, "technical density"),
            BreakReason::Pause => write!(f, "pause"),
        }
    }
}

/// A detected discontinuity in topic or pace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBreak {
    pub timestamp: f64,
    pub segment_index: usize,
    pub reason: BreakReason,
    pub excerpt: String,
}

/// Scans segments for transition phrases, density spikes and long pauses.
#[derive(Debug, Clone)]
pub struct BreakDetector {
    min_segments_between: usize,
    pause_threshold: f64,
}

impl Default for BreakDetector {
    fn default() -> Self {
        Self::new(10, 2.0)
    }
}

impl BreakDetector {
    pub fn new(min_segments_between: usize, pause_threshold: f64) -> Self {
        Self {
            min_segments_between,
            pause_threshold,
        }
    }

    /// Detect content breaks, in segment order.
    ///
    /// Returns nothing when there are fewer than `2 * min_segments_between`
    /// segments. A flagged segment suppresses flags on the next
    /// `min_segments_between` segments.
    pub fn detect(&self, segments: &[Segment]) -> Vec<ContentBreak> {
        if segments.is_empty() || segments.len() < 2 * self.min_segments_between {
            debug!(
                "Too few segments ({}) for break detection",
                segments.len()
            );
            return Vec::new();
        }

        let mut breaks = Vec::new();
        let mut suppressed_until: Option<usize> = None;
        let mut counts: VecDeque<usize> = VecDeque::with_capacity(DENSITY_WINDOW);
        let mut history: VecDeque<usize> = VecDeque::with_capacity(DENSITY_HISTORY);

        for (i, segment) in segments.iter().enumerate() {
            // Density bookkeeping runs for every segment, suppressed or not.
            if counts.len() == DENSITY_WINDOW {
                counts.pop_front();
            }
            counts.push_back(technical_term_count(&segment.text));
            let rolling: usize = counts.iter().sum();
            let density_spike = is_spike(rolling, &history);
            if history.len() == DENSITY_HISTORY {
                history.pop_front();
            }
            history.push_back(rolling);

            if suppressed_until.is_some_and(|until| i <= until) {
                continue;
            }

            let lower = segment.text.to_lowercase();
            let reason = if TRANSITION_PHRASES.iter().any(|p| lower.contains(p)) {
                Some(BreakReason::TransitionPhrase)
            } else if density_spike {
                Some(BreakReason::TechnicalDensity)
            } else if i > 0 && segment.start - segments[i - 1].end > self.pause_threshold {
                Some(BreakReason::Pause)
            } else {
                None
            };

            if let Some(reason) = reason {
                debug!("Content break at {:.1}s ({})", segment.start, reason);
                breaks.push(ContentBreak {
                    timestamp: segment.start,
                    segment_index: i,
                    reason,
                    excerpt: segment.text.chars().take(EXCERPT_CHARS).collect(),
                });
                suppressed_until = Some(i + self.min_segments_between);
            }
        }

        breaks
    }
}

fn technical_term_count(text: &str) -> usize {
    TECHNICAL_TERMS.find_iter(text).count()
}

fn is_spike(rolling: usize, history: &VecDeque<usize>) -> bool {
    if history.is_empty() || rolling < DENSITY_MIN_ABSOLUTE {
        return false;
    }
    let mean = history.iter().sum::<usize>() as f64 / history.len() as f64;
    rolling as f64 > DENSITY_SPIKE_FACTOR * mean
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `n` back-to-back segments of plain filler, 5 s each.
    fn filler(n: usize) -> Vec<Segment> {
        (0..n)
            .map(|i| {
                let start = i as f64 * 5.0;
                Segment::new(start, start + 5.0, "and we keep talking about things")
            })
            .collect()
    }

    #[test]
    fn test_too_few_segments_yields_nothing() {
        let mut segments = filler(19);
        segments[5].text = "Moving on to the roadmap".to_string();
        assert!(BreakDetector::default().detect(&segments).is_empty());
    }

    #[test]
    fn test_transition_phrase_is_detected() {
        let mut segments = filler(30);
        segments[12].text = "OK, moving on to the roadmap.".to_string();

        let breaks = BreakDetector::default().detect(&segments);
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].segment_index, 12);
        assert_eq!(breaks[0].reason, BreakReason::TransitionPhrase);
        assert_eq!(breaks[0].timestamp, 60.0);
    }

    #[test]
    fn test_breaks_are_spaced_by_suppression() {
        let mut segments = filler(40);
        segments[3].text = "let's talk about pricing".to_string();
        segments[8].text = "to summarize the pricing".to_string();
        segments[14].text = "the next point is hiring".to_string();

        let breaks = BreakDetector::default().detect(&segments);
        let indices: Vec<usize> = breaks.iter().map(|b| b.segment_index).collect();
        assert_eq!(indices, vec![3, 14]);
    }

    #[test]
    fn test_density_spike_is_detected() {
        let mut segments = filler(30);
        segments[15].text = "revenue grew 40% to $2,000,000 and the KPI is 12 metrics".to_string();

        let breaks = BreakDetector::default().detect(&segments);
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].segment_index, 15);
        assert_eq!(breaks[0].reason, BreakReason::TechnicalDensity);
    }

    #[test]
    fn test_pause_is_detected() {
        let mut segments = filler(30);
        for seg in segments.iter_mut().skip(20) {
            seg.start += 10.0;
            seg.end += 10.0;
        }

        let breaks = BreakDetector::default().detect(&segments);
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[0].segment_index, 20);
        assert_eq!(breaks[0].reason, BreakReason::Pause);
    }

    #[test]
    fn test_transition_wins_over_pause() {
        let mut segments = filler(30);
        for seg in segments.iter_mut().skip(20) {
            seg.start += 10.0;
            seg.end += 10.0;
        }
        segments[20].text = "In conclusion, thanks".to_string();

        let breaks = BreakDetector::default().detect(&segments);
        assert_eq!(breaks[0].reason, BreakReason::TransitionPhrase);
    }

    #[test]
    fn test_technical_term_count() {
        assert_eq!(technical_term_count("no numbers here"), 0);
        assert_eq!(technical_term_count("up 15% with 3 KPIs"), 3);
    }
}
