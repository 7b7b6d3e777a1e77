//! Key-moment selection.
//!
//! The selector blends rule-based candidates (visual cues, content breaks)
//! with optional LLM suggestions, anchors an introduction and a conclusion,
//! and fills the remaining slots so the result always has the target count.

mod response;
mod selector;
mod suggest;

pub use response::{parse_key_moments, SuggestedMoment};
pub use selector::KeyMomentSelector;
pub use suggest::{MomentSuggester, OpenAISuggester, SuggestionRequest};

use crate::config::SelectionSettings;
use serde::{Deserialize, Serialize};

/// Words in a candidate that suggest something is being shown on screen.
const VISUAL_KEYWORDS: &[&str] = &[
    "screen", "show", "slide", "image", "diagram", "chart", "demo", "display", "visual",
];

/// A selected timestamp worth illustrating with a screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMoment {
    pub timestamp: f64,
    pub title: String,
    pub description: String,
    pub transcript_text: String,
    pub context_start_time: f64,
    pub context_end_time: f64,
    /// Web path of the primary screenshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
    #[serde(flatten)]
    pub sequence: Option<SequenceInfo>,
}

/// Burst of screenshots captured around a moment's visual changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceInfo {
    pub has_sequence: bool,
    pub sequence_count: usize,
    pub sequence_screenshots: Vec<String>,
}

impl SequenceInfo {
    pub fn new(screenshots: Vec<String>) -> Self {
        Self {
            has_sequence: screenshots.len() > 1,
            sequence_count: screenshots.len(),
            sequence_screenshots: screenshots,
        }
    }
}

/// Where a candidate timestamp came from. Declaration order is priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    VisualCue,
    ContentBreak,
    Llm,
}

/// A timestamp proposed for selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub timestamp: f64,
    pub title: String,
    pub description: String,
    pub moment_type: Option<String>,
    pub source: CandidateSource,
}

impl Candidate {
    /// Whether the candidate points at on-screen content.
    pub fn is_visual(&self) -> bool {
        if self.source == CandidateSource::VisualCue {
            return true;
        }
        let haystack = format!(
            "{} {} {}",
            self.title,
            self.description,
            self.moment_type.as_deref().unwrap_or("")
        )
        .to_lowercase();
        VISUAL_KEYWORDS.iter().any(|k| haystack.contains(k))
    }
}

impl From<SuggestedMoment> for Candidate {
    fn from(moment: SuggestedMoment) -> Self {
        Self {
            timestamp: moment.timestamp.seconds(),
            title: moment.title,
            description: moment.description,
            moment_type: moment.moment_type,
            source: CandidateSource::Llm,
        }
    }
}

/// Number of moments for a video of `duration_seconds`.
///
/// Dynamic sizing adds one moment per ten minutes on top of `min_count`,
/// bounded by `max_count`; otherwise `fixed_count` is used.
pub fn target_count(settings: &SelectionSettings, duration_seconds: f64) -> usize {
    if !settings.dynamic_count {
        return settings.fixed_count;
    }
    let minutes = if duration_seconds.is_finite() {
        (duration_seconds / 60.0).max(0.0)
    } else {
        0.0
    };
    let extra = (minutes / 10.0).floor() as usize;
    settings
        .min_count
        .saturating_add(extra)
        .clamp(settings.min_count, settings.max_count.max(settings.min_count))
}
