//! Visual-reference phrases near explicit timestamps in raw transcript text.

use crate::transcript::TimeValue;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

const TIMESTAMP: &str = r"\b(?:\d{1,2}:)?\d{1,2}:\d{2}\b";
const CUE_PHRASES: &str = r"\b(?:take a look at|as you can see|on the screen|on screen|slides?|diagrams?|charts?|graphs?|let me show you|demos?|screenshots?)\b";

/// Timestamp followed by a cue phrase within 100 characters.
static TIMESTAMP_THEN_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)(?P<ts>{TIMESTAMP}).{{0,100}}?(?P<cue>{CUE_PHRASES})"))
        .expect("Invalid regex")
});

/// Cue phrase followed by a timestamp within 50 characters.
static CUE_THEN_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?is)(?P<cue>{CUE_PHRASES}).{{0,50}}?(?P<ts>{TIMESTAMP})"))
        .expect("Invalid regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    Medium,
    Low,
}

/// A transcript phrase referencing on-screen content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualCue {
    pub timestamp: TimeValue,
    pub cue_phrase: String,
    pub context: String,
    pub importance: Importance,
}

impl VisualCue {
    pub fn seconds(&self) -> f64 {
        self.timestamp.seconds()
    }
}

/// Scan raw text for visual cues. Each timestamp text is reported once,
/// timestamp-first matches taking precedence.
pub fn detect_visual_cues(text: &str) -> Vec<VisualCue> {
    let mut seen = HashSet::new();
    let mut cues = Vec::new();

    for pattern in [&*TIMESTAMP_THEN_CUE, &*CUE_THEN_TIMESTAMP] {
        for caps in pattern.captures_iter(text) {
            let (Some(ts), Some(cue), Some(whole)) = (caps.name("ts"), caps.name("cue"), caps.get(0))
            else {
                continue;
            };
            if !seen.insert(ts.as_str().to_string()) {
                continue;
            }
            cues.push(VisualCue {
                timestamp: TimeValue::Text(ts.as_str().to_string()),
                cue_phrase: cue.as_str().to_lowercase(),
                context: whole.as_str().split_whitespace().collect::<Vec<_>>().join(" "),
                importance: Importance::Medium,
            });
        }
    }

    cues
}
