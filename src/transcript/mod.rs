//! Transcript data model.
//!
//! Raw transcript JSON is normalized once, at load time, into [`Transcript`]
//! and [`Segment`]; everything downstream works on those types only.

mod index;
mod timestamp;

pub use index::find_segment_index;
pub use timestamp::{
    format_file_stamp, format_timestamp, parse_timestamp, parse_timestamp_str, TimeValue,
};

use crate::error::{GlimtError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// A time-bounded span of transcript text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds (never before `start`).
    pub end: f64,
    /// Spoken text.
    pub text: String,
    /// Identifier carried over from the transcription collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end: end.max(start),
            text: text.into(),
            id: None,
        }
    }
}

/// A transcript with its segments sorted by start time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub id: String,
    pub text: String,
    pub segments: Vec<Segment>,
}

/// Segment shape accepted from upstream collaborators.
#[derive(Debug, Deserialize)]
struct RawSegment {
    #[serde(default, alias = "start_seconds", alias = "start_time")]
    start: Option<TimeValue>,
    #[serde(default, alias = "end_seconds", alias = "end_time")]
    end: Option<TimeValue>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawTranscript {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    segments: Option<Vec<RawSegment>>,
}

impl Transcript {
    /// Build a transcript from already-normalized parts.
    pub fn new(id: impl Into<String>, text: impl Into<String>, mut segments: Vec<Segment>) -> Self {
        segments.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self {
            id: id.into(),
            text: text.into(),
            segments,
        }
    }

    /// Parse transcript JSON. `default_id` is used when the document has no `id`.
    pub fn from_json(json: &str, default_id: &str) -> Result<Self> {
        let raw: RawTranscript = serde_json::from_str(json)
            .map_err(|e| GlimtError::Transcript(format!("Invalid transcript JSON: {}", e)))?;

        let id = match raw.id {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => default_id.to_string(),
        };

        let segments: Vec<Segment> = raw
            .segments
            .unwrap_or_default()
            .into_iter()
            .filter_map(normalize_segment)
            .collect();

        let text = match raw.text {
            Some(t) if !t.trim().is_empty() => t,
            _ => segments
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        };

        let transcript = Self::new(id, text, segments);
        debug!(
            "Loaded transcript {} with {} segments",
            transcript.id,
            transcript.segments.len()
        );
        Ok(transcript)
    }

    /// Load a transcript JSON file; the file stem is the fallback id.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "transcript".to_string());
        Self::from_json(&content, &stem)
    }

    /// End of the final segment, if there are segments.
    pub fn duration(&self) -> Option<f64> {
        self.segments.last().map(|s| s.end)
    }

    pub fn has_segments(&self) -> bool {
        !self.segments.is_empty()
    }
}

/// Reject ids that cannot be used as a single path component.
pub fn validate_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\'])
        && !id.contains('\0');
    if valid {
        Ok(())
    } else {
        Err(GlimtError::InvalidInput(format!("Invalid transcript id: {:?}", id)))
    }
}

/// Segments without a usable start are dropped.
fn normalize_segment(raw: RawSegment) -> Option<Segment> {
    let start = raw.start.as_ref().map(parse_timestamp)?;
    if !start.is_finite() {
        return None;
    }
    let end = raw
        .end
        .as_ref()
        .map(parse_timestamp)
        .filter(|e| e.is_finite())
        .unwrap_or(start);
    let mut segment = Segment::new(start.max(0.0), end, raw.text.unwrap_or_default().trim());
    segment.id = raw.id;
    Some(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("talk_2024").is_ok());
        assert!(validate_id("talk.v2").is_ok());
        for bad in ["", ".", "..", "../x", "a/b", "a\\b", "nul\0"] {
            assert!(matches!(validate_id(bad), Err(GlimtError::InvalidInput(_))), "{:?}", bad);
        }
    }

    #[test]
    fn test_from_json_standard_shape() {
        let json = r#"{
            "id": "abc",
            "text": "Hello world. Bye.",
            "segments": [
                {"start": 5.0, "end": 7.5, "text": "Bye.", "id": 1},
                {"start": 0.0, "end": 4.0, "text": "Hello world.", "id": 0}
            ]
        }"#;

        let t = Transcript::from_json(json, "fallback").unwrap();
        assert_eq!(t.id, "abc");
        assert_eq!(t.segments.len(), 2);
        assert_eq!(t.segments[0].start, 0.0);
        assert_eq!(t.segments[1].text, "Bye.");
        assert_eq!(t.duration(), Some(7.5));
    }

    #[test]
    fn test_from_json_alternate_field_names() {
        let json = r#"{
            "segments": [
                {"start_seconds": "00:10", "end_seconds": "00:12", "text": " a "},
                {"start_time": 14, "end_time": 13, "text": "b"}
            ]
        }"#;

        let t = Transcript::from_json(json, "file-stem").unwrap();
        assert_eq!(t.id, "file-stem");
        assert_eq!(t.segments[0].start, 10.0);
        assert_eq!(t.segments[0].text, "a");
        // end raised to start
        assert_eq!(t.segments[1].end, 14.0);
        assert_eq!(t.text, "a b");
    }

    #[test]
    fn test_missing_segments_is_empty_not_error() {
        let t = Transcript::from_json(r#"{"text": "only text"}"#, "x").unwrap();
        assert!(!t.has_segments());
        assert_eq!(t.duration(), None);
    }

    #[test]
    fn test_segments_without_start_are_dropped() {
        let json = r#"{"segments": [{"text": "no time"}, {"start": 1, "end": 2, "text": "ok"}]}"#;
        let t = Transcript::from_json(json, "x").unwrap();
        assert_eq!(t.segments.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_transcript_error() {
        let result = Transcript::from_json("not json", "x");
        assert!(matches!(result, Err(GlimtError::Transcript(_))));
    }

    #[test]
    fn test_load_uses_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meeting42.json");
        std::fs::write(&path, r#"{"segments": []}"#).unwrap();
        let t = Transcript::load(&path).unwrap();
        assert_eq!(t.id, "meeting42");
    }
}
