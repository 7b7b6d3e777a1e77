//! Key-moment selector: candidates, anchors, fill and context.

use super::suggest::{MomentSuggester, SuggestionRequest};
use super::{target_count, Candidate, CandidateSource, KeyMoment};
use crate::config::SelectionSettings;
use crate::detection::{
    adaptive_window_size, detect_visual_cues, extract_semantic_context, BreakDetector,
};
use crate::transcript::{find_segment_index, format_timestamp, Segment, Transcript};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const INTRO_FRACTION: f64 = 0.05;
const CONCLUSION_FRACTION: f64 = 0.95;
/// Fraction of the even split used as the spacing ceiling.
const SPACING_SHARE: f64 = 0.45;
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(30);
/// Candidates this close are treated as the same timestamp.
const SAME_TIMESTAMP: f64 = 1e-6;

/// A timestamp chosen for the final set, before context is attached.
#[derive(Debug, Clone)]
struct Slot {
    timestamp: f64,
    description: Option<String>,
}

/// Selects a fixed-size, duration-scaled set of key moments.
pub struct KeyMomentSelector {
    settings: SelectionSettings,
    suggester: Option<Arc<dyn MomentSuggester>>,
    llm_timeout: Duration,
    max_transcript_chars: usize,
}

impl KeyMomentSelector {
    pub fn new(settings: SelectionSettings) -> Self {
        Self {
            settings,
            suggester: None,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            max_transcript_chars: 12_000,
        }
    }

    /// Attach an LLM collaborator, bounded by `timeout` per call.
    pub fn with_suggester(mut self, suggester: Arc<dyn MomentSuggester>, timeout: Duration) -> Self {
        self.suggester = Some(suggester);
        self.llm_timeout = timeout;
        self
    }

    pub fn with_max_transcript_chars(mut self, max_chars: usize) -> Self {
        self.max_transcript_chars = max_chars;
        self
    }

    /// Duration used for selection: final segment end, then the video's
    /// duration, then the configured fallback.
    pub fn resolve_duration(&self, transcript: &Transcript, video_duration: Option<f64>) -> f64 {
        transcript
            .duration()
            .or(video_duration)
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(self.settings.fallback_duration_seconds)
    }

    /// Select key moments. Always returns exactly the target count, which is
    /// empty only when the settings allow a count of zero.
    #[instrument(skip(self, transcript), fields(transcript_id = %transcript.id))]
    pub async fn select(&self, transcript: &Transcript, video_duration: Option<f64>) -> Vec<KeyMoment> {
        let duration = self.resolve_duration(transcript, video_duration);
        let count = target_count(&self.settings, duration);
        let segments = &transcript.segments;

        if count == 0 {
            warn!("Moment count is zero, nothing to select");
            return Vec::new();
        }
        if segments.len() < count {
            info!(
                "Transcript has {} segments for {} moments, using even split",
                segments.len(),
                count
            );
            return self.fallback(segments, duration, count);
        }

        let candidates = self.gather_candidates(transcript, duration, count).await;
        info!(
            "Selecting {} moments over {:.0}s from {} candidates",
            count,
            duration,
            candidates.len()
        );

        let slots = choose_slots(&candidates, segments, duration, count, self.settings.min_spacing_seconds);
        build_moments(slots, segments, duration)
    }

    /// Even split over `[5%, 95%]` of the duration. Never fails.
    pub fn fallback(&self, segments: &[Segment], duration: f64, count: usize) -> Vec<KeyMoment> {
        let slots = even_split(INTRO_FRACTION * duration, CONCLUSION_FRACTION * duration, count)
            .into_iter()
            .map(|timestamp| Slot {
                timestamp,
                description: None,
            })
            .collect();
        build_moments(slots, segments, duration)
    }

    async fn gather_candidates(&self, transcript: &Transcript, duration: f64, count: usize) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if self.settings.use_visual_cues {
            let cues = detect_visual_cues(&transcript.text);
            debug!("Found {} visual cues", cues.len());
            candidates.extend(cues.into_iter().map(|cue| Candidate {
                timestamp: cue.seconds(),
                title: String::new(),
                description: cue.context,
                moment_type: Some("visual".to_string()),
                source: CandidateSource::VisualCue,
            }));
        }

        let detector = BreakDetector::new(
            self.settings.min_segments_between_breaks,
            self.settings.pause_threshold_seconds,
        );
        let breaks = detector.detect(&transcript.segments);
        debug!("Found {} content breaks", breaks.len());
        candidates.extend(breaks.into_iter().map(|b| Candidate {
            timestamp: b.timestamp,
            title: String::new(),
            description: b.excerpt,
            moment_type: Some(b.reason.to_string()),
            source: CandidateSource::ContentBreak,
        }));

        if self.settings.use_llm && candidates.len() < count {
            candidates.extend(self.llm_candidates(transcript, duration, count).await);
        }

        candidates.retain(|c| c.timestamp.is_finite() && c.timestamp >= 0.0 && c.timestamp <= duration);
        candidates.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp).then(a.source.cmp(&b.source)));
        candidates.dedup_by(|later, earlier| (later.timestamp - earlier.timestamp).abs() < SAME_TIMESTAMP);
        candidates
    }

    /// LLM candidates, or none on error or timeout.
    async fn llm_candidates(&self, transcript: &Transcript, duration: f64, count: usize) -> Vec<Candidate> {
        let Some(suggester) = &self.suggester else {
            return Vec::new();
        };

        let request = SuggestionRequest::new(transcript, count, duration, self.max_transcript_chars);
        match tokio::time::timeout(self.llm_timeout, suggester.suggest(&request)).await {
            Ok(Ok(moments)) => moments.into_iter().map(Candidate::from).collect(),
            Ok(Err(e)) => {
                warn!("LLM suggestions unavailable: {}", e);
                Vec::new()
            }
            Err(_) => {
                warn!("LLM suggestions timed out after {:?}", self.llm_timeout);
                Vec::new()
            }
        }
    }
}

/// `count` evenly spaced points from `first` to `last` inclusive.
fn even_split(first: f64, last: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![first],
        _ => {
            let step = (last - first) / (count - 1) as f64;
            (0..count).map(|i| first + step * i as f64).collect()
        }
    }
}

fn fits(chosen: &[Slot], timestamp: f64, spacing: f64) -> bool {
    chosen
        .iter()
        .all(|s| (s.timestamp - timestamp).abs() + SAME_TIMESTAMP >= spacing)
}

/// Anchor, fill and bisect until there are `count` slots.
fn choose_slots(
    candidates: &[Candidate],
    segments: &[Segment],
    duration: f64,
    count: usize,
    min_spacing: f64,
) -> Vec<Slot> {
    let span_start = segments.first().map(|s| s.start).unwrap_or(0.0).min(duration);
    let intro_at = (INTRO_FRACTION * duration).clamp(span_start, duration);
    let conclusion_at = (CONCLUSION_FRACTION * duration).clamp(intro_at, duration);

    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Slot {
            timestamp: intro_at,
            description: candidates.first().map(|c| c.description.clone()),
        }];
    }

    let gaps = (count - 1) as f64;
    let spacing = min_spacing
        .min(SPACING_SHARE * duration / gaps)
        .min(0.5 * (conclusion_at - intro_at) / gaps)
        .max(0.0);

    // Candidates at or beyond an anchor are absorbed into it.
    let has_description = |c: &&Candidate| !c.description.is_empty();
    let intro_description = candidates
        .iter()
        .filter(|c| c.timestamp <= intro_at)
        .find(has_description)
        .map(|c| c.description.clone());
    let conclusion_description = candidates
        .iter()
        .rev()
        .filter(|c| c.timestamp >= conclusion_at)
        .find(has_description)
        .map(|c| c.description.clone());

    let mut chosen = vec![
        Slot {
            timestamp: intro_at,
            description: intro_description,
        },
        Slot {
            timestamp: conclusion_at,
            description: conclusion_description,
        },
    ];

    let interior: Vec<&Candidate> = candidates
        .iter()
        .filter(|c| c.timestamp > intro_at && c.timestamp < conclusion_at)
        .collect();
    let mut used = vec![false; interior.len()];

    // Visual candidates first, ascending.
    for (i, candidate) in interior.iter().enumerate() {
        if chosen.len() >= count {
            break;
        }
        if candidate.is_visual() && fits(&chosen, candidate.timestamp, spacing) {
            chosen.push(Slot {
                timestamp: candidate.timestamp,
                description: Some(candidate.description.clone()),
            });
            used[i] = true;
        }
    }

    // Remaining candidates, sampled evenly across their time order.
    let remaining: Vec<&Candidate> = interior
        .iter()
        .zip(&used)
        .filter(|(_, used)| !**used)
        .map(|(c, _)| *c)
        .collect();
    let needed = count - chosen.len();
    if needed > 0 && !remaining.is_empty() {
        let picks: Vec<&Candidate> = if remaining.len() <= needed {
            remaining.clone()
        } else {
            (0..needed)
                .map(|j| remaining[((j as f64 + 0.5) * remaining.len() as f64 / needed as f64) as usize])
                .collect()
        };
        for candidate in picks {
            if chosen.len() >= count {
                break;
            }
            if fits(&chosen, candidate.timestamp, spacing) {
                chosen.push(Slot {
                    timestamp: candidate.timestamp,
                    description: Some(candidate.description.clone()),
                });
            }
        }
    }

    // Bisect the largest gap; the earliest gap wins ties.
    while chosen.len() < count {
        chosen.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        let mut widest = 0;
        let mut widest_gap = f64::NEG_INFINITY;
        for (i, pair) in chosen.windows(2).enumerate() {
            let gap = pair[1].timestamp - pair[0].timestamp;
            if gap > widest_gap {
                widest = i;
                widest_gap = gap;
            }
        }
        let midpoint = (chosen[widest].timestamp + chosen[widest + 1].timestamp) / 2.0;
        chosen.push(Slot {
            timestamp: midpoint,
            description: None,
        });
    }

    chosen.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    chosen
}

/// Attach titles and transcript context to the chosen timestamps.
fn build_moments(slots: Vec<Slot>, segments: &[Segment], duration: f64) -> Vec<KeyMoment> {
    let last = slots.len().saturating_sub(1);
    let window = adaptive_window_size(duration);

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            let title = if i == 0 {
                "Introduction".to_string()
            } else if i == last {
                "Conclusion".to_string()
            } else {
                format!("Key point {}", i)
            };

            let description = slot.description.filter(|d| !d.trim().is_empty()).unwrap_or_else(|| {
                if i == 0 {
                    "Opening of the video".to_string()
                } else if i == last {
                    "Closing remarks".to_string()
                } else {
                    format!("Content at {}", format_timestamp(slot.timestamp))
                }
            });

            let context = find_segment_index(segments, slot.timestamp)
                .and_then(|center| extract_semantic_context(segments, center, window));

            match context {
                Some(ctx) => {
                    let context_start_time = ctx.start_time(segments);
                    let context_end_time = ctx.end_time(segments);
                    KeyMoment {
                        timestamp: slot.timestamp.clamp(context_start_time, context_end_time),
                        title,
                        description,
                        transcript_text: ctx.text,
                        context_start_time,
                        context_end_time,
                        screenshot_path: None,
                        sequence: None,
                    }
                }
                None => KeyMoment {
                    timestamp: slot.timestamp,
                    title,
                    description,
                    transcript_text: String::new(),
                    context_start_time: slot.timestamp,
                    context_end_time: slot.timestamp,
                    screenshot_path: None,
                    sequence: None,
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GlimtError, Result};
    use crate::moments::SuggestedMoment;
    use crate::transcript::TimeValue;
    use async_trait::async_trait;

    /// `n` contiguous segments covering `duration` seconds.
    fn transcript(duration: f64, n: usize) -> Transcript {
        let step = duration / n as f64;
        let segments = (0..n)
            .map(|i| {
                let start = i as f64 * step;
                Segment::new(start, start + step, format!("Sentence number {}.", i))
            })
            .collect::<Vec<_>>();
        let text = segments.iter().map(|s| s.text.clone()).collect::<Vec<_>>().join(" ");
        Transcript::new("t1", text, segments)
    }

    fn rules_only() -> SelectionSettings {
        SelectionSettings {
            use_llm: false,
            ..Default::default()
        }
    }

    fn min_gap(moments: &[KeyMoment]) -> f64 {
        moments
            .windows(2)
            .map(|w| w[1].timestamp - w[0].timestamp)
            .fold(f64::INFINITY, f64::min)
    }

    struct FixedSuggester(Vec<SuggestedMoment>);

    #[async_trait]
    impl MomentSuggester for FixedSuggester {
        async fn suggest(&self, _request: &SuggestionRequest) -> Result<Vec<SuggestedMoment>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSuggester;

    #[async_trait]
    impl MomentSuggester for FailingSuggester {
        async fn suggest(&self, _request: &SuggestionRequest) -> Result<Vec<SuggestedMoment>> {
            Err(GlimtError::Llm("service down".to_string()))
        }
    }

    struct HangingSuggester;

    #[async_trait]
    impl MomentSuggester for HangingSuggester {
        async fn suggest(&self, _request: &SuggestionRequest) -> Result<Vec<SuggestedMoment>> {
            std::future::pending::<()>().await;
            Ok(Vec::new())
        }
    }

    fn suggestion(ts: f64, title: &str, description: &str) -> SuggestedMoment {
        SuggestedMoment {
            timestamp: TimeValue::Seconds(ts),
            title: title.to_string(),
            description: description.to_string(),
            moment_type: None,
        }
    }

    #[tokio::test]
    async fn test_thirty_minute_video() {
        let t = transcript(1800.0, 360);
        let moments = KeyMomentSelector::new(rules_only()).select(&t, None).await;

        assert_eq!(moments.len(), 8);
        assert_eq!(moments[0].title, "Introduction");
        assert!((moments[0].timestamp - 90.0).abs() < 5.0);
        assert_eq!(moments[7].title, "Conclusion");
        assert!((moments[7].timestamp - 1710.0).abs() < 5.0);
        for (i, m) in moments.iter().enumerate().skip(1).take(6) {
            assert_eq!(m.title, format!("Key point {}", i));
        }
    }

    #[tokio::test]
    async fn test_moments_sorted_and_spaced() {
        let t = transcript(1800.0, 360);
        let moments = KeyMomentSelector::new(rules_only()).select(&t, None).await;
        let spacing = 15.0_f64.min(0.45 * 1800.0 / 7.0);
        assert!(min_gap(&moments) + 1e-6 >= spacing);
    }

    #[tokio::test]
    async fn test_context_bounds_contain_timestamp() {
        let t = transcript(1200.0, 200);
        let moments = KeyMomentSelector::new(rules_only()).select(&t, None).await;
        for m in &moments {
            assert!(m.context_start_time <= m.timestamp, "{:?}", m);
            assert!(m.timestamp <= m.context_end_time, "{:?}", m);
            assert!(t.segments.iter().any(|s| s.start == m.context_start_time));
            assert!(t.segments.iter().any(|s| s.end == m.context_end_time));
            assert!(!m.transcript_text.is_empty());
        }
    }

    #[tokio::test]
    async fn test_empty_segments_fallback() {
        let t = Transcript::new("t", "", Vec::new());
        let settings = SelectionSettings::default();
        let moments = KeyMomentSelector::new(settings).select(&t, None).await;

        assert_eq!(moments.len(), 8);
        assert!((moments[0].timestamp - 90.0).abs() < 1e-9);
        assert!((moments[7].timestamp - 1710.0).abs() < 1e-9);
        assert_eq!(moments[0].title, "Introduction");
        assert_eq!(moments[3].title, "Key point 3");
        assert_eq!(moments[7].title, "Conclusion");
        assert!(moments.iter().all(|m| !m.description.is_empty()));
    }

    #[tokio::test]
    async fn test_fallback_with_fixed_count_and_video_duration() {
        let t = Transcript::new("t", "", Vec::new());
        let settings = SelectionSettings {
            dynamic_count: false,
            fixed_count: 4,
            ..Default::default()
        };
        let moments = KeyMomentSelector::new(settings).select(&t, Some(100.0)).await;
        let stamps: Vec<f64> = moments.iter().map(|m| m.timestamp).collect();
        assert_eq!(stamps.len(), 4);
        assert!((stamps[0] - 5.0).abs() < 1e-9);
        assert!((stamps[3] - 95.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_short_transcript_uses_fallback() {
        let t = transcript(600.0, 3);
        let moments = KeyMomentSelector::new(rules_only()).select(&t, None).await;
        assert_eq!(moments.len(), 6);
        assert!((moments[0].timestamp - 30.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_visual_cues_are_preferred() {
        let mut t = transcript(1800.0, 360);
        t.text = format!("{} At 10:00 take a look at the architecture diagram.", t.text);
        let moments = KeyMomentSelector::new(rules_only()).select(&t, None).await;

        assert_eq!(moments.len(), 8);
        let cue = moments.iter().find(|m| (m.timestamp - 600.0).abs() < 1e-6);
        assert!(cue.is_some(), "{:?}", moments.iter().map(|m| m.timestamp).collect::<Vec<_>>());
        assert!(cue.unwrap().description.contains("take a look at"));
    }

    #[tokio::test]
    async fn test_llm_candidates_used_when_short() {
        let t = transcript(1800.0, 360);
        let suggester = Arc::new(FixedSuggester(vec![
            suggestion(400.0, "Pricing", "Pricing discussion"),
            suggestion(1200.0, "Demo", "He shows the product"),
        ]));
        let settings = SelectionSettings::default();
        let moments = KeyMomentSelector::new(settings)
            .with_suggester(suggester, Duration::from_secs(5))
            .select(&t, None)
            .await;

        assert_eq!(moments.len(), 8);
        assert!(moments.iter().any(|m| (m.timestamp - 1200.0).abs() < 1e-6));
        assert!(moments.iter().any(|m| (m.timestamp - 400.0).abs() < 1e-6));
    }

    #[tokio::test]
    async fn test_llm_candidate_before_intro_is_absorbed() {
        let t = transcript(1800.0, 360);
        let suggester = Arc::new(FixedSuggester(vec![suggestion(20.0, "Hello", "Speaker welcomes everyone")]));
        let moments = KeyMomentSelector::new(SelectionSettings::default())
            .with_suggester(suggester, Duration::from_secs(5))
            .select(&t, None)
            .await;

        assert_eq!(moments[0].description, "Speaker welcomes everyone");
        assert!((moments[0].timestamp - 90.0).abs() < 5.0);
    }

    #[tokio::test]
    async fn test_llm_failure_still_returns_full_count() {
        let t = transcript(1800.0, 360);
        let moments = KeyMomentSelector::new(SelectionSettings::default())
            .with_suggester(Arc::new(FailingSuggester), Duration::from_secs(5))
            .select(&t, None)
            .await;
        assert_eq!(moments.len(), 8);
    }

    #[tokio::test]
    async fn test_llm_timeout_still_returns_full_count() {
        let t = transcript(1800.0, 360);
        let moments = KeyMomentSelector::new(SelectionSettings::default())
            .with_suggester(Arc::new(HangingSuggester), Duration::from_millis(50))
            .select(&t, None)
            .await;
        assert_eq!(moments.len(), 8);
    }

    /// `n` segments from `first` to `duration`, each covering `fill` of its slot.
    fn spread(duration: f64, first: f64, n: usize, fill: f64) -> Transcript {
        let step = (duration - first) / n as f64;
        let segments = (0..n)
            .map(|i| {
                let start = first + i as f64 * step;
                let end = if i + 1 == n { duration } else { start + step * fill };
                Segment::new(start, end, format!("Point {} is explained here.", i))
            })
            .collect::<Vec<_>>();
        let text = segments.iter().map(|s| s.text.clone()).collect::<Vec<_>>().join(" ");
        Transcript::new("sweep", text, segments)
    }

    #[tokio::test]
    async fn test_selection_invariants_across_configurations() {
        for (min, max) in [(2, 3), (5, 20), (4, 4), (10, 30)] {
            let settings = SelectionSettings {
                min_count: min,
                max_count: max,
                ..rules_only()
            };
            let selector = KeyMomentSelector::new(settings);

            for duration in [120.0, 601.0, 1800.0, 3000.0, 7200.0, 20_000.0] {
                let layouts = [
                    ("dense", spread(duration, 0.0, 360, 1.0)),
                    ("sparse", spread(duration, 0.0, 8, 1.0)),
                    ("late", spread(duration, 0.4 * duration, 120, 1.0)),
                    ("gapped", spread(duration, 0.0, 100, 0.5)),
                ];
                for (layout, t) in &layouts {
                    let label = format!("{} min={} max={} d={}", layout, min, max, duration);
                    let moments = selector.select(t, None).await;

                    let expected = (min + (duration / 600.0).floor() as usize).clamp(min, max);
                    assert_eq!(moments.len(), expected, "{}", label);
                    assert_eq!(moments[0].title, "Introduction", "{}", label);
                    assert_eq!(moments[expected - 1].title, "Conclusion", "{}", label);
                    for (i, m) in moments.iter().enumerate().take(expected - 1).skip(1) {
                        assert_eq!(m.title, format!("Key point {}", i), "{}", label);
                    }
                    for pair in moments.windows(2) {
                        assert!(pair[0].timestamp <= pair[1].timestamp, "{}: {:?}", label, pair);
                    }
                    for m in &moments {
                        assert!(m.context_start_time <= m.timestamp, "{}: {:?}", label, m);
                        assert!(m.timestamp <= m.context_end_time, "{}: {:?}", label, m);
                    }
                }
            }
        }
    }

    #[tokio::test]
    async fn test_zero_count_selects_nothing() {
        let settings = SelectionSettings {
            min_count: 0,
            max_count: 0,
            ..rules_only()
        };
        let t = transcript(1800.0, 360);
        assert!(KeyMomentSelector::new(settings).select(&t, None).await.is_empty());
        assert!(choose_slots(&[], &t.segments, 1800.0, 0, 15.0).is_empty());

        let single = choose_slots(&[], &t.segments, 1800.0, 1, 15.0);
        assert_eq!(single.len(), 1);
        assert!((single[0].timestamp - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_crowded_candidates_respect_spacing() {
        let segments: Vec<Segment> = (0..100)
            .map(|i| Segment::new(i as f64 * 10.0, i as f64 * 10.0 + 10.0, "x."))
            .collect();
        let candidates: Vec<Candidate> = (0..20)
            .map(|i| Candidate {
                timestamp: 500.0 + i as f64,
                title: String::new(),
                description: "slide".to_string(),
                moment_type: None,
                source: CandidateSource::ContentBreak,
            })
            .collect();

        let slots = choose_slots(&candidates, &segments, 1000.0, 6, 15.0);
        assert_eq!(slots.len(), 6);
        for pair in slots.windows(2) {
            assert!(pair[1].timestamp - pair[0].timestamp + 1e-6 >= 15.0);
        }
    }

    #[test]
    fn test_bisection_earliest_gap_wins() {
        let segments = vec![Segment::new(0.0, 100.0, "x.")];
        let slots = choose_slots(&[], &segments, 100.0, 3, 15.0);
        let stamps: Vec<f64> = slots.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![5.0, 50.0, 95.0]);

        let slots = choose_slots(&[], &segments, 100.0, 4, 15.0);
        let stamps: Vec<f64> = slots.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps, vec![5.0, 27.5, 50.0, 95.0]);
    }

    #[tokio::test]
    async fn test_same_timestamp_keeps_higher_priority_source() {
        let mut t = transcript(1800.0, 360);
        t.text = format!("{} At 05:00 look at this slide.", t.text);
        let suggester = Arc::new(FixedSuggester(vec![suggestion(300.0, "Slides", "from the llm")]));
        let selector = KeyMomentSelector::new(SelectionSettings::default())
            .with_suggester(suggester, Duration::from_secs(5));

        let candidates = selector.gather_candidates(&t, 1800.0, 8).await;
        let at_300: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| (c.timestamp - 300.0).abs() < 1e-6)
            .collect();
        assert_eq!(at_300.len(), 1);
        assert_eq!(at_300[0].source, CandidateSource::VisualCue);
    }
}
