//! Pipeline for Glimt.
//!
//! Coordinates moment selection and the per-moment screenshot work.

use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::moments::{KeyMoment, KeyMomentSelector, MomentSuggester, OpenAISuggester, SequenceInfo};
use crate::openai::is_api_key_configured;
use crate::store::TranscriptStore;
use crate::transcript::{validate_id, Transcript};
use crate::video::{
    ChangeDetectionConfig, ExtractOptions, FfmpegSource, FrameSampler,
    FrameSource, ScreenshotWriter, VisualChangeDetector,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Selects key moments and captures their screenshots.
pub struct Pipeline {
    settings: Settings,
    selector: KeyMomentSelector,
    source: Arc<dyn FrameSource>,
    store: Option<Arc<dyn TranscriptStore>>,
}

impl Pipeline {
    /// Create a pipeline from settings, using ffmpeg for video access.
    ///
    /// The LLM suggester is attached only when it is enabled and an API key
    /// is configured.
    pub fn new(settings: Settings) -> Result<Self> {
        let mut selector = KeyMomentSelector::new(settings.selection.clone())
            .with_max_transcript_chars(settings.llm.max_transcript_chars);

        if settings.selection.use_llm {
            if is_api_key_configured() {
                let prompts = Prompts::load(
                    settings.prompts.custom_dir.as_deref(),
                    Some(&settings.prompts.variables),
                )?;
                let suggester: Arc<dyn MomentSuggester> =
                    Arc::new(OpenAISuggester::new(&settings.llm)?.with_prompts(prompts));
                selector = selector
                    .with_suggester(suggester, Duration::from_secs(settings.llm.timeout_seconds));
                info!("LLM suggestions enabled ({})", settings.llm.model);
            } else {
                warn!("OPENAI_API_KEY not set, selecting moments without LLM suggestions");
            }
        }

        let source: Arc<dyn FrameSource> = Arc::new(FfmpegSource::from_settings(&settings.video));
        Ok(Self::with_components(settings, selector, source))
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        selector: KeyMomentSelector,
        source: Arc<dyn FrameSource>,
    ) -> Self {
        Self {
            settings,
            selector,
            source,
            store: None,
        }
    }

    /// Persist moments to `store` after processing.
    pub fn with_store(mut self, store: Arc<dyn TranscriptStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Duration of the video, or `None` if it cannot be probed.
    pub async fn video_duration(&self, video: &Path) -> Option<f64> {
        let source = self.source.clone();
        let path = video.to_path_buf();
        match tokio::task::spawn_blocking(move || source.probe(&path)).await {
            Ok(Ok(info)) if info.duration > 0.0 => Some(info.duration),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                warn!("Could not probe {}: {}", video.display(), e);
                None
            }
            Err(e) => {
                warn!("Probe task failed: {}", e);
                None
            }
        }
    }

    /// Select moments without touching the video frames.
    ///
    /// `video_duration` is only used when the transcript has no segments.
    pub async fn select_moments(&self, transcript: &Transcript, video_duration: Option<f64>) -> Vec<KeyMoment> {
        self.selector.select(transcript, video_duration).await
    }

    /// Select moments and capture screenshots into
    /// `<screenshot_root>/<transcript id>/`.
    ///
    /// Frame failures are isolated to their moment: such a moment is still
    /// returned, just without screenshots.
    #[instrument(skip(self, transcript), fields(transcript_id = %transcript.id))]
    pub async fn process(
        &self,
        transcript: &Transcript,
        video: &Path,
        screenshot_root: &Path,
    ) -> Result<ProcessResult> {
        validate_id(&transcript.id)?;
        let video_duration = if transcript.has_segments() {
            None
        } else {
            self.video_duration(video).await
        };
        let mut moments = self.select_moments(transcript, video_duration).await;
        let screenshot_dir = screenshot_root.join(&transcript.id);

        let capturer = Arc::new(MomentCapturer {
            source: self.source.clone(),
            writer: ScreenshotWriter::from_settings(&screenshot_dir, &self.settings.screenshots)?,
            options: ExtractOptions::from_settings(&self.settings.video, &self.settings.enhancement),
            changes: self
                .settings
                .video
                .detect_sequences
                .then(|| ChangeDetectionConfig::from(&self.settings.video)),
            video: video.to_path_buf(),
            transcript_id: transcript.id.clone(),
        });

        let mut screenshots_saved = 0;
        for (index, moment) in moments.iter_mut().enumerate() {
            let capturer = capturer.clone();
            let timestamp = moment.timestamp;
            let capture = match tokio::task::spawn_blocking(move || capturer.capture(index, timestamp)).await {
                Ok(capture) => capture,
                Err(e) => {
                    warn!("Screenshot task for moment {} failed: {}", index, e);
                    continue;
                }
            };
            screenshots_saved += capture.saved;
            moment.screenshot_path = capture.screenshot_path;
            moment.sequence = capture.sequence;
        }

        info!(
            "Processed {} moments, saved {} screenshots to {}",
            moments.len(),
            screenshots_saved,
            screenshot_dir.display()
        );

        let stored = match &self.store {
            Some(store) => match store.attach_key_moments(&transcript.id, &moments).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to store key moments for {}: {}", transcript.id, e);
                    false
                }
            },
            None => false,
        };

        Ok(ProcessResult {
            transcript_id: transcript.id.clone(),
            key_moments: moments,
            screenshot_dir,
            screenshots_saved,
            stored,
            processed_at: Utc::now(),
        })
    }
}

/// Result of processing a transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub transcript_id: String,
    pub key_moments: Vec<KeyMoment>,
    pub screenshot_dir: PathBuf,
    /// Files written, sequence frames included.
    pub screenshots_saved: usize,
    /// Whether the moments were attached to the transcript store.
    pub stored: bool,
    pub processed_at: DateTime<Utc>,
}

impl ProcessResult {
    pub fn moments_with_screenshots(&self) -> usize {
        self.key_moments
            .iter()
            .filter(|m| m.screenshot_path.is_some())
            .count()
    }
}

/// Synchronous screenshot work for one moment.
struct MomentCapturer {
    source: Arc<dyn FrameSource>,
    writer: ScreenshotWriter,
    options: ExtractOptions,
    changes: Option<ChangeDetectionConfig>,
    video: PathBuf,
    transcript_id: String,
}

#[derive(Debug, Default)]
struct Capture {
    screenshot_path: Option<String>,
    sequence: Option<SequenceInfo>,
    saved: usize,
}

impl MomentCapturer {
    fn capture(&self, index: usize, timestamp: f64) -> Capture {
        let sampler = FrameSampler::new(self.source.clone());
        let mut capture = Capture::default();

        match sampler.extract_frame(&self.video, timestamp, &self.options) {
            Ok(frame) => {
                let result = self
                    .writer
                    .save_moment(&frame.image, &self.transcript_id, index, None, timestamp);
                if result.success {
                    capture.saved += 1;
                    capture.screenshot_path = result.web_path;
                }
            }
            Err(e) => {
                warn!("No screenshot for moment {} at {:.1}s: {}", index, timestamp, e);
                return capture;
            }
        }

        let Some(config) = &self.changes else {
            return capture;
        };
        let timestamps = VisualChangeDetector::new(self.source.clone(), config.clone())
            .detect(&self.video, timestamp);
        if timestamps.len() < 2 {
            return capture;
        }

        let mut sequence = Vec::with_capacity(timestamps.len());
        for (seq, t) in timestamps.into_iter().enumerate() {
            let frame = match sampler.extract_frame(&self.video, t, &self.options) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!("Skipping sequence frame at {:.1}s: {}", t, e);
                    continue;
                }
            };
            let result = self
                .writer
                .save_moment(&frame.image, &self.transcript_id, index, Some(seq), t);
            if let Some(path) = result.web_path {
                capture.saved += 1;
                sequence.push(path);
            }
        }

        if !sequence.is_empty() {
            capture.sequence = Some(SequenceInfo::new(sequence));
        }
        capture
    }
}
