//! Visual-change bursts around a moment.

use super::{FrameSource, VideoError};
use crate::config::VideoSettings;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolution frames are reduced to before comparison.
const COMPARE_SIZE: (u32, u32) = (320, 180);

/// Parameters of the change scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDetectionConfig {
    /// Length of the scanned window, centered on the base timestamp.
    pub window_seconds: f64,
    /// Frames sampled per second.
    pub sample_rate: f64,
    /// Normalized mean absolute difference that counts as a change.
    pub change_threshold: f64,
    /// Minimum distance between accepted changes, and from the base.
    pub min_separation: f64,
    /// Maximum timestamps returned, base included.
    pub max_results: usize,
}

impl Default for ChangeDetectionConfig {
    fn default() -> Self {
        Self {
            window_seconds: 10.0,
            sample_rate: 2.0,
            change_threshold: 0.15,
            min_separation: 1.0,
            max_results: 5,
        }
    }
}

impl From<&VideoSettings> for ChangeDetectionConfig {
    fn from(settings: &VideoSettings) -> Self {
        Self {
            window_seconds: settings.change_window_seconds,
            sample_rate: settings.sample_rate,
            change_threshold: settings.change_threshold,
            min_separation: settings.min_change_separation_seconds,
            max_results: settings.max_sequence_frames,
        }
    }
}

/// Finds timestamps near a moment where the screen content changes.
pub struct VisualChangeDetector {
    source: Arc<dyn FrameSource>,
    config: ChangeDetectionConfig,
}

impl VisualChangeDetector {
    pub fn new(source: Arc<dyn FrameSource>, config: ChangeDetectionConfig) -> Self {
        Self { source, config }
    }

    /// Sorted change timestamps, always including `base`.
    ///
    /// Never fails: if the video cannot be opened or probed the result is
    /// just `[base]`.
    pub fn detect(&self, video: &Path, base: f64) -> Vec<f64> {
        match self.try_detect(video, base) {
            Ok(timestamps) => timestamps,
            Err(e) => {
                warn!("Visual change detection failed at {:.1}s: {}", base, e);
                vec![base]
            }
        }
    }

    /// Like [`detect`](Self::detect) but reports why the video could not be read.
    pub fn try_detect(&self, video: &Path, base: f64) -> Result<Vec<f64>, VideoError> {
        let info = self.source.probe(video)?;

        let half = self.config.window_seconds.max(0.0) / 2.0;
        let start = (base - half).max(0.0);
        let end = if info.duration > 0.0 {
            (base + half).min(info.duration)
        } else {
            base + half
        };
        let step = 1.0 / self.config.sample_rate.max(f64::EPSILON);

        let mut changes: Vec<f64> = Vec::new();
        let mut previous: Option<GrayImage> = None;
        let mut k = 0u32;

        loop {
            let t = start + step * k as f64;
            if t > end + 1e-9 {
                break;
            }
            k += 1;

            let frame = match self.source.read_frame(video, &info, info.frame_index(t)) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!("Skipping sample at {:.2}s: {}", t, e);
                    continue;
                }
            };
            let current = downsize_gray(&frame);

            if let Some(prev) = &previous {
                let diff = mean_abs_diff(prev, &current);
                if diff > self.config.change_threshold && self.is_separated(t, base, &changes) {
                    debug!("Visual change at {:.2}s (diff {:.3})", t, diff);
                    changes.push(t);
                }
            }
            previous = Some(current);
        }

        Ok(cap_around_base(base, changes, self.config.max_results))
    }

    fn is_separated(&self, t: f64, base: f64, accepted: &[f64]) -> bool {
        let min = self.config.min_separation;
        (t - base).abs() >= min && accepted.iter().all(|a| (t - a).abs() >= min)
    }
}

fn downsize_gray(frame: &RgbImage) -> GrayImage {
    let small = imageops::resize(frame, COMPARE_SIZE.0, COMPARE_SIZE.1, FilterType::Triangle);
    imageops::grayscale(&small)
}

/// Mean absolute pixel difference scaled to `[0, 1]`.
fn mean_abs_diff(a: &GrayImage, b: &GrayImage) -> f64 {
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| x.abs_diff(*y) as u64)
        .sum();
    let n = a.as_raw().len().min(b.as_raw().len());
    if n == 0 {
        return 0.0;
    }
    total as f64 / (n as f64 * 255.0)
}

/// Keep `base` plus at most `max_results - 1` changes, balanced before and
/// after the base and evenly subsampled on each side.
fn cap_around_base(base: f64, changes: Vec<f64>, max_results: usize) -> Vec<f64> {
    let slots = max_results.saturating_sub(1);
    let (before, after): (Vec<f64>, Vec<f64>) = changes.into_iter().partition(|t| *t < base);

    let (keep_before, keep_after) = if before.len() + after.len() <= slots {
        (before.len(), after.len())
    } else {
        let mut keep_before = before.len().min(slots / 2);
        let keep_after = after.len().min(slots - keep_before);
        keep_before = before.len().min(slots - keep_after);
        (keep_before, keep_after)
    };

    let mut result = vec![base];
    result.extend(subsample(&before, keep_before));
    result.extend(subsample(&after, keep_after));
    result.sort_by(|a, b| a.total_cmp(b));
    result
}

fn subsample(values: &[f64], keep: usize) -> Vec<f64> {
    if keep >= values.len() {
        return values.to_vec();
    }
    (0..keep)
        .map(|i| values[((i as f64 + 0.5) * values.len() as f64 / keep as f64) as usize])
        .collect()
}
