//! Timestamp to frame extraction with clamping, retry and neighbor averaging.

use super::enhance::{average_frames, EnhancementConfig, ImageEnhancer};
use super::{FrameSource, VideoError, VideoInfo};
use crate::config::{EnhancementSettings, VideoSettings};
use image::RgbImage;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Frames stepped back when the target frame cannot be decoded.
const RETRY_OFFSET: u64 = 10;
/// Neighbor offsets averaged with the target frame.
const NEIGHBOR_OFFSETS: [i64; 4] = [-2, -1, 1, 2];

/// Options for a single frame extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub enhance: bool,
    pub average_neighbors: bool,
    pub enhancement: EnhancementConfig,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            enhance: true,
            average_neighbors: true,
            enhancement: EnhancementConfig::default(),
        }
    }
}

impl ExtractOptions {
    /// Neighbor averaging only applies to enhanced UI captures.
    pub fn from_settings(video: &VideoSettings, enhancement: &EnhancementSettings) -> Self {
        Self {
            enhance: enhancement.enabled,
            average_neighbors: video.average_neighbors && enhancement.enabled && enhancement.ui_capture,
            enhancement: EnhancementConfig::from(enhancement),
        }
    }

    /// Raw frame: no averaging, no enhancement.
    pub fn raw() -> Self {
        Self {
            enhance: false,
            average_neighbors: false,
            ..Default::default()
        }
    }
}

/// A decoded (and possibly enhanced) frame.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub image: RgbImage,
    /// Timestamp actually used, after clamping.
    pub timestamp: f64,
    /// Frame that was decoded, after any retry.
    pub frame_index: u64,
}

/// Extracts frames at timestamps.
pub struct FrameSampler {
    source: Arc<dyn FrameSource>,
}

impl FrameSampler {
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        Self { source }
    }

    /// Clamp a timestamp into the video: negative becomes 0, past the end
    /// becomes one second before the end.
    pub fn clamp_timestamp(info: &VideoInfo, timestamp: f64) -> f64 {
        if !timestamp.is_finite() || timestamp < 0.0 {
            return 0.0;
        }
        if info.duration > 0.0 && timestamp > info.duration {
            let clamped = (info.duration - 1.0).max(0.0);
            warn!(
                "Timestamp {:.2}s is beyond video duration {:.2}s, using {:.2}s",
                timestamp, info.duration, clamped
            );
            return clamped;
        }
        timestamp
    }

    /// Extract the frame at `timestamp`.
    ///
    /// A failed read is retried once ten frames earlier. An `Err` means no
    /// screenshot is available for this timestamp.
    pub fn extract_frame(
        &self,
        video: &Path,
        timestamp: f64,
        options: &ExtractOptions,
    ) -> Result<SampledFrame, VideoError> {
        let info = self.source.probe(video)?;
        let timestamp = Self::clamp_timestamp(&info, timestamp);
        let target = info.frame_index(timestamp);

        let (image, frame_index) = match self.source.read_frame(video, &info, target) {
            Ok(image) => (image, target),
            Err(e) if target >= RETRY_OFFSET => {
                let retry = target - RETRY_OFFSET;
                warn!("Frame {} unreadable ({}), retrying at frame {}", target, e, retry);
                (self.source.read_frame(video, &info, retry)?, retry)
            }
            Err(e) => return Err(e),
        };

        let image = if options.average_neighbors {
            self.average_with_neighbors(video, &info, frame_index, image)
        } else {
            image
        };

        let image = if options.enhance {
            ImageEnhancer::new(options.enhancement.clone()).enhance(&image)
        } else {
            image
        };

        Ok(SampledFrame {
            image,
            timestamp,
            frame_index,
        })
    }

    /// Average the frame with the neighbors at ±1 and ±2 that decode with
    /// the same dimensions. Unreadable neighbors are skipped.
    fn average_with_neighbors(
        &self,
        video: &Path,
        info: &VideoInfo,
        frame_index: u64,
        image: RgbImage,
    ) -> RgbImage {
        let mut frames = vec![image];
        for offset in NEIGHBOR_OFFSETS {
            let Some(neighbor) = frame_index.checked_add_signed(offset) else {
                continue;
            };
            if neighbor > info.last_frame() {
                continue;
            }
            match self.source.read_frame(video, info, neighbor) {
                Ok(frame) if frame.dimensions() == frames[0].dimensions() => frames.push(frame),
                Ok(_) => debug!("Neighbor frame {} has different dimensions", neighbor),
                Err(e) => debug!("Neighbor frame {} unreadable: {}", neighbor, e),
            }
        }

        debug!("Averaging {} frames around frame {}", frames.len(), frame_index);
        match average_frames(&frames) {
            Some(averaged) => averaged,
            None => frames.swap_remove(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::testing::SyntheticSource;

    fn plain() -> ExtractOptions {
        ExtractOptions::raw()
    }

    #[test]
    fn test_extract_at_timestamp() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |i| (i % 256) as u8));
        let sampler = FrameSampler::new(source.clone());

        let frame = sampler.extract_frame(Path::new("video.mp4"), 2.0, &plain()).unwrap();
        assert_eq!(frame.frame_index, 50);
        assert_eq!(frame.timestamp, 2.0);
        assert_eq!(frame.image.get_pixel(0, 0).0, [50, 50, 50]);
    }

    #[test]
    fn test_timestamp_past_end_is_clamped() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |_| 100));
        let sampler = FrameSampler::new(source);

        let frame = sampler.extract_frame(Path::new("video.mp4"), 42.0, &plain()).unwrap();
        assert_eq!(frame.timestamp, 9.0);
        assert_eq!(frame.frame_index, 225);
    }

    #[test]
    fn test_negative_timestamp_is_zero() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |_| 100));
        let frame = FrameSampler::new(source)
            .extract_frame(Path::new("video.mp4"), -3.0, &plain())
            .unwrap();
        assert_eq!(frame.frame_index, 0);
    }

    #[test]
    fn test_failed_read_retries_earlier() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |i| i as u8).failing_on([50]));
        let sampler = FrameSampler::new(source.clone());

        let frame = sampler.extract_frame(Path::new("video.mp4"), 2.0, &plain()).unwrap();
        assert_eq!(frame.frame_index, 40);
        assert_eq!(source.reads(), vec![50, 40]);
    }

    #[test]
    fn test_no_retry_near_start() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |_| 0).failing_on([5]));
        let result = FrameSampler::new(source.clone()).extract_frame(Path::new("video.mp4"), 0.2, &plain());
        assert!(matches!(result, Err(VideoError::Decode { frame_index: 5, .. })));
        assert_eq!(source.reads(), vec![5]);
    }

    #[test]
    fn test_both_attempts_fail() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |_| 0).failing_on([50, 40]));
        let result = FrameSampler::new(source).extract_frame(Path::new("video.mp4"), 2.0, &plain());
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_video_is_error() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |_| 0));
        let result = FrameSampler::new(source).extract_frame(Path::new("missing.mp4"), 2.0, &plain());
        assert!(matches!(result, Err(VideoError::NotFound(_))));
    }

    #[test]
    fn test_neighbor_averaging() {
        // Brightness equals the frame index, so the mean of 48..=52 is 50.
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |i| i as u8).failing_on([49]));
        let options = ExtractOptions {
            enhance: false,
            average_neighbors: true,
            ..Default::default()
        };
        let frame = FrameSampler::new(source)
            .extract_frame(Path::new("video.mp4"), 2.0, &options)
            .unwrap();
        // 49 fails: mean of 50, 48, 51, 52 rounds to 50.
        assert_eq!(frame.image.get_pixel(3, 3).0, [50, 50, 50]);
    }

    #[test]
    fn test_neighbors_stay_inside_video() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |_| 10));
        let options = ExtractOptions {
            enhance: false,
            average_neighbors: true,
            ..Default::default()
        };
        FrameSampler::new(source.clone())
            .extract_frame(Path::new("video.mp4"), 0.0, &options)
            .unwrap();
        assert_eq!(source.reads(), vec![0, 1, 2]);
    }

    #[test]
    fn test_options_from_settings() {
        let mut enhancement = EnhancementSettings::default();
        let video = VideoSettings::default();
        assert!(ExtractOptions::from_settings(&video, &enhancement).average_neighbors);

        enhancement.ui_capture = false;
        assert!(!ExtractOptions::from_settings(&video, &enhancement).average_neighbors);

        enhancement.enabled = false;
        let options = ExtractOptions::from_settings(&video, &enhancement);
        assert!(!options.enhance && !options.average_neighbors);
    }

    #[test]
    fn test_enhanced_frame_keeps_size() {
        let source = Arc::new(SyntheticSource::new(10.0, 25.0, |i| (i * 7 % 256) as u8));
        let frame = FrameSampler::new(source)
            .extract_frame(Path::new("video.mp4"), 5.0, &ExtractOptions::default())
            .unwrap();
        assert_eq!(frame.image.dimensions(), (64, 36));
    }
}
