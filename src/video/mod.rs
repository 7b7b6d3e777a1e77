//! Frame-level video analysis.
//!
//! Video access goes through [`FrameSource`]; every read is independent, so a
//! failure on one moment cannot affect another. [`FfmpegSource`] is the
//! production implementation.

mod changes;
mod enhance;
mod ffmpeg;
mod sampler;
mod writer;

pub use changes::{ChangeDetectionConfig, VisualChangeDetector};
pub use enhance::{average_frames, EnhancementConfig, ImageEnhancer};
pub use ffmpeg::FfmpegSource;
pub use sampler::{ExtractOptions, FrameSampler, SampledFrame};
pub use writer::{
    parse_screenshot_filename, recover_moments_from_dir, screenshot_filename, web_path,
    PngCompression, SaveResult, ScreenshotFormat, ScreenshotName, ScreenshotWriter,
};

use image::RgbImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the video layer.
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Video file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to probe video: {0}")]
    Probe(String),

    #[error("Video has no usable video stream")]
    NoVideoStream,

    #[error("Failed to decode frame {frame_index}: {reason}")]
    Decode { frame_index: u64, reason: String },

    #[error("Failed to run {tool}: {source}")]
    Tool {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Container metadata needed to map timestamps to frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoInfo {
    pub fps: f64,
    pub frame_count: u64,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

impl VideoInfo {
    /// Index of the last decodable frame.
    pub fn last_frame(&self) -> u64 {
        self.frame_count.saturating_sub(1)
    }

    /// Frame index for a timestamp, clamped to the video.
    pub fn frame_index(&self, timestamp: f64) -> u64 {
        let raw = (timestamp.max(0.0) * self.fps).round();
        if raw.is_finite() {
            (raw as u64).min(self.last_frame())
        } else {
            0
        }
    }

    /// Presentation time of a frame index.
    pub fn frame_time(&self, frame_index: u64) -> f64 {
        if self.fps > 0.0 {
            frame_index as f64 / self.fps
        } else {
            0.0
        }
    }
}

/// Something that can read metadata and individual frames from a video.
pub trait FrameSource: Send + Sync {
    fn probe(&self, video: &Path) -> Result<VideoInfo, VideoError>;

    fn read_frame(
        &self,
        video: &Path,
        info: &VideoInfo,
        frame_index: u64,
    ) -> Result<RgbImage, VideoError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> VideoInfo {
        VideoInfo {
            fps: 25.0,
            frame_count: 250,
            duration: 10.0,
            width: 640,
            height: 360,
        }
    }

    #[test]
    fn test_frame_index_rounds_and_clamps() {
        let info = info();
        assert_eq!(info.frame_index(0.0), 0);
        assert_eq!(info.frame_index(1.02), 26);
        assert_eq!(info.frame_index(-5.0), 0);
        assert_eq!(info.frame_index(100.0), 249);
    }

    #[test]
    fn test_frame_time() {
        assert_eq!(info().frame_time(50), 2.0);
    }
}
