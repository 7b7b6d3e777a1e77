//! ffprobe/ffmpeg backed frame source.

use super::{FrameSource, VideoError, VideoInfo};
use crate::config::VideoSettings;
use image::{ImageFormat, RgbImage};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Reads metadata with ffprobe and decodes single frames with ffmpeg.
///
/// Each call spawns its own process; no handle is shared between reads.
#[derive(Debug, Clone)]
pub struct FfmpegSource {
    ffmpeg_path: String,
    ffprobe_path: String,
}

impl Default for FfmpegSource {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegSource {
    pub fn new(ffmpeg_path: &str, ffprobe_path: &str) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.to_string(),
            ffprobe_path: ffprobe_path.to_string(),
        }
    }

    pub fn from_settings(settings: &VideoSettings) -> Self {
        Self::new(&settings.ffmpeg_path, &settings.ffprobe_path)
    }
}

impl FrameSource for FfmpegSource {
    fn probe(&self, video: &Path) -> Result<VideoInfo, VideoError> {
        if !video.exists() {
            return Err(VideoError::NotFound(video.to_path_buf()));
        }

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(video)
            .output()
            .map_err(|source| VideoError::Tool {
                tool: self.ffprobe_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(VideoError::Probe(format!(
                "ffprobe exited with {}",
                output.status
            )));
        }

        let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| VideoError::Probe(format!("Invalid ffprobe output: {}", e)))?;
        let info = probe.into_info()?;
        debug!(
            "Probed {}: {:.2} fps, {} frames, {:.1}s, {}x{}",
            video.display(),
            info.fps,
            info.frame_count,
            info.duration,
            info.width,
            info.height
        );
        Ok(info)
    }

    fn read_frame(
        &self,
        video: &Path,
        info: &VideoInfo,
        frame_index: u64,
    ) -> Result<RgbImage, VideoError> {
        let seek = format!("{:.3}", info.frame_time(frame_index));

        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-ss", &seek, "-i"])
            .arg(video)
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "png", "-"])
            .output()
            .map_err(|source| VideoError::Tool {
                tool: self.ffmpeg_path.clone(),
                source,
            })?;

        if !output.status.success() || output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VideoError::Decode {
                frame_index,
                reason: if stderr.trim().is_empty() {
                    "no frame produced".to_string()
                } else {
                    stderr.trim().to_string()
                },
            });
        }

        let image = image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)?;
        Ok(image.to_rgb8())
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse an ffprobe rate such as `"30000/1001"` or `"25"`.
fn parse_rate(rate: &str) -> Option<f64> {
    let value = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.trim().parse().ok()?,
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

impl FfprobeOutput {
    fn into_info(self) -> Result<VideoInfo, VideoError> {
        let stream = self
            .streams
            .into_iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or(VideoError::NoVideoStream)?;

        let fps = stream
            .avg_frame_rate
            .as_deref()
            .and_then(parse_rate)
            .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_rate))
            .ok_or_else(|| VideoError::Probe("Unknown frame rate".to_string()))?;

        let duration = stream
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .or_else(|| {
                self.format
                    .and_then(|f| f.duration)
                    .and_then(|d| d.parse::<f64>().ok())
            })
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);

        let frame_count = stream
            .nb_frames
            .as_deref()
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .unwrap_or_else(|| (duration * fps).round() as u64);

        if frame_count == 0 {
            return Err(VideoError::NoVideoStream);
        }

        Ok(VideoInfo {
            fps,
            frame_count,
            duration,
            width: stream.width.unwrap_or(0),
            height: stream.height.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate() {
        assert_eq!(parse_rate("25/1"), Some(25.0));
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("24"), Some(24.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("abc"), None);
    }

    #[test]
    fn test_probe_output_to_info() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio", "duration": "61.0"},
                {"codec_type": "video", "width": 1280, "height": 720,
                 "r_frame_rate": "30/1", "avg_frame_rate": "30/1",
                 "nb_frames": "1800", "duration": "60.0"}
            ],
            "format": {"duration": "61.0"}
        }"#;
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        let info = probe.into_info().unwrap();
        assert_eq!(info.fps, 30.0);
        assert_eq!(info.frame_count, 1800);
        assert_eq!(info.duration, 60.0);
        assert_eq!((info.width, info.height), (1280, 720));
    }

    #[test]
    fn test_probe_falls_back_to_format_duration() {
        let json = r#"{
            "streams": [{"codec_type": "video", "avg_frame_rate": "0/0", "r_frame_rate": "25/1"}],
            "format": {"duration": "10.0"}
        }"#;
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        let info = probe.into_info().unwrap();
        assert_eq!(info.fps, 25.0);
        assert_eq!(info.frame_count, 250);
        assert_eq!(info.duration, 10.0);
    }

    #[test]
    fn test_probe_without_video_stream() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        let probe: FfprobeOutput = serde_json::from_str(json).unwrap();
        assert!(matches!(probe.into_info(), Err(VideoError::NoVideoStream)));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let source = FfmpegSource::default();
        let result = source.probe(Path::new("/definitely/not/here.mp4"));
        assert!(matches!(result, Err(VideoError::NotFound(_))));
    }
}
