//! Frame command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{format_timestamp, parse_timestamp_str};
use crate::video::{ExtractOptions, FfmpegSource, FrameSampler, ScreenshotFormat, ScreenshotWriter};
use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;

/// Run the frame command: extract and save a single frame.
pub async fn run_frame(video: &Path, timestamp: &str, output: &Path, no_enhance: bool, settings: Settings) -> Result<()> {
    preflight::check(Operation::Capture, &settings)?;

    let seconds = parse_timestamp_str(timestamp);
    let format: ScreenshotFormat = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .parse()?;
    let file_name = output
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid output file: {}", output.display()))?
        .to_string();
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    let options = if no_enhance {
        ExtractOptions::raw()
    } else {
        ExtractOptions::from_settings(&settings.video, &settings.enhancement)
    };
    let writer = ScreenshotWriter::from_settings(dir, &settings.screenshots)?.with_format(format);
    let sampler = FrameSampler::new(Arc::new(FfmpegSource::from_settings(&settings.video)));
    let video = video.to_path_buf();

    let spinner = Output::spinner(&format!("Extracting frame at {}...", format_timestamp(seconds)));
    let result = tokio::task::spawn_blocking(move || {
        sampler
            .extract_frame(&video, seconds, &options)
            .map(|frame| (frame.timestamp, writer.save(&frame.image, &file_name)))
    })
    .await?;
    spinner.finish_and_clear();

    let (used, saved) = result?;
    match saved.path {
        Some(path) if saved.success => {
            Output::success(&format!("Saved frame at {} to {}", format_timestamp(used), path.display()));
            Ok(())
        }
        _ => Err(anyhow!("Failed to save frame to {}", output.display())),
    }
}
