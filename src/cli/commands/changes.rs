//! Changes command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::transcript::{format_timestamp, parse_timestamp_str};
use crate::video::{ChangeDetectionConfig, FfmpegSource, VisualChangeDetector};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the changes command: print visual-change timestamps around a moment.
pub async fn run_changes(video: &Path, timestamp: &str, window: Option<f64>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Capture, &settings)?;

    let base = parse_timestamp_str(timestamp);
    let mut config = ChangeDetectionConfig::from(&settings.video);
    if let Some(window) = window {
        config.window_seconds = window;
    }
    let window_seconds = config.window_seconds;

    let detector = VisualChangeDetector::new(Arc::new(FfmpegSource::from_settings(&settings.video)), config);
    let video = video.to_path_buf();

    let spinner = Output::spinner("Scanning for visual changes...");
    let result = tokio::task::spawn_blocking(move || detector.try_detect(&video, base)).await?;
    spinner.finish_and_clear();

    let timestamps = match result {
        Ok(timestamps) => timestamps,
        Err(e) => {
            Output::warning(&format!("Could not scan the video: {}", e));
            vec![base]
        }
    };

    Output::header(&format!(
        "Visual changes within {:.0}s of {}",
        window_seconds / 2.0,
        format_timestamp(base)
    ));
    for t in &timestamps {
        let marker = if (*t - base).abs() < f64::EPSILON { " (base)" } else { "" };
        Output::list_item(&format!("{} ({:.2}s){}", format_timestamp(*t), t, marker));
    }

    Ok(())
}
