//! Moments command implementation.

use super::write_moments_json;
use crate::cli::{format_duration, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::transcript::Transcript;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Run the moments command: selection only, no video access.
pub async fn run_moments(
    transcript_path: &Path,
    duration: Option<f64>,
    count: Option<usize>,
    no_llm: bool,
    no_visual_cues: bool,
    output: Option<PathBuf>,
    mut settings: Settings,
) -> Result<()> {
    if let Some(count) = count {
        settings.selection.dynamic_count = false;
        settings.selection.fixed_count = count;
    }
    if no_llm {
        settings.selection.use_llm = false;
    }
    if no_visual_cues {
        settings.selection.use_visual_cues = false;
    }
    settings.validate()?;

    let transcript = Transcript::load(transcript_path)?;
    if !transcript.has_segments() {
        Output::warning("Transcript has no segments, moments will be evenly spaced.");
    }

    let pipeline = Pipeline::new(settings)?;
    let spinner = Output::spinner("Selecting key moments...");
    let moments = pipeline.select_moments(&transcript, duration).await;
    spinner.finish_and_clear();

    match output {
        Some(path) => {
            write_moments_json(&path, &moments)?;
            if path != Path::new("-") {
                Output::success(&format!(
                    "Wrote {} key moments to {}",
                    moments.len(),
                    path.display()
                ));
            }
        }
        None => {
            Output::header(&format!("Key moments for {}", transcript.id));
            if let Some(shown) = shown_duration(&transcript, duration) {
                Output::kv("Duration", &shown);
            }
            for moment in &moments {
                Output::moment(moment);
            }
            println!();
        }
    }

    Ok(())
}

/// Duration for the header: the transcript's own, else the `--duration` hint.
fn shown_duration(transcript: &Transcript, hint: Option<f64>) -> Option<String> {
    transcript.duration().or(hint).map(format_duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;

    #[test]
    fn test_shown_duration() {
        let empty = Transcript::new("t", "", Vec::new());
        assert_eq!(shown_duration(&empty, None), None);
        assert_eq!(shown_duration(&empty, Some(1800.0)).as_deref(), Some("30m 0s"));

        let spoken = Transcript::new("t", "hi", vec![Segment::new(0.0, 3725.0, "hi")]);
        assert_eq!(shown_duration(&spoken, Some(10.0)).as_deref(), Some("1h 2m 5s"));
    }
}
