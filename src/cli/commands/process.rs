//! Process command implementation.

use super::write_moments_json;
use crate::cli::preflight::{self, Operation};
use crate::cli::{format_duration, Output};
use crate::config::Settings;
use crate::pipeline::Pipeline;
use crate::store::JsonFileStore;
use crate::transcript::Transcript;
use crate::video::ScreenshotFormat;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Arguments of the process command.
#[derive(Debug, Clone)]
pub struct ProcessArgs {
    pub transcript: PathBuf,
    pub video: PathBuf,
    pub id: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub no_llm: bool,
    pub no_sequences: bool,
    pub no_enhance: bool,
    pub output: Option<PathBuf>,
    pub store: bool,
}

/// Run the process command: selection plus screenshots.
pub async fn run_process(args: ProcessArgs, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Capture, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'glimt doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if let Some(format) = &args.format {
        let format: ScreenshotFormat = format.parse()?;
        settings.screenshots.format = format.extension().to_string();
    }
    if args.no_llm {
        settings.selection.use_llm = false;
    }
    if args.no_sequences {
        settings.video.detect_sequences = false;
    }
    if args.no_enhance {
        settings.enhancement.enabled = false;
    }

    let mut transcript = Transcript::load(&args.transcript)?;
    if let Some(id) = &args.id {
        transcript.id = id.clone();
    }
    if !args.video.exists() {
        Output::warning(&format!(
            "Video {} not found, moments will have no screenshots.",
            args.video.display()
        ));
    }

    let screenshot_root = args
        .output_dir
        .clone()
        .unwrap_or_else(|| settings.screenshots_dir());
    let transcripts_dir = settings.transcripts_dir();

    let mut pipeline = Pipeline::new(settings)?;
    if args.store {
        pipeline = pipeline.with_store(Arc::new(JsonFileStore::new(transcripts_dir)));
    }

    Output::info(&format!("Processing: {}", transcript.id));
    let spinner = Output::spinner("Selecting moments and capturing screenshots...");
    let result = pipeline.process(&transcript, &args.video, &screenshot_root).await;
    spinner.finish_and_clear();
    let result = result?;

    for moment in &result.key_moments {
        Output::moment(moment);
    }
    println!();

    Output::success(&format!(
        "{} key moments, {} with screenshots",
        result.key_moments.len(),
        result.moments_with_screenshots()
    ));
    if let Some(duration) = transcript.duration() {
        Output::kv("Duration", &format_duration(duration));
    }
    Output::kv("Files written", &result.screenshots_saved.to_string());
    Output::kv("Directory", &result.screenshot_dir.display().to_string());
    if args.store {
        if result.stored {
            Output::success(&format!("Attached key moments to stored transcript {}", result.transcript_id));
        } else {
            Output::warning("Key moments could not be stored; see the log for details.");
        }
    }

    if let Some(path) = &args.output {
        write_moments_json(path, &result.key_moments)?;
        Output::info(&format!("Wrote {}", path.display()));
    }

    Ok(())
}
