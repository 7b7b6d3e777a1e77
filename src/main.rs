//! Glimt CLI entry point.

use anyhow::Result;
use clap::Parser;
use glimt::cli::commands::{self, ProcessArgs};
use glimt::cli::{Cli, Commands};
use glimt::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Validation waits until logging is up, and doctor reports it instead
    let settings = Settings::read_from(cli.config.as_ref())?;

    // Initialize logging
    let log_level = cli.log_level(&settings.general.log_level);

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("glimt={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if !cli.tolerates_invalid_config() {
        settings.validate()?;
    }

    match cli.command {
        Commands::Moments {
            transcript,
            duration,
            count,
            no_llm,
            no_visual_cues,
            output,
        } => {
            commands::run_moments(&transcript, duration, count, no_llm, no_visual_cues, output, settings).await?;
        }

        Commands::Process {
            transcript,
            video,
            id,
            output_dir,
            format,
            no_llm,
            no_sequences,
            no_enhance,
            output,
            store,
        } => {
            let args = ProcessArgs {
                transcript,
                video,
                id,
                output_dir,
                format,
                no_llm,
                no_sequences,
                no_enhance,
                output,
                store,
            };
            commands::run_process(args, settings).await?;
        }

        Commands::Frame {
            video,
            timestamp,
            output,
            no_enhance,
        } => {
            commands::run_frame(&video, &timestamp, &output, no_enhance, settings).await?;
        }

        Commands::Changes { video, timestamp, window } => {
            commands::run_changes(&video, &timestamp, window, settings).await?;
        }

        Commands::Recover { id, dir, store } => {
            commands::run_recover(&id, dir, store, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, cli.config.as_ref())?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, cli.config)?;
        }
    }

    Ok(())
}
