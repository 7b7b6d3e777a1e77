//! CLI module for Glimt.

pub mod commands;
mod output;
pub mod preflight;

pub use output::{format_duration, Output};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Glimt - key moments and synchronized screenshots
///
/// Picks the moments of a talk or screencast worth illustrating and captures
/// legible screenshots of them from the video.
#[derive(Parser, Debug)]
#[command(name = "glimt")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log level from the `-v` count, falling back to the configured level.
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self.verbose {
            0 => configured,
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }

    /// Whether the command runs on a configuration that fails validation.
    pub fn tolerates_invalid_config(&self) -> bool {
        matches!(self.command, Commands::Doctor | Commands::Config { .. })
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Select key moments from a transcript (no video needed)
    Moments {
        /// Transcript JSON file
        transcript: PathBuf,

        /// Duration to assume when the transcript has no segments (seconds)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Use a fixed number of moments instead of scaling with duration
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Skip LLM suggestions
        #[arg(long)]
        no_llm: bool,

        /// Skip visual-cue detection
        #[arg(long)]
        no_visual_cues: bool,

        /// Write {"key_moments": [...]} JSON to this file instead of printing a table
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Select key moments and capture their screenshots
    Process {
        /// Transcript JSON file
        transcript: PathBuf,

        /// Video file
        video: PathBuf,

        /// Transcript id used in filenames (defaults to the id in the JSON)
        #[arg(long)]
        id: Option<String>,

        /// Screenshot root directory (one subdirectory per transcript)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Screenshot format (png, jpg)
        #[arg(long)]
        format: Option<String>,

        /// Skip LLM suggestions
        #[arg(long)]
        no_llm: bool,

        /// Capture only one screenshot per moment
        #[arg(long)]
        no_sequences: bool,

        /// Save raw frames without enhancement
        #[arg(long)]
        no_enhance: bool,

        /// Write {"key_moments": [...]} JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Attach the moments to the stored transcript in the data directory
        #[arg(long)]
        store: bool,
    },

    /// Extract a single frame
    Frame {
        /// Video file
        video: PathBuf,

        /// Timestamp (seconds, MM:SS or HH:MM:SS)
        timestamp: String,

        /// Output image file (.png or .jpg)
        #[arg(short, long)]
        output: PathBuf,

        /// Save the raw frame without enhancement
        #[arg(long)]
        no_enhance: bool,
    },

    /// List visual changes around a timestamp
    Changes {
        /// Video file
        video: PathBuf,

        /// Timestamp (seconds, MM:SS or HH:MM:SS)
        timestamp: String,

        /// Window analysed around the timestamp (seconds)
        #[arg(short, long)]
        window: Option<f64>,
    },

    /// Rebuild key moments from a directory of screenshots
    Recover {
        /// Transcript id
        id: String,

        /// Screenshot directory (defaults to <screenshots.output_dir>/<id>)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Attach the recovered moments to the stored transcript
        #[arg(long)]
        store: bool,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
