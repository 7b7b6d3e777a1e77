//! Glimt - key moments and synchronized screenshots
//!
//! A local-first CLI tool that picks the moments of a talk or screencast
//! worth illustrating and captures legible screenshots of them.
//!
//! The name "Glimt" comes from the Norwegian word for "glimpse."
//!
//! # Overview
//!
//! Glimt takes a transcript with time-aligned segments and a video, and:
//! - Detects content breaks and on-screen references in the transcript
//! - Selects a duration-scaled set of key moments with intro and conclusion anchors
//! - Extracts, denoises and enhances the frame at each moment
//! - Captures bursts of frames where the screen changes near a moment
//!
//! # Architecture
//!
//! - `config` - Configuration management and prompt templates
//! - `transcript` - Segments, transcript loading, timestamp utilities
//! - `detection` - Content breaks, visual cues, semantic context windows
//! - `moments` - Key-moment selection and the optional LLM suggester
//! - `video` - Frame access, sampling, change detection, enhancement, screenshot files
//! - `store` - Transcript persistence
//! - `pipeline` - Selection followed by per-moment screenshot capture
//!
//! # Example
//!
//! ```rust,no_run
//! use glimt::config::Settings;
//! use glimt::pipeline::Pipeline;
//! use glimt::transcript::Transcript;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let screenshots = settings.screenshots_dir();
//!     let pipeline = Pipeline::new(settings)?;
//!
//!     let transcript = Transcript::load(Path::new("talk.json"))?;
//!     let result = pipeline.process(&transcript, Path::new("talk.mp4"), &screenshots).await?;
//!     println!("Captured {} screenshots", result.screenshots_saved);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod moments;
pub mod openai;
pub mod pipeline;
pub mod store;
pub mod transcript;
pub mod video;

pub use error::{GlimtError, Result};
