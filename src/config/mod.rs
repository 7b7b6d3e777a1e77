//! Configuration module for Glimt.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{KeyMomentPrompts, Prompts};
pub use settings::{
    EnhancementSettings, GeneralSettings, LlmSettings, PromptSettings, ScreenshotSettings,
    SelectionSettings, Settings, VideoSettings,
};
