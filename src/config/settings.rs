//! Configuration settings for Glimt.

use crate::error::{GlimtError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub selection: SelectionSettings,
    pub llm: LlmSettings,
    pub video: VideoSettings,
    pub enhancement: EnhancementSettings,
    pub screenshots: ScreenshotSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data (transcripts, screenshots).
    pub data_dir: String,
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.glimt".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Key-moment selection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    /// Scale the number of moments with the video duration.
    pub dynamic_count: bool,
    /// Lower bound for the dynamic count.
    pub min_count: usize,
    /// Upper bound for the dynamic count.
    pub max_count: usize,
    /// Moment count when dynamic sizing is off.
    pub fixed_count: usize,
    /// Scan the transcript text for visual-reference phrases.
    pub use_visual_cues: bool,
    /// Ask the LLM for candidates when the rule-based ones run short.
    pub use_llm: bool,
    /// Duration assumed when neither segments nor the video provide one.
    pub fallback_duration_seconds: f64,
    /// Upper bound on the minimum distance between two moments.
    pub min_spacing_seconds: f64,
    /// Segments suppressed after each detected content break.
    pub min_segments_between_breaks: usize,
    /// Gap between segments that counts as an unnatural pause.
    pub pause_threshold_seconds: f64,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            dynamic_count: true,
            min_count: 5,
            max_count: 20,
            fixed_count: 7,
            use_visual_cues: true,
            use_llm: true,
            fallback_duration_seconds: 1800.0,
            min_spacing_seconds: 15.0,
            min_segments_between_breaks: 10,
            pause_threshold_seconds: 2.0,
        }
    }
}

/// LLM collaborator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used to suggest moments.
    pub model: String,
    /// Hard limit for one suggestion request.
    pub timeout_seconds: u64,
    /// Sampling temperature.
    pub temperature: f32,
    /// Transcript characters included in the prompt.
    pub max_transcript_chars: usize,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            timeout_seconds: 30,
            temperature: 0.3,
            max_transcript_chars: 12_000,
        }
    }
}

/// Frame extraction and visual-change detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// ffmpeg binary used to decode frames.
    pub ffmpeg_path: String,
    /// ffprobe binary used to read container metadata.
    pub ffprobe_path: String,
    /// Capture a burst of frames around each moment.
    pub detect_sequences: bool,
    /// Time window analysed around a moment (seconds).
    pub change_window_seconds: f64,
    /// Frames sampled per second inside the window.
    pub sample_rate: f64,
    /// Mean absolute difference (0-1) that counts as a change.
    pub change_threshold: f64,
    /// Minimum distance between two accepted changes (seconds).
    pub min_change_separation_seconds: f64,
    /// Maximum timestamps kept per moment, base included.
    pub max_sequence_frames: usize,
    /// Average the target frame with its neighbours before enhancement.
    pub average_neighbors: bool,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            detect_sequences: true,
            change_window_seconds: 10.0,
            sample_rate: 2.0,
            change_threshold: 0.15,
            min_change_separation_seconds: 1.0,
            max_sequence_frames: 5,
            average_neighbors: true,
        }
    }
}

/// Screenshot enhancement settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhancementSettings {
    /// Run the enhancement pipeline at all.
    pub enabled: bool,
    /// Upscale 1.5x while processing to help small text.
    pub upscale: bool,
    /// Treat frames as UI captures (edge-preserving denoise).
    pub ui_capture: bool,
    /// Blend ratio of the edge-masked contrast boost.
    pub edge_boost_ratio: f32,
    /// CLAHE clip limit.
    pub clahe_clip_limit: f32,
    /// CLAHE tiles per axis.
    pub clahe_tiles: u32,
    /// Saturation multiplier.
    pub saturation: f32,
}

impl Default for EnhancementSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            upscale: true,
            ui_capture: true,
            edge_boost_ratio: 0.3,
            clahe_clip_limit: 2.0,
            clahe_tiles: 8,
            saturation: 1.2,
        }
    }
}

/// Screenshot output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotSettings {
    /// Root directory for screenshots; one subdirectory per transcript.
    pub output_dir: String,
    /// Image format (png, jpg).
    pub format: String,
    /// PNG compression (fast, default, best).
    pub png_compression: String,
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for ScreenshotSettings {
    fn default() -> Self {
        Self {
            output_dir: "~/.glimt/static/screenshots".to_string(),
            format: "png".to_string(),
            png_compression: "default".to_string(),
            jpeg_quality: 95,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load and validate settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let settings = Self::read_from(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings without validating them.
    pub fn read_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str::<Settings>(&content)?)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject combinations the selector and detectors cannot work with.
    pub fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
        if !LEVELS.contains(&self.general.log_level.to_lowercase().as_str()) {
            return Err(GlimtError::Config(format!(
                "general.log_level must be one of {} (got {})",
                LEVELS.join(", "),
                self.general.log_level
            )));
        }

        let s = &self.selection;
        if s.min_count < 2 {
            return Err(GlimtError::Config(format!(
                "selection.min_count must be at least 2 (got {})",
                s.min_count
            )));
        }
        if s.min_count > s.max_count {
            return Err(GlimtError::Config(format!(
                "selection.min_count ({}) exceeds selection.max_count ({})",
                s.min_count, s.max_count
            )));
        }
        if s.fixed_count < 2 {
            return Err(GlimtError::Config(format!(
                "selection.fixed_count must be at least 2 (got {})",
                s.fixed_count
            )));
        }
        if self.video.sample_rate <= 0.0 {
            return Err(GlimtError::Config(
                "video.sample_rate must be positive".to_string(),
            ));
        }
        if !(self.video.change_threshold > 0.0 && self.video.change_threshold <= 1.0) {
            return Err(GlimtError::Config(format!(
                "video.change_threshold must be in (0, 1] (got {})",
                self.video.change_threshold
            )));
        }
        Ok(())
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| GlimtError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("glimt")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Directory holding persisted transcript JSON files.
    pub fn transcripts_dir(&self) -> PathBuf {
        self.data_dir().join("transcripts")
    }

    /// Get the expanded screenshot root directory.
    pub fn screenshots_dir(&self) -> PathBuf {
        Self::expand_path(&self.screenshots.output_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [selection]
            min_count = 4

            [video]
            sample_rate = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(settings.selection.min_count, 4);
        assert_eq!(settings.selection.max_count, 20);
        assert_eq!(settings.video.sample_rate, 4.0);
        assert_eq!(settings.video.change_threshold, 0.15);
        assert_eq!(settings.screenshots.format, "png");
    }

    #[test]
    fn test_validate_rejects_inverted_counts() {
        let mut settings = Settings::default();
        settings.selection.min_count = 10;
        settings.selection.max_count = 6;
        assert!(matches!(settings.validate(), Err(GlimtError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut settings = Settings::default();
        settings.video.change_threshold = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let settings = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(settings.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_read_skips_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[selection]\nmin_count = 9\nmax_count = 3\n").unwrap();

        let settings = Settings::read_from(Some(&path)).unwrap();
        assert_eq!(settings.selection.min_count, 9);
        assert!(Settings::load_from(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_log_level() {
        let mut settings = Settings::default();
        settings.general.log_level = "DEBUG".to_string();
        assert!(settings.validate().is_ok());
        settings.general.log_level = "loud".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.selection.fixed_count = 9;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.selection.fixed_count, 9);
    }
}
