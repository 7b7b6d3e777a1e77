//! Prompt templates for Glimt.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub key_moments: KeyMomentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for LLM-suggested key moments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyMomentPrompts {
    pub system: String,
    pub user: String,
}

impl Default for KeyMomentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a video content analyst. You read transcripts of talks, meetings and tutorials and point out the moments that deserve a screenshot in a written report.

Good moments are:
- Slides, diagrams, charts or dashboards being shown or discussed
- Live demonstrations of software or products
- Topic changes where the speaker introduces a new section
- Key numbers, results or decisions

Always respond with a single JSON object and nothing else."#
                .to_string(),

            user: r#"Identify up to {{count}} key moments in this transcript.

Video duration: {{duration}} seconds

Transcript (timestamps in MM:SS):
{{transcript}}

For each moment provide:
- "timestamp": seconds as a number, or "MM:SS"
- "title": a short title (3-6 words)
- "description": one sentence describing what is on screen or being said
- "moment_type": one of "visual", "topic_change", "data", "demo", "decision"

Respond with JSON in exactly this shape:
{"key_moments": [{"timestamp": 75, "title": "Dashboard walkthrough", "description": "The presenter shows the revenue dashboard.", "moment_type": "visual"}]}"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let key_moments_path = custom_path.join("key_moments.toml");
            if key_moments_path.exists() {
                let content = std::fs::read_to_string(&key_moments_path)?;
                prompts.key_moments = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}
