//! Optional LLM collaborator that proposes key moments.

use super::response::{parse_key_moments, SuggestedMoment};
use crate::config::{LlmSettings, Prompts};
use crate::error::{GlimtError, Result};
use crate::openai::create_client_with_timeout;
use crate::transcript::{format_timestamp, Transcript};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument};

/// What the suggester is asked for.
#[derive(Debug, Clone)]
pub struct SuggestionRequest {
    /// Timestamped transcript lines, truncated to the prompt budget.
    pub transcript_excerpt: String,
    pub count: usize,
    pub duration: f64,
}

impl SuggestionRequest {
    pub fn new(transcript: &Transcript, count: usize, duration: f64, max_chars: usize) -> Self {
        let full = if transcript.has_segments() {
            transcript
                .segments
                .iter()
                .map(|s| format!("[{}] {}", format_timestamp(s.start), s.text))
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            transcript.text.clone()
        };

        let transcript_excerpt = match full.char_indices().nth(max_chars) {
            Some((cut, _)) => full[..cut].to_string(),
            None => full,
        };

        Self {
            transcript_excerpt,
            count,
            duration,
        }
    }
}

/// Source of LLM-suggested moments.
#[async_trait]
pub trait MomentSuggester: Send + Sync {
    /// Suggest up to `request.count` moments.
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<SuggestedMoment>>;
}

/// Suggester backed by an OpenAI chat model.
pub struct OpenAISuggester {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    prompts: Prompts,
}

impl OpenAISuggester {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(Duration::from_secs(settings.timeout_seconds.max(1)))?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            prompts: Prompts::default(),
        })
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }
}

#[async_trait]
impl MomentSuggester for OpenAISuggester {
    #[instrument(skip(self, request), fields(count = request.count))]
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Vec<SuggestedMoment>> {
        let mut vars = HashMap::new();
        vars.insert("count".to_string(), request.count.to_string());
        vars.insert("duration".to_string(), format!("{:.0}", request.duration));
        vars.insert("transcript".to_string(), request.transcript_excerpt.clone());

        let user_prompt = self
            .prompts
            .render_with_custom(&self.prompts.key_moments.user, &vars);

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.prompts.key_moments.system.clone())
                .build()
                .map_err(|e| GlimtError::Llm(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| GlimtError::Llm(e.to_string()))?
                .into(),
        ];

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| GlimtError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| GlimtError::OpenAI(format!("Failed to suggest moments: {}", e)))?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| GlimtError::Llm("Empty response from LLM".to_string()))?;

        let moments = parse_key_moments(content);
        debug!("LLM suggested {} moments", moments.len());
        Ok(moments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;

    #[test]
    fn test_request_formats_segments() {
        let transcript = Transcript::new(
            "t",
            "",
            vec![Segment::new(0.0, 4.0, "Hello."), Segment::new(75.0, 80.0, "Demo time.")],
        );
        let request = SuggestionRequest::new(&transcript, 5, 80.0, 1000);
        assert_eq!(request.transcript_excerpt, "[00:00] Hello.\n[01:15] Demo time.");
        assert_eq!(request.count, 5);
    }

    #[test]
    fn test_request_truncates_on_char_boundary() {
        let transcript = Transcript::new("t", "héllo wörld", Vec::new());
        let request = SuggestionRequest::new(&transcript, 5, 0.0, 4);
        assert_eq!(request.transcript_excerpt, "héll");
    }
}
