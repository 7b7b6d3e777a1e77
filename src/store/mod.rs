//! Transcript persistence.
//!
//! Provides a trait-based interface so the pipeline can attach moments to
//! whatever holds the transcripts.

mod json;

pub use json::JsonFileStore;

use crate::error::Result;
use crate::moments::KeyMoment;
use crate::transcript::Transcript;
use async_trait::async_trait;

/// Storage for transcripts and the key moments attached to them.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Load a transcript by id.
    async fn load_transcript(&self, id: &str) -> Result<Option<Transcript>>;

    /// Attach key moments to a transcript, replacing any previous ones.
    async fn attach_key_moments(&self, id: &str, moments: &[KeyMoment]) -> Result<()>;

    /// Key moments previously attached to a transcript.
    async fn key_moments(&self, id: &str) -> Result<Option<Vec<KeyMoment>>>;

    /// Ids of all stored transcripts, sorted.
    async fn list_transcripts(&self) -> Result<Vec<String>>;
}
