//! One JSON document per transcript.

use super::TranscriptStore;
use crate::error::{GlimtError, Result};
use crate::moments::KeyMoment;
use crate::transcript::{validate_id, Transcript};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stores transcripts as `<dir>/<id>.json`.
///
/// Fields the store does not know about are preserved when moments are
/// attached.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read_document(&self, path: &Path) -> Result<Option<Map<String, Value>>> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(path).await?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(Some(map)),
            _ => Err(GlimtError::Storage(format!(
                "{} does not contain a JSON object",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl TranscriptStore for JsonFileStore {
    async fn load_transcript(&self, id: &str) -> Result<Option<Transcript>> {
        let path = self.path_for(id)?;
        if !tokio::fs::try_exists(&path).await? {
            return Ok(None);
        }
        let content = tokio::fs::read_to_string(&path).await?;
        Ok(Some(Transcript::from_json(&content, id)?))
    }

    async fn attach_key_moments(&self, id: &str, moments: &[KeyMoment]) -> Result<()> {
        let path = self.path_for(id)?;
        let mut document = self.read_document(&path).await?.unwrap_or_else(|| {
            let mut map = Map::new();
            map.insert("id".to_string(), Value::String(id.to_string()));
            map
        });
        document.insert("key_moments".to_string(), serde_json::to_value(moments)?);

        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_string_pretty(&Value::Object(document))?).await?;
        tokio::fs::rename(&tmp, &path).await?;

        info!("Attached {} key moments to {}", moments.len(), path.display());
        Ok(())
    }

    async fn key_moments(&self, id: &str) -> Result<Option<Vec<KeyMoment>>> {
        let path = self.path_for(id)?;
        let Some(mut document) = self.read_document(&path).await? else {
            return Ok(None);
        };
        match document.remove("key_moments") {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn list_transcripts(&self) -> Result<Vec<String>> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        debug!("Found {} stored transcripts", ids.len());
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::SequenceInfo;

    fn moment(timestamp: f64) -> KeyMoment {
        KeyMoment {
            timestamp,
            title: "Introduction".to_string(),
            description: "Opening".to_string(),
            transcript_text: "Hello there.".to_string(),
            context_start_time: 0.0,
            context_end_time: timestamp + 5.0,
            screenshot_path: Some("/static/screenshots/t1/a.png".to_string()),
            sequence: Some(SequenceInfo::new(vec!["a".to_string(), "b".to_string()])),
        }
    }

    #[tokio::test]
    async fn test_attach_preserves_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        std::fs::write(
            dir.path().join("t1.json"),
            r#"{"id": "t1", "title": "Quarterly review", "text": "Hello there.",
                "segments": [{"start": 0, "end": 4, "text": "Hello there."}],
                "summary": {"short": "kept"}}"#,
        )
        .unwrap();

        store.attach_key_moments("t1", &[moment(3.0)]).await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(dir.path().join("t1.json")).unwrap()).unwrap();
        assert_eq!(raw["title"], "Quarterly review");
        assert_eq!(raw["summary"]["short"], "kept");
        assert_eq!(raw["key_moments"][0]["has_sequence"], true);
        assert_eq!(raw["key_moments"][0]["sequence_count"], 2);

        let moments = store.key_moments("t1").await.unwrap().unwrap();
        assert_eq!(moments, vec![moment(3.0)]);

        let transcript = store.load_transcript("t1").await.unwrap().unwrap();
        assert_eq!(transcript.segments.len(), 1);
    }

    #[tokio::test]
    async fn test_attach_creates_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("transcripts"));
        store.attach_key_moments("new", &[]).await.unwrap();

        assert_eq!(store.key_moments("new").await.unwrap(), Some(vec![]));
        assert_eq!(store.list_transcripts().await.unwrap(), vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(store.load_transcript("nope").await.unwrap().is_none());
        assert!(store.key_moments("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        assert!(matches!(
            store.attach_key_moments("../escape", &[]).await,
            Err(GlimtError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_on_missing_dir_is_empty() {
        let store = JsonFileStore::new("/definitely/not/a/store");
        assert!(store.list_transcripts().await.unwrap().is_empty());
    }
}
