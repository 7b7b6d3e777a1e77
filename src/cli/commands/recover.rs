//! Recover command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::store::{JsonFileStore, TranscriptStore};
use crate::transcript::validate_id;
use crate::video::recover_moments_from_dir;
use anyhow::Result;
use std::path::PathBuf;

/// Run the recover command: rebuild moments from saved screenshots.
pub async fn run_recover(id: &str, dir: Option<PathBuf>, store: bool, settings: Settings) -> Result<()> {
    validate_id(id)?;
    let dir = dir.unwrap_or_else(|| settings.screenshots_dir().join(id));
    if !dir.is_dir() {
        Output::error(&format!("No screenshot directory at {}", dir.display()));
        return Ok(());
    }

    let moments = recover_moments_from_dir(&dir, id)?;
    if moments.is_empty() {
        Output::warning(&format!("No screenshots for {} in {}", id, dir.display()));
        return Ok(());
    }

    Output::header(&format!("Recovered moments for {}", id));
    for moment in &moments {
        Output::moment(moment);
    }
    println!();

    if store {
        JsonFileStore::new(settings.transcripts_dir())
            .attach_key_moments(id, &moments)
            .await?;
        Output::success(&format!("Attached {} recovered moments to {}", moments.len(), id));
    }

    Ok(())
}
