//! CLI command implementations.

mod changes;
mod config;
mod doctor;
mod frame;
mod moments;
mod process;
mod recover;

pub use changes::run_changes;
pub use config::run_config;
pub use doctor::run_doctor;
pub use frame::run_frame;
pub use moments::run_moments;
pub use process::{run_process, ProcessArgs};
pub use recover::run_recover;

use crate::moments::KeyMoment;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct KeyMomentsFile<'a> {
    key_moments: &'a [KeyMoment],
}

/// Write `{"key_moments": [...]}` to `path`, or stdout for `-`.
fn write_moments_json(path: &Path, moments: &[KeyMoment]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&KeyMomentsFile { key_moments: moments })?;
    if path == Path::new("-") {
        println!("{}", json);
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
    }
    Ok(())
}
