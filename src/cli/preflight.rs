//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools are available before starting operations
//! that would otherwise fail on every frame.

use crate::config::Settings;
use crate::error::{GlimtError, Result};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Screenshot capture needs ffmpeg and ffprobe.
    Capture,
    /// Selection alone has no external requirements.
    Select,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Capture => {
            check_tool(&settings.video.ffmpeg_path)?;
            check_tool(&settings.video.ffprobe_path)?;
        }
        Operation::Select => {}
    }
    Ok(())
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("-version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(GlimtError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(GlimtError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(GlimtError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_has_no_requirements() {
        assert!(check(Operation::Select, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_tool() {
        let result = check_tool("glimt-no-such-tool");
        assert!(matches!(result, Err(GlimtError::ToolNotFound(name)) if name == "glimt-no-such-tool"));
    }
}
