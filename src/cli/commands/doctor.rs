//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// `settings` may have failed validation; the configuration check reports it.
pub fn run_doctor(settings: &Settings, config_path: Option<&PathBuf>) -> anyhow::Result<()> {
    Output::header("Glimt Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("External Tools").bold());
    let tool_checks = vec![
        check_tool("ffmpeg", &settings.video.ffmpeg_path),
        check_tool("ffprobe", &settings.video.ffprobe_path),
    ];
    for check in &tool_checks {
        check.print();
    }
    checks.extend(tool_checks);

    println!();

    println!("{}", style("LLM Suggestions").bold());
    let api_check = check_openai_api_key(settings.selection.use_llm);
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(settings);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_path = config_path.cloned().unwrap_or_else(Settings::default_config_path);
    let config_check = check_config_file(settings, &config_path);
    config_check.print();
    checks.push(config_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before capturing screenshots.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Glimt is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, path: &str) -> CheckResult {
    match Command::new(path).arg("-version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", install_hint_ffmpeg()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::error(name, &format!("{} not found", path), install_hint_ffmpeg())
        }
        Err(e) => CheckResult::error(name, &format!("error: {}", e), install_hint_ffmpeg()),
    }
}

/// The key is optional: without it selection runs on rule-based cues only.
fn check_openai_api_key(use_llm: bool) -> CheckResult {
    if !use_llm {
        return CheckResult::ok("OPENAI_API_KEY", "LLM suggestions disabled in config");
    }
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if key.starts_with("sk-") && key.len() > 20 => {
            let masked = match (key.get(..7), key.get(key.len() - 4..)) {
                (Some(head), Some(tail)) => format!("{}...{}", head, tail),
                _ => "set".to_string(),
            };
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", masked))
        }
        Ok(key) if key.trim().is_empty() => CheckResult::warning(
            "OPENAI_API_KEY",
            "empty, moments will be selected without LLM suggestions",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Ok(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        Err(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "not set, moments will be selected without LLM suggestions",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

/// Check data, transcript and screenshot directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    vec![
        check_directory("Data directory", &settings.data_dir()),
        check_directory("Transcripts", &settings.transcripts_dir()),
        check_directory("Screenshots", &settings.screenshots_dir()),
    ]
}

fn check_directory(name: &str, path: &Path) -> CheckResult {
    if path.is_dir() {
        let entries = std::fs::read_dir(path).map(|d| d.count()).unwrap_or(0);
        CheckResult::ok(name, &format!("{} ({} entries)", path.display(), entries))
    } else if path.exists() {
        CheckResult::error(
            name,
            &format!("{} is not a directory", path.display()),
            "Remove the file or point the config at another directory",
        )
    } else {
        CheckResult::warning(
            name,
            &format!("{} (will be created)", path.display()),
            "Directory will be created on first use",
        )
    }
}

/// Check the config file and the loaded values.
fn check_config_file(settings: &Settings, config_path: &Path) -> CheckResult {
    if let Err(e) = settings.validate() {
        return CheckResult::error("Config file", &e.to_string(), "Fix with: glimt config edit");
    }
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning("Config file", "using defaults", "Create with: glimt config edit")
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}
