//! CLI output formatting utilities.

use crate::moments::KeyMoment;
use crate::transcript::format_timestamp;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one key moment with its context preview and screenshots.
    pub fn moment(moment: &KeyMoment) {
        println!(
            "\n{} {} {}",
            style(">>").green(),
            style(format_timestamp(moment.timestamp)).cyan(),
            style(&moment.title).bold()
        );
        println!("   {}", moment.description);
        println!(
            "   {} {}",
            style(format!(
                "[{} - {}]",
                format_timestamp(moment.context_start_time),
                format_timestamp(moment.context_end_time)
            ))
            .dim(),
            content_preview(&moment.transcript_text, 160)
        );
        if let Some(path) = &moment.screenshot_path {
            println!("   {}", style(path).dim());
        }
        if let Some(sequence) = &moment.sequence {
            if sequence.has_sequence {
                println!(
                    "   {}",
                    style(format!("+ {} frame sequence", sequence.sequence_count)).dim()
                );
            }
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a human-readable string.
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

/// Single-line preview, truncated on a char boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(42.0), "42s");
        assert_eq!(format_duration(1800.0), "30m 0s");
        assert_eq!(format_duration(3725.0), "1h 2m 5s");
    }

    #[test]
    fn test_preview_is_char_safe() {
        assert_eq!(content_preview("blåbærsyltetøy", 4), "blåb...");
        assert_eq!(content_preview("a\nb", 10), "a b");
    }
}
