//! Timestamp parsing and formatting.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A timestamp as it appears in transcripts and LLM output: either a number
/// of seconds or a string such as `"01:15"`, `"1:02:03"` or `"75s"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Text(String),
}

impl From<f64> for TimeValue {
    fn from(seconds: f64) -> Self {
        TimeValue::Seconds(seconds)
    }
}

impl From<&str> for TimeValue {
    fn from(text: &str) -> Self {
        TimeValue::Text(text.to_string())
    }
}

impl TimeValue {
    /// Seconds represented by this value (`0.0` when unparseable).
    pub fn seconds(&self) -> f64 {
        parse_timestamp(self)
    }
}

/// Parse a timestamp in any supported representation to seconds.
pub fn parse_timestamp(value: &TimeValue) -> f64 {
    match value {
        TimeValue::Seconds(s) => *s,
        TimeValue::Text(text) => parse_timestamp_str(text),
    }
}

/// Parse `HH:MM:SS`, `MM:SS`, `N`, or `Ns` to seconds.
///
/// Never fails: unparseable input is logged and treated as `0.0`.
pub fn parse_timestamp_str(text: &str) -> f64 {
    match try_parse_timestamp(text) {
        Some(seconds) => seconds,
        None => {
            warn!("Could not parse timestamp: {:?}", text);
            0.0
        }
    }
}

fn try_parse_timestamp(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let seconds = if text.contains(':') {
        let parts: Vec<&str> = text.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [h, m, s] => h.parse::<u64>().ok()? as f64 * 3600.0
                + m.parse::<u64>().ok()? as f64 * 60.0
                + s.parse::<f64>().ok()?,
            [m, s] => m.parse::<u64>().ok()? as f64 * 60.0 + s.parse::<f64>().ok()?,
            _ => return None,
        }
    } else {
        let number = text.strip_suffix('s').unwrap_or(text).trim_end();
        number.parse::<f64>().ok()?
    };

    seconds.is_finite().then_some(seconds)
}

/// Whole seconds used for display; invalid or negative input becomes 0.
fn whole_seconds(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    }
}

/// Format seconds as zero-padded `MM:SS`. Minutes are not folded into hours.
pub fn format_timestamp(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Format seconds as `MMmSSs`, the stamp used in screenshot filenames.
pub fn format_file_stamp(seconds: f64) -> String {
    let total = whole_seconds(seconds);
    format!("{:02}m{:02}s", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers_pass_through() {
        assert_eq!(parse_timestamp(&TimeValue::Seconds(12.5)), 12.5);
    }

    #[test]
    fn test_parse_colon_formats() {
        assert_eq!(parse_timestamp_str("01:15"), 75.0);
        assert_eq!(parse_timestamp_str("1:02:03"), 3723.0);
        assert_eq!(parse_timestamp_str("00:10.5"), 10.5);
    }

    #[test]
    fn test_parse_plain_and_suffixed_seconds() {
        assert_eq!(parse_timestamp_str("42"), 42.0);
        assert_eq!(parse_timestamp_str("10s"), 10.0);
        assert_eq!(parse_timestamp_str(" 7.25 "), 7.25);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse_timestamp_str("soon"), 0.0);
        assert_eq!(parse_timestamp_str("1:2:3:4"), 0.0);
        assert_eq!(parse_timestamp_str(""), 0.0);
        assert_eq!(parse_timestamp_str("inf"), 0.0);
    }

    #[test]
    fn test_time_value_deserializes_both_shapes() {
        let values: Vec<TimeValue> = serde_json::from_str(r#"[75, "01:15"]"#).unwrap();
        assert_eq!(values[0].seconds(), 75.0);
        assert_eq!(values[1].seconds(), 75.0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "00:00");
        assert_eq!(format_timestamp(65.9), "01:05");
        assert_eq!(format_timestamp(3725.0), "62:05");
        assert_eq!(format_timestamp(-3.0), "00:00");
        assert_eq!(format_timestamp(f64::NAN), "00:00");
    }

    #[test]
    fn test_format_file_stamp() {
        assert_eq!(format_file_stamp(75.4), "01m15s");
    }

    #[test]
    fn test_format_then_parse_floors() {
        for x in [0.0, 0.99, 59.5, 61.0, 599.2, 3600.7, 7322.0] {
            let formatted = format_timestamp(x);
            assert_eq!(parse_timestamp_str(&formatted), x.floor(), "round trip of {}", x);
        }
    }
}
