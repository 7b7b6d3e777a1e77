//! Parsing of LLM key-moment responses.
//!
//! Responses are parsed strictly first. If that fails, a single repair pass
//! fixes the common defects of model output (trailing commas, unquoted keys,
//! single-quoted strings, missing commas between elements) and parsing is
//! attempted once more. Anything still invalid is treated as "no moments".

use crate::transcript::TimeValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Keys under which a moment array is accepted.
const MOMENT_KEYS: &[&str] = &["key_moments", "moments", "visual_moments"];

/// One moment as suggested by the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedMoment {
    pub timestamp: TimeValue,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub moment_type: Option<String>,
}

/// Parse an LLM response into suggested moments. Never fails.
pub fn parse_key_moments(response: &str) -> Vec<SuggestedMoment> {
    let payload = extract_payload(response);
    if payload.is_empty() {
        warn!("LLM response contained no JSON payload");
        return Vec::new();
    }

    let value = match serde_json::from_str::<Value>(payload) {
        Ok(value) => value,
        Err(strict_err) => {
            debug!("Strict parse failed ({}), attempting repair", strict_err);
            match serde_json::from_str::<Value>(&repair_json(payload)) {
                Ok(value) => value,
                Err(e) => {
                    warn!("Could not repair LLM response: {}", e);
                    return Vec::new();
                }
            }
        }
    };

    moments_from_value(value)
}

fn moments_from_value(value: Value) -> Vec<SuggestedMoment> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => MOMENT_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<SuggestedMoment>(item) {
            Ok(moment) => Some(moment),
            Err(e) => {
                debug!("Skipping malformed moment: {}", e);
                None
            }
        })
        .collect()
}

/// Strip a markdown code fence, then cut to the outermost object or array.
fn extract_payload(response: &str) -> &str {
    let mut body = response.trim();

    if let Some(open) = body.find("```") {
        let after_fence = &body[open + 3..];
        // Skip the language tag line
        let content_start = after_fence.find('\n').map(|n| n + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        body = match content.find("```") {
            Some(close) => &content[..close],
            None => content,
        };
    }

    let object = body.find('{');
    let array = body.find('[');
    let (open, close) = match (object, array) {
        (Some(o), Some(a)) if a < o => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return body.trim(),
    };

    match body.rfind(close) {
        Some(end) if end > open => &body[open..=end],
        _ => &body[open..],
    }
}

fn is_value_end(c: char) -> bool {
    matches!(c, '}' | ']' | '"') || c.is_ascii_alphanumeric()
}

/// One repair pass over almost-JSON.
fn repair_json(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len() + 16);
    let mut last: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                if last.is_some_and(is_value_end) {
                    out.push(',');
                }
                let (content, next) = read_string(&chars, i);
                out.push('"');
                out.push_str(&content);
                out.push('"');
                last = Some('"');
                i = next;
                continue;
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']') | None) {
                    out.push(',');
                    last = Some(',');
                }
            }
            '{' | '[' => {
                if last.is_some_and(is_value_end) {
                    out.push(',');
                }
                out.push(c);
                last = Some(c);
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let is_key = chars[i..].iter().find(|c| !c.is_whitespace()) == Some(&':');
                if is_key {
                    if last.is_some_and(is_value_end) {
                        out.push(',');
                    }
                    out.push('"');
                    out.push_str(&word);
                    out.push('"');
                    last = Some('"');
                } else {
                    out.push_str(&word);
                    last = word.chars().last();
                }
                continue;
            }
            c if c.is_whitespace() => out.push(c),
            _ => {
                out.push(c);
                last = Some(c);
            }
        }
        i += 1;
    }

    out
}

/// Read a string literal opened by `"` or `'` at `start`, returning its
/// content escaped for a double-quoted JSON string and the index after it.
fn read_string(chars: &[char], start: usize) -> (String, usize) {
    let quote = chars[start];
    let mut content = String::new();
    let mut j = start + 1;

    while j < chars.len() {
        let ch = chars[j];
        if ch == '\\' && j + 1 < chars.len() {
            let escaped = chars[j + 1];
            if escaped == '\'' {
                content.push('\'');
            } else {
                content.push('\\');
                content.push(escaped);
            }
            j += 2;
            continue;
        }
        if ch == quote {
            return (content, j + 1);
        }
        match ch {
            '"' => content.push_str("\\\""),
            '\n' => content.push_str("\\n"),
            _ => content.push(ch),
        }
        j += 1;
    }

    (content, chars.len())
}
