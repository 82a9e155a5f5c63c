//! JSON extraction from raw model completions.
//!
//! Model replies rarely arrive as bare JSON: they come wrapped in prose,
//! markdown fences, or both. This module pulls the first complete JSON
//! value out of a completion so the caller can hand it to `serde_json`.

use regex::Regex;
use thiserror::Error;

/// Raised when no JSON value can be located in a completion.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("no JSON value found in the completion")]
    NoJsonFound,
}

/// Extracts the first complete JSON object or array from `text`.
///
/// Strategies, tried in order:
/// 1. the body of a fenced ```` ```json ```` (or plain ```` ``` ````) block,
/// 2. the first balanced JSON entity anywhere in the text.
pub fn extract_json(text: &str) -> Result<String, ExtractError> {
    if let Some(block) = fenced_block(text)
        && let Some(entity) = first_json_entity(&block)
    {
        return Ok(entity);
    }

    first_json_entity(text).ok_or(ExtractError::NoJsonFound)
}

fn fenced_block(text: &str) -> Option<String> {
    let pattern = Regex::new(r"(?s)```(?:json)?\s*(.*?)```").ok()?;
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|content| content.as_str().trim().to_string())
}

/// Scans for the first balanced `{...}` or `[...]`, tracking string
/// boundaries so braces inside string literals do not confuse the count.
fn first_json_entity(text: &str) -> Option<String> {
    let mut depth = 0usize;
    let mut start = None;
    let mut opening = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' | '[' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                    opening = Some(ch);
                }
                depth += 1;
            }
            '}' | ']' if !in_string => {
                if depth == 0 {
                    continue;
                }
                depth -= 1;
                if depth == 0
                    && let Some(from) = start
                    && let Some(open) = opening
                {
                    let matched = (open == '{' && ch == '}') || (open == '[' && ch == ']');
                    if matched {
                        return Some(text[from..=i].to_string());
                    }
                    start = None;
                    opening = None;
                }
            }
            _ => {}
        }
    }

    None
}
