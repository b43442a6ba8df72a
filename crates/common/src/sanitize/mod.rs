//! Input sanitization for recipe, comment and rating fields
//!
//! Pure, deterministic transformations from raw user input to the canonical
//! form we persist. Sanitizers never fail: malformed input degrades to an
//! empty value and is rejected by validation downstream.

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Minimum allowed rating score
pub const MIN_SCORE: i16 = 1;

/// Maximum allowed rating score
pub const MAX_SCORE: i16 = 5;

fn step_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^step \d+:").unwrap())
}

fn line_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r\n|\r|\n").unwrap())
}

fn markup_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap())
}

/// Preparation steps arrive either as one newline-separated block (the
/// textarea form) or as an already-split list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepsInput {
    Text(String),
    Lines(Vec<String>),
}

impl StepsInput {
    /// Raw character length of the pre-split form, used by validation.
    pub fn raw_len(&self) -> usize {
        match self {
            StepsInput::Text(text) => text.chars().count(),
            StepsInput::Lines(lines) => {
                let newlines = lines.len().saturating_sub(1);
                lines.iter().map(|l| l.chars().count()).sum::<usize>() + newlines
            }
        }
    }
}

/// Canonical title: whitespace runs collapsed, trimmed, Unicode-lowercased.
pub fn sanitize_title(raw: &str) -> String {
    collapse_whitespace(raw).to_lowercase()
}

/// Canonical description: `None` when empty or whitespace-only, else trimmed.
pub fn sanitize_description(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Canonical ingredient list: trimmed, empties dropped, title-cased, and
/// deduplicated preserving first-seen order. Case and surrounding-whitespace
/// variants of the same ingredient converge to one entry.
pub fn sanitize_ingredients<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut clean: Vec<String> = Vec::with_capacity(raw.len());

    for ingredient in raw {
        let trimmed = ingredient.as_ref().trim();
        if trimmed.is_empty() {
            continue;
        }

        let canonical = title_case(trimmed);
        if !clean.contains(&canonical) {
            clean.push(canonical);
        }
    }

    clean
}

/// Canonical step list.
///
/// Splits text input on any line-break sequence, trims each line, drops
/// empty lines, and prepends `"Step N: "` to lines that do not already carry
/// a step prefix (checked case-insensitively). N is the 1-based position in
/// the pre-filter line sequence; lines with an existing prefix keep it
/// verbatim. Duplicates are dropped preserving order.
pub fn sanitize_steps(raw: &StepsInput) -> Vec<String> {
    let lines: Vec<String> = match raw {
        StepsInput::Text(text) => line_break_re()
            .split(text)
            .map(|l| l.to_string())
            .collect(),
        StepsInput::Lines(lines) => lines.clone(),
    };

    let mut clean: Vec<String> = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let step = if step_prefix_re().is_match(trimmed) {
            trimmed.to_string()
        } else {
            format!("Step {}: {}", index + 1, trimmed)
        };

        if !clean.contains(&step) {
            clean.push(step);
        }
    }

    clean
}

/// Canonical comment body: markup tags stripped, whitespace runs collapsed,
/// trimmed.
pub fn sanitize_comment_body(raw: &str) -> String {
    let stripped = markup_tag_re().replace_all(raw, "");
    collapse_whitespace(&stripped)
}

/// Clamp a score into the valid `[1, 5]` range.
pub fn sanitize_score(raw: i16) -> i16 {
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

/// Derive a URL slug from a sanitized title.
///
/// Non-alphanumeric runs become a single hyphen. The slug is cosmetic and
/// carries no uniqueness guarantee; only the title is unique.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title-case a single ingredient: the first letter of each word is
/// uppercased, the rest lowercased. Word boundaries are non-alphanumeric
/// characters, matching full Unicode title casing.
fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }

    out
}
