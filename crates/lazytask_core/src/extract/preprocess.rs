//! Input normalization ahead of extraction.
//!
//! # Invariants
//! - Output never contains full-width ASCII variants or ideographic spaces.
//! - Output whitespace is collapsed; empty output is reported as `None`.

use crate::extract::text::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;

static DATE_TRIGGER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:day\s+after\s+tomorrow|today|tomorrow)\b")
        .expect("valid date trigger regex")
});

/// Preprocessing switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreprocessOptions {
    /// Drops bare `today`/`tomorrow` words.
    ///
    /// Only for call sites that run after date extraction (or never need
    /// it); rule-based parsing must see the triggers.
    pub strip_date_triggers: bool,
}

impl PreprocessOptions {
    pub fn preserve_dates() -> Self {
        Self {
            strip_date_triggers: false,
        }
    }

    pub fn strip_dates() -> Self {
        Self {
            strip_date_triggers: true,
        }
    }
}

/// Normalizes raw input. Returns `None` when nothing remains.
pub fn preprocess(text: &str, options: PreprocessOptions) -> Option<String> {
    let mut normalized = normalize_width(text);
    if options.strip_date_triggers {
        normalized = DATE_TRIGGER_RE.replace_all(&normalized, " ").into_owned();
    }
    let collapsed = collapse_whitespace(&normalized);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Maps full-width punctuation and letters to their half-width forms.
pub fn normalize_width(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{3000}' => ' ',
            '、' => ',',
            '。' => '.',
            '\u{FF01}'..='\u{FF5E}' => {
                char::from_u32(u32::from(ch) - 0xFEE0).unwrap_or(ch)
            }
            other => other,
        })
        .collect()
}
