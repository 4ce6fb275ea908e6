//! Rule-based title cleanup.
//!
//! Strips filler (articles, prepositions, auxiliaries, light verbs,
//! priority keywords and punctuation) from the text left after date
//! removal. The remaining words keep their original order.

use crate::config::ParserConfig;
use crate::extract::text::{collapse_whitespace, phrase_alternation, trim_separators};
use crate::model::task::Priority;
use once_cell::sync::Lazy;
use regex::Regex;

const FILLER_WORDS: &[&str] = &[
    // auxiliaries and requests
    "need to",
    "needs to",
    "have to",
    "has to",
    "got to",
    "should",
    "must",
    "will",
    "please",
    "let's",
    "i",
    "we",
    // light verbs
    "submit",
    "create",
    "conduct",
    "start",
    "complete",
    "finish",
    "prepare",
    "do",
    "make",
    // articles and prepositions
    "the",
    "a",
    "an",
    "to",
    "for",
    "of",
    "on",
    "at",
    "in",
    "with",
    "about",
];

static FILLER_RE: Lazy<Regex> = Lazy::new(|| {
    let words: Vec<String> = FILLER_WORDS.iter().map(|word| (*word).to_string()).collect();
    phrase_alternation(&words).expect("valid filler regex")
});

static PUNCTUATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!?;"()\[\]{}]|,|\.(?:\s|$)"#).expect("valid punctuation regex"));

/// Removes filler and priority keywords from a title candidate.
pub struct TitleCleaner {
    priority_re: Option<Regex>,
}

impl TitleCleaner {
    pub fn new(config: &ParserConfig) -> Self {
        let keywords: Vec<String> = Priority::ALL
            .into_iter()
            .flat_map(|priority| config.priority_keywords_for(priority).iter().cloned())
            .collect();
        Self {
            priority_re: phrase_alternation(&keywords),
        }
    }

    /// Returns the cleaned title; may be empty.
    pub fn clean(&self, text: &str) -> String {
        let mut cleaned = PUNCTUATION_RE.replace_all(text, " ").into_owned();
        if let Some(priority_re) = &self.priority_re {
            cleaned = priority_re.replace_all(&cleaned, " ").into_owned();
        }
        cleaned = FILLER_RE.replace_all(&cleaned, " ").into_owned();
        trim_separators(&collapse_whitespace(&cleaned))
    }
}
