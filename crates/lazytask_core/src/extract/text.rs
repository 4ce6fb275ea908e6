//! Small text helpers shared by extractors.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Collapses whitespace runs into one space and trims.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Case-insensitive whole-phrase containment.
///
/// A phrase matches only when it is not glued to other letters or digits,
/// so `ai` does not match inside `said`.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    let needle = phrase.trim().to_lowercase();
    if needle.is_empty() {
        return false;
    }
    let haystack = text.to_lowercase();

    haystack.match_indices(needle.as_str()).any(|(start, matched)| {
        let end = start + matched.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |ch| !ch.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |ch| !ch.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Builds a case-insensitive whole-word alternation over `phrases`.
///
/// Returns `None` when no non-empty phrase is given.
pub fn phrase_alternation(phrases: &[String]) -> Option<Regex> {
    let mut escaped = phrases
        .iter()
        .map(|phrase| phrase.trim())
        .filter(|phrase| !phrase.is_empty())
        .map(|phrase| regex::escape(&phrase.to_lowercase()).replace(' ', r"\s+"))
        .collect::<Vec<_>>();
    if escaped.is_empty() {
        return None;
    }
    // Longest first so `day after tomorrow` wins over `tomorrow`.
    escaped.sort_by_key(|phrase| std::cmp::Reverse(phrase.len()));
    Regex::new(&format!(r"(?i)\b(?:{})\b", escaped.join("|"))).ok()
}

/// Trims whitespace and stray separators left behind by span removal.
pub fn trim_separators(text: &str) -> String {
    collapse_whitespace(text)
        .trim_matches(|ch: char| ch.is_whitespace() || matches!(ch, ',' | '.' | ';' | ':' | '-'))
        .to_string()
}

/// Truncates to at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
