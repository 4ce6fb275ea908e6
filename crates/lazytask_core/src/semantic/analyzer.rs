//! Model-based task analysis.
//!
//! # Responsibility
//! - Estimate title, categories, priority and deadline from similarity
//!   scores of the injected ensemble.
//! - Convert every internal failure into the fixed fallback record.
//!
//! # Invariants
//! - `analyze` never panics and never returns an error to the caller.
//! - Overall confidence is the mean of the four field confidences,
//!   rounded to three decimals.
//! - Neutral ensemble scores never decide priority or deadline.
//!
//! # See also
//! - `semantic::ensemble` for score aggregation and degradation.

use crate::config::ParserConfig;
use crate::extract::category::CategoryMatcher;
use crate::extract::preprocess::{preprocess, PreprocessOptions};
use crate::extract::text::truncate_chars;
use crate::model::task::{
    clamp_confidence, Field, FieldResult, Priority, SemanticResult, DATE_FORMAT,
};
use crate::semantic::ensemble::SimilarityEnsemble;
use crate::semantic::tokenizer::{PartOfSpeech, Token, TokenizeError, Tokenizer};
use chrono::{Days, NaiveDate};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

const TITLE_MAX_CHARS: usize = 50;
const TITLE_TRUNCATED_CHARS: usize = 47;
const TITLE_FALLBACK_CONFIDENCE: f64 = 0.3;
const TITLE_KEEP_RATIO: f64 = 0.6;
const LONE_WORD_FACTOR: f64 = 0.5;

const TIME_WORDS: &[&str] = &[
    "today", "tomorrow", "tonight", "week", "weekend", "month", "day", "days", "later",
];
const LIGHT_VERBS: &[&str] = &[
    "do", "make", "submit", "conduct", "create", "start", "complete", "finish", "prepare",
];
const FILLER_WORDS: &[&str] = &["need", "plan", "thing", "things", "something", "please"];

/// Internal semantic analysis failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    EmptyInput,
    Tokenize(TokenizeError),
    Panicked,
}

impl Display for SemanticError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "input is empty after preprocessing"),
            Self::Tokenize(err) => write!(f, "{err}"),
            Self::Panicked => write!(f, "semantic analysis panicked"),
        }
    }
}

impl Error for SemanticError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Tokenize(err) => Some(err),
            Self::EmptyInput | Self::Panicked => None,
        }
    }
}

impl From<TokenizeError> for SemanticError {
    fn from(value: TokenizeError) -> Self {
        Self::Tokenize(value)
    }
}

/// Result of one semantic analysis call.
#[derive(Debug, Clone, PartialEq)]
pub enum SemanticOutcome {
    Analyzed(SemanticResult),
    /// Analysis failed; `result` is `SemanticResult::fallback()`.
    Fallback {
        result: SemanticResult,
        reason: SemanticError,
    },
}

impl SemanticOutcome {
    /// Result to merge, or `None` after a fallback.
    pub fn analyzed(&self) -> Option<&SemanticResult> {
        match self {
            Self::Analyzed(result) => Some(result),
            Self::Fallback { .. } => None,
        }
    }

    pub fn into_result(self) -> SemanticResult {
        match self {
            Self::Analyzed(result) | Self::Fallback { result, .. } => result,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Similarity-driven estimator for every task field.
pub struct SemanticAnalyzer {
    config: Arc<ParserConfig>,
    ensemble: Arc<SimilarityEnsemble>,
    tokenizer: Arc<dyn Tokenizer>,
}

impl SemanticAnalyzer {
    pub fn new(
        config: Arc<ParserConfig>,
        ensemble: Arc<SimilarityEnsemble>,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Self {
        Self {
            config,
            ensemble,
            tokenizer,
        }
    }

    /// Analyzes `text`; failures degrade to `SemanticOutcome::Fallback`.
    pub fn analyze(&self, text: &str, reference: NaiveDate) -> SemanticOutcome {
        let attempt = catch_unwind(AssertUnwindSafe(|| self.try_analyze(text, reference)));
        let reason = match attempt {
            Ok(Ok(result)) => return SemanticOutcome::Analyzed(result),
            Ok(Err(err)) => err,
            Err(_) => SemanticError::Panicked,
        };
        warn!(
            "event=semantic_analyze module=semantic status=fallback error={}",
            reason
        );
        SemanticOutcome::Fallback {
            result: SemanticResult::fallback(),
            reason,
        }
    }

    fn try_analyze(
        &self,
        text: &str,
        reference: NaiveDate,
    ) -> Result<SemanticResult, SemanticError> {
        let normalized = preprocess(text, PreprocessOptions::preserve_dates())
            .ok_or(SemanticError::EmptyInput)?;

        let title = self.generate_title(&normalized)?;
        let category = self.estimate_category(&normalized);
        let priority = self.estimate_priority(&normalized);
        let deadline = self.estimate_deadline(&normalized, reference);

        let confidence = round3(
            (title.confidence
                + category.confidence
                + priority.as_ref().map_or(0.0, |found| found.confidence)
                + deadline.as_ref().map_or(0.0, |found| found.confidence))
                / 4.0,
        );

        let mut details = BTreeMap::new();
        details.insert(Field::Title, title.clone());
        details.insert(
            Field::Category,
            FieldResult::new(category.value.join(","), category.confidence),
        );
        details.insert(
            Field::Priority,
            priority
                .as_ref()
                .map(|found| FieldResult::new(found.value.as_str().to_string(), found.confidence))
                .unwrap_or_else(|| FieldResult::new(String::new(), 0.0)),
        );
        details.insert(
            Field::DueDate,
            deadline
                .clone()
                .unwrap_or_else(|| FieldResult::new(String::new(), 0.0)),
        );

        info!(
            "event=semantic_analyze module=semantic status=ok confidence={} categories={} has_deadline={}",
            confidence,
            category.value.len(),
            deadline.is_some()
        );

        Ok(SemanticResult {
            title: Some(title.value),
            categories: category.value,
            priority: priority.map(|found| found.value.as_str().to_string()),
            due_date: deadline.map(|found| found.value),
            confidence,
            details: Some(details),
            error: false,
        })
    }

    fn generate_title(&self, normalized: &str) -> Result<FieldResult<String>, SemanticError> {
        let Some(title_input) = preprocess(normalized, PreprocessOptions::strip_dates()) else {
            return Ok(fallback_title(normalized));
        };

        let tokens = self.tokenizer.tokenize_with_pos(&title_input)?;
        let dropped = self.dropped_words();
        let kept: Vec<&Token> = tokens
            .iter()
            .filter(|token| {
                !token.pos.is_function_word()
                    && !dropped.contains(token.surface.to_lowercase().as_str())
            })
            .collect();

        let scores: Vec<f64> = kept
            .iter()
            .map(|token| {
                let base = pos_weight(token.pos);
                let others: Vec<f64> = kept
                    .iter()
                    .filter(|other| other.surface != token.surface)
                    .map(|other| self.ensemble.similarity(&token.surface, &other.surface))
                    .collect();
                if others.is_empty() {
                    base * LONE_WORD_FACTOR
                } else {
                    base * others.iter().sum::<f64>() / others.len() as f64
                }
            })
            .collect();

        let Some(max_score) = scores.iter().copied().reduce(f64::max) else {
            return Ok(fallback_title(&title_input));
        };
        let threshold = max_score * TITLE_KEEP_RATIO;
        let words: Vec<&str> = kept
            .iter()
            .zip(&scores)
            .filter(|(_, score)| **score >= threshold)
            .map(|(token, _)| token.surface.as_str())
            .collect();

        let title = words.join(" ");
        if title.is_empty() {
            return Ok(fallback_title(&title_input));
        }
        debug!(
            "event=semantic_title module=semantic status=ok kept={} of={}",
            words.len(),
            tokens.len()
        );
        Ok(FieldResult::new(limit_title(&title), max_score))
    }

    fn dropped_words(&self) -> HashSet<String> {
        let mut dropped: HashSet<String> = TIME_WORDS
            .iter()
            .chain(LIGHT_VERBS)
            .chain(FILLER_WORDS)
            .map(|word| (*word).to_string())
            .collect();
        for priority in Priority::ALL {
            dropped.extend(
                self.config
                    .priority_keywords_for(priority)
                    .iter()
                    .filter(|keyword| !keyword.contains(' '))
                    .map(|keyword| keyword.to_lowercase()),
            );
        }
        dropped
    }

    fn estimate_category(&self, normalized: &str) -> FieldResult<Vec<String>> {
        let matcher = CategoryMatcher::new(&self.config);
        match matcher.match_text(normalized, Some(self.ensemble.as_ref())) {
            Some(found) => FieldResult::new(
                found
                    .categories
                    .iter()
                    .map(|category| category.as_str().to_string())
                    .collect(),
                found.confidence,
            ),
            None => FieldResult::new(Vec::new(), 0.0),
        }
    }

    fn estimate_priority(&self, normalized: &str) -> Option<FieldResult<Priority>> {
        let mut best: Option<FieldResult<Priority>> = None;
        for priority in Priority::ALL {
            let keywords = self.config.priority_keywords_for(priority).join(" ");
            let score = self.ensemble.score(normalized, &keywords);
            if score.is_degraded() {
                continue;
            }
            // Most urgent first; strict `>` keeps ties urgent.
            if best
                .as_ref()
                .map_or(true, |current| score.value() > current.confidence)
            {
                best = Some(FieldResult::new(priority, score.value()));
            }
        }
        best
    }

    fn estimate_deadline(
        &self,
        normalized: &str,
        reference: NaiveDate,
    ) -> Option<FieldResult<String>> {
        let mut best: Option<(i64, f64)> = None;
        for hint in &self.config.deadline_hints {
            let score = self.ensemble.score(normalized, &hint.phrase);
            if score.is_degraded() {
                continue;
            }
            if best.map_or(true, |(_, current)| score.value() > current) {
                best = Some((hint.days, score.value()));
            }
        }

        let (days, similarity) = best?;
        if similarity <= self.config.similarity_threshold {
            return None;
        }
        let date = reference.checked_add_days(Days::new(u64::try_from(days).ok()?))?;
        Some(FieldResult::new(
            date.format(DATE_FORMAT).to_string(),
            similarity,
        ))
    }
}

fn pos_weight(pos: PartOfSpeech) -> f64 {
    match pos {
        PartOfSpeech::Noun => 1.0,
        PartOfSpeech::Adjective => 0.8,
        PartOfSpeech::Adverb => 0.6,
        _ => 0.4,
    }
}

fn fallback_title(text: &str) -> FieldResult<String> {
    FieldResult::new(truncate_chars(text, TITLE_MAX_CHARS), TITLE_FALLBACK_CONFIDENCE)
}

fn limit_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        format!("{}...", truncate_chars(title, TITLE_TRUNCATED_CHARS))
    } else {
        title.to_string()
    }
}

fn round3(value: f64) -> f64 {
    clamp_confidence((value * 1000.0).round() / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::{limit_title, round3};

    #[test]
    fn long_titles_are_cut_to_fifty_chars() {
        let long = "word ".repeat(20);
        let limited = limit_title(long.trim());
        assert_eq!(limited.chars().count(), 50);
        assert!(limited.ends_with("..."));
        assert_eq!(limit_title("short title"), "short title");
    }

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(round3(0.123_456), 0.123);
        assert_eq!(round3(0.9996), 1.0);
    }
}
