//! Parser configuration.
//!
//! # Responsibility
//! - Hold keyword dictionaries, thresholds, urgency table and model weights
//!   in one immutable object built once at startup.
//! - Load overrides from JSON and validate them before use.
//!
//! # Invariants
//! - A config handed to extractors has passed `validate()`.
//! - Every category and priority has at least one keyword.

use crate::model::task::{Category, Priority};
use crate::model::urgency::UrgencyTable;
use crate::semantic::model::{default_model_weights, ModelKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Configuration load/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config json: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Upper bound for `max_explicit_categories`.
pub const EXPLICIT_CATEGORY_LIMIT: usize = 3;
/// Upper bound for `max_similarity_categories`.
pub const SIMILARITY_CATEGORY_LIMIT: usize = 2;

/// Phrase the semantic path compares against to guess a deadline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineHint {
    pub phrase: String,
    pub days: i64,
}

impl DeadlineHint {
    fn new(phrase: &str, days: i64) -> Self {
        Self {
            phrase: phrase.to_string(),
            days,
        }
    }
}

/// Immutable extraction configuration.
///
/// Missing JSON fields fall back to `ParserConfig::default()` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub category_keywords: BTreeMap<Category, Vec<String>>,
    pub priority_keywords: BTreeMap<Priority, Vec<String>>,
    pub deadline_markers: Vec<String>,
    pub deadline_hints: Vec<DeadlineHint>,
    pub urgency: UrgencyTable,
    /// Minimum similarity for similarity-ranked categories and deadlines.
    pub similarity_threshold: f64,
    /// Confidence penalty per explicit category beyond the first.
    pub explicit_category_penalty: f64,
    pub max_explicit_categories: usize,
    pub max_similarity_categories: usize,
    pub keyword_base_confidence: f64,
    pub keyword_confidence_step: f64,
    pub keyword_max_confidence: f64,
    pub model_weights: BTreeMap<ModelKind, f64>,
    /// Per-call model timeout; `None` runs calls inline without a deadline.
    pub model_timeout_ms: Option<u64>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            category_keywords: BTreeMap::from([
                (
                    Category::Math,
                    words(&[
                        "math",
                        "calculation",
                        "equation",
                        "proof",
                        "derivative",
                        "integral",
                        "algebra",
                        "geometry",
                    ]),
                ),
                (
                    Category::Statistics,
                    words(&[
                        "statistics",
                        "statistical",
                        "probability",
                        "distribution",
                        "sample",
                        "hypothesis test",
                        "estimation",
                        "regression",
                    ]),
                ),
                (
                    Category::MachineLearning,
                    words(&[
                        "machine learning",
                        "ml",
                        "ai",
                        "model",
                        "prediction",
                        "classification",
                        "neural network",
                    ]),
                ),
                (
                    Category::Theory,
                    words(&["theory", "principle", "theorem", "axiom", "lemma"]),
                ),
                (
                    Category::Programming,
                    words(&[
                        "code",
                        "coding",
                        "program",
                        "programming",
                        "implement",
                        "debug",
                        "development",
                    ]),
                ),
                (
                    Category::Submission,
                    words(&["submit", "submission", "hand in", "turn in", "upload"]),
                ),
            ]),
            priority_keywords: BTreeMap::from([
                (
                    Priority::High,
                    words(&[
                        "urgent",
                        "important",
                        "asap",
                        "immediately",
                        "must",
                        "critical",
                        "right now",
                    ]),
                ),
                (
                    Priority::Medium,
                    words(&[
                        "soon",
                        "if possible",
                        "when possible",
                        "preferably",
                        "before long",
                    ]),
                ),
                (
                    Priority::Low,
                    words(&[
                        "someday",
                        "no rush",
                        "whenever",
                        "eventually",
                        "take your time",
                        "low priority",
                    ]),
                ),
            ]),
            deadline_markers: words(&["by", "due", "deadline", "until", "before"]),
            deadline_hints: vec![
                DeadlineHint::new("tomorrow", 1),
                DeadlineHint::new("day after tomorrow", 2),
                DeadlineHint::new("this week", 7),
                DeadlineHint::new("next week", 7),
                DeadlineHint::new("this month", 30),
            ],
            urgency: UrgencyTable::default(),
            similarity_threshold: 0.3,
            explicit_category_penalty: 0.1,
            max_explicit_categories: EXPLICIT_CATEGORY_LIMIT,
            max_similarity_categories: SIMILARITY_CATEGORY_LIMIT,
            keyword_base_confidence: 0.5,
            keyword_confidence_step: 0.1,
            keyword_max_confidence: 1.0,
            model_weights: default_model_weights(),
            model_timeout_ms: Some(2_000),
        }
    }
}

impl ParserConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Keywords for one category; empty when unconfigured.
    pub fn category_keywords_for(&self, category: Category) -> &[String] {
        self.category_keywords
            .get(&category)
            .map_or(&[], Vec::as_slice)
    }

    /// Keywords for one priority tier; empty when unconfigured.
    pub fn priority_keywords_for(&self, priority: Priority) -> &[String] {
        self.priority_keywords
            .get(&priority)
            .map_or(&[], Vec::as_slice)
    }

    /// Checks structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for category in Category::ALL {
            if !has_keywords(self.category_keywords.get(&category)) {
                return Err(ConfigError::Invalid(format!(
                    "category `{category}` needs at least one keyword"
                )));
            }
        }
        for priority in Priority::ALL {
            if !has_keywords(self.priority_keywords.get(&priority)) {
                return Err(ConfigError::Invalid(format!(
                    "priority `{priority}` needs at least one keyword"
                )));
            }
        }

        self.urgency.validate().map_err(ConfigError::Invalid)?;

        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("explicit_category_penalty", self.explicit_category_penalty),
            ("keyword_base_confidence", self.keyword_base_confidence),
            ("keyword_confidence_step", self.keyword_confidence_step),
            ("keyword_max_confidence", self.keyword_max_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.keyword_base_confidence > self.keyword_max_confidence {
            return Err(ConfigError::Invalid(
                "keyword_base_confidence must not exceed keyword_max_confidence".to_string(),
            ));
        }
        for (name, value, limit) in [
            (
                "max_explicit_categories",
                self.max_explicit_categories,
                EXPLICIT_CATEGORY_LIMIT,
            ),
            (
                "max_similarity_categories",
                self.max_similarity_categories,
                SIMILARITY_CATEGORY_LIMIT,
            ),
        ] {
            if !(1..=limit).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within [1, {limit}], got {value}"
                )));
            }
        }

        for (kind, weight) in &self.model_weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "model weight for `{}` must be a non-negative number, got {weight}",
                    kind.as_str()
                )));
            }
        }
        if self.model_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "model_timeout_ms must be positive when set".to_string(),
            ));
        }

        Ok(())
    }
}

fn has_keywords(keywords: Option<&Vec<String>>) -> bool {
    keywords.is_some_and(|values| values.iter().any(|value| !value.trim().is_empty()))
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}
