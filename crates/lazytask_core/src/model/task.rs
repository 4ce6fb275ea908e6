//! Task value types shared by extractors, validator and store.
//!
//! # Responsibility
//! - Define the closed vocabularies (`Priority`, `Category`, `TaskStatus`).
//! - Define per-request extraction records and the final `TaskDraft`.
//!
//! # Invariants
//! - `FieldResult::confidence` is always within `[0, 1]`.
//! - `TaskDraft::title` is never empty.
//! - `TaskDraft::categories` contains no duplicates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Task priority, ordered from most to least urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// All priorities, most urgent first.
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Medium, Priority::Low];

    /// Stable string id used in config, storage and output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Urgency rank; larger is more urgent.
    pub fn urgency(self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    /// Returns whether `self` is strictly more urgent than `other`.
    pub fn is_more_urgent_than(self, other: Priority) -> bool {
        self.urgency() > other.urgency()
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one priority token. Accepts surrounding whitespace and any case.
pub fn parse_priority(value: &str) -> Result<Priority, TokenError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "high" => Ok(Priority::High),
        "medium" => Ok(Priority::Medium),
        "low" => Ok(Priority::Low),
        _ => Err(TokenError::UnknownPriority(value.trim().to_string())),
    }
}

/// Valid category tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Math,
    Statistics,
    MachineLearning,
    Theory,
    Programming,
    Submission,
}

impl Category {
    /// The valid-category set in detection order.
    pub const ALL: [Category; 6] = [
        Category::Math,
        Category::Statistics,
        Category::MachineLearning,
        Category::Theory,
        Category::Programming,
        Category::Submission,
    ];

    /// Stable tag used in config, storage and output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "math",
            Self::Statistics => "statistics",
            Self::MachineLearning => "machine_learning",
            Self::Theory => "theory",
            Self::Programming => "programming",
            Self::Submission => "submission",
        }
    }

    /// Human-readable name; also matched directly against input text.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::MachineLearning => "machine learning",
            other => other.as_str(),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one category token by tag or display name.
pub fn parse_category(value: &str) -> Result<Category, TokenError> {
    let normalized = value.trim().to_ascii_lowercase();
    Category::ALL
        .into_iter()
        .find(|category| {
            category.as_str() == normalized || category.display_name() == normalized
        })
        .ok_or_else(|| TokenError::UnknownCategory(value.trim().to_string()))
}

/// Lifecycle state of a stored task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but not started.
    Todo,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

/// Parses one task status token.
pub fn parse_task_status(value: &str) -> Result<TaskStatus, TokenError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "todo" => Ok(TaskStatus::Todo),
        "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
        "done" => Ok(TaskStatus::Done),
        _ => Err(TokenError::UnknownStatus(value.trim().to_string())),
    }
}

/// Vocabulary parse errors for priority/category/status tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    UnknownPriority(String),
    UnknownCategory(String),
    UnknownStatus(String),
}

impl Display for TokenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPriority(value) => write!(f, "unknown priority `{value}`"),
            Self::UnknownCategory(value) => write!(f, "unknown category `{value}`"),
            Self::UnknownStatus(value) => write!(f, "unknown task status `{value}`"),
        }
    }
}

impl Error for TokenError {}

/// Extracted field identifier, used as confidence-map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    DueDate,
    Priority,
    Category,
}

/// One extracted value with its confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldResult<T> {
    pub value: T,
    pub confidence: f64,
}

impl<T> FieldResult<T> {
    /// Creates a field result, clamping confidence into `[0, 1]`.
    pub fn new(value: T, confidence: f64) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Clamps a score into `[0, 1]`; non-finite values become `0`.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Output of one deterministic analysis pass.
///
/// Values are raw strings: explicit `key:value` input is carried verbatim so
/// the validator can reject malformed tokens with a warning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleBasedResult {
    pub title: String,
    pub due_date: Option<String>,
    pub priority: Option<String>,
    pub categories: Vec<String>,
    pub confidence: BTreeMap<Field, f64>,
}

impl RuleBasedResult {
    /// Recorded confidence for one field, if any.
    pub fn confidence_of(&self, field: Field) -> Option<f64> {
        self.confidence.get(&field).copied()
    }

    /// Whether no field carries any extracted signal.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.due_date.is_none()
            && self.priority.is_none()
            && self.categories.is_empty()
    }
}

/// Output of one semantic analysis pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticResult {
    pub title: Option<String>,
    pub categories: Vec<String>,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub confidence: f64,
    pub details: Option<BTreeMap<Field, FieldResult<String>>>,
    /// Set only on the fixed fallback record.
    pub error: bool,
}

impl SemanticResult {
    /// Fixed record returned when semantic analysis fails internally.
    pub fn fallback() -> Self {
        Self {
            title: Some(String::new()),
            categories: Vec::new(),
            priority: Some(Priority::Medium.as_str().to_string()),
            due_date: None,
            confidence: 0.0,
            details: None,
            error: true,
        }
    }

    /// Per-field confidence when details exist, else the overall confidence.
    pub fn confidence_of(&self, field: Field) -> f64 {
        self.details
            .as_ref()
            .and_then(|details| details.get(&field))
            .map_or(self.confidence, |detail| detail.confidence)
    }
}

/// Final validated extraction result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub categories: Vec<Category>,
    pub warnings: Vec<String>,
}

impl TaskDraft {
    /// Due date formatted as `YYYY-MM-DD`.
    pub fn due_date_string(&self) -> Option<String> {
        self.due_date
            .map(|date| date.format(DATE_FORMAT).to_string())
    }

    /// Signed days from `reference` to the due date.
    pub fn days_until_due(&self, reference: NaiveDate) -> Option<i64> {
        self.due_date
            .map(|date| date.signed_duration_since(reference).num_days())
    }
}

/// Calendar date format used on every wire and storage boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
