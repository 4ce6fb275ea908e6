//! Core extraction pipeline for LazyTask.
//!
//! Turns free-form task descriptions into validated `TaskDraft`s by merging
//! rule-based extraction with an optional similarity-model path, and
//! persists them through a task store.

pub mod config;
pub mod db;
pub mod extract;
pub mod logging;
pub mod model;
pub mod parser;
pub mod repo;
pub mod rule_based;
pub mod semantic;
pub mod service;
pub mod validate;

pub use config::{ConfigError, ParserConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::task::{
    Category, Field, FieldResult, Priority, RuleBasedResult, SemanticResult, TaskDraft,
    TaskStatus,
};
pub use model::urgency::{UrgencyLevel, UrgencyTable};
pub use parser::TaskParser;
pub use repo::task_repo::{
    SqliteTaskStore, StoreError, StoreResponse, StoreResult, StoredTask, TaskFilter, TaskStore,
};
pub use semantic::analyzer::{SemanticAnalyzer, SemanticError, SemanticOutcome};
pub use semantic::ensemble::{EnsembleScore, SimilarityEnsemble};
pub use semantic::model::{CharNgramModel, EmbeddingModel, ModelError, ModelHandle, ModelKind};
pub use semantic::tokenizer::{LexiconTokenizer, Tokenizer};
pub use service::task_service::TaskService;
pub use validate::ResultValidator;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::sync::Arc;

static DEFAULT_PARSER: Lazy<TaskParser> =
    Lazy::new(|| TaskParser::new(Arc::new(ParserConfig::default())));

/// Parses one task description with the default rule-based configuration.
///
/// Returns `None` when the text holds no extractable task information.
pub fn parse_task_info(text: &str, reference_date: NaiveDate) -> Option<TaskDraft> {
    DEFAULT_PARSER.parse(text, reference_date)
}

/// Minimal health-check API.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
