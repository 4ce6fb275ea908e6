//! Deterministic task analysis.
//!
//! # Responsibility
//! - Parse explicit `title | due: ... | priority: ... | category: ...`
//!   input verbatim.
//! - Otherwise extract date, categories and priority from natural text
//!   and clean the remainder into a title.
//!
//! # Invariants
//! - Explicit values are carried as raw strings; validation happens later.
//! - Every field present in the result has a confidence entry.

use crate::config::ParserConfig;
use crate::extract::category::CategoryMatcher;
use crate::extract::date::DateExtractor;
use crate::extract::priority::PriorityMatcher;
use crate::extract::title::TitleCleaner;
use crate::model::task::{Field, RuleBasedResult, DATE_FORMAT};
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;

const FORMAT_SEPARATOR: char = '|';
const EXPLICIT_CONFIDENCE: f64 = 1.0;
const NATURAL_TITLE_CONFIDENCE: f64 = 0.8;

/// Always-available extraction path.
pub struct RuleBasedAnalyzer {
    config: Arc<ParserConfig>,
    dates: DateExtractor,
    titles: TitleCleaner,
}

impl RuleBasedAnalyzer {
    pub fn new(config: Arc<ParserConfig>) -> Self {
        let dates = DateExtractor::new(&config);
        let titles = TitleCleaner::new(&config);
        Self {
            config,
            dates,
            titles,
        }
    }

    /// Analyzes preprocessed text.
    pub fn analyze(&self, text: &str, reference: NaiveDate) -> RuleBasedResult {
        if text.contains(FORMAT_SEPARATOR) {
            self.analyze_formatted(text)
        } else {
            self.analyze_natural(text, reference)
        }
    }

    fn analyze_formatted(&self, text: &str) -> RuleBasedResult {
        let mut parts = text.split(FORMAT_SEPARATOR).map(str::trim);
        let mut result = RuleBasedResult {
            title: parts.next().unwrap_or_default().to_string(),
            ..RuleBasedResult::default()
        };
        if !result.title.is_empty() {
            result.confidence.insert(Field::Title, EXPLICIT_CONFIDENCE);
        }

        for part in parts {
            let Some((key, value)) = part.split_once(':') else {
                debug!(
                    "event=rule_based module=rule_based status=skip reason=component_without_key"
                );
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.trim().to_ascii_lowercase().as_str() {
                "due" | "deadline" => {
                    result.due_date = Some(value.to_string());
                    result.confidence.insert(Field::DueDate, EXPLICIT_CONFIDENCE);
                }
                "priority" => {
                    result.priority = Some(value.to_string());
                    result.confidence.insert(Field::Priority, EXPLICIT_CONFIDENCE);
                }
                "category" | "categories" => {
                    result.categories = value
                        .split(',')
                        .map(str::trim)
                        .filter(|token| !token.is_empty())
                        .map(str::to_string)
                        .collect();
                    result.confidence.insert(Field::Category, EXPLICIT_CONFIDENCE);
                }
                other => debug!(
                    "event=rule_based module=rule_based status=skip reason=unknown_key key={other}"
                ),
            }
        }

        debug!(
            "event=rule_based module=rule_based status=ok path=formatted fields={}",
            result.confidence.len()
        );
        result
    }

    fn analyze_natural(&self, text: &str, reference: NaiveDate) -> RuleBasedResult {
        let mut result = RuleBasedResult::default();
        let mut remaining = text.to_string();
        let mut days_until_due = None;

        if let Some(found) = self.dates.extract(text, reference) {
            result.due_date = Some(found.date.format(DATE_FORMAT).to_string());
            result.confidence.insert(Field::DueDate, found.confidence);
            days_until_due = Some(found.date.signed_duration_since(reference).num_days());
            remaining = found.remaining_text;
        }

        if let Some(found) = CategoryMatcher::new(&self.config).match_text(&remaining, None) {
            result.categories = found
                .categories
                .iter()
                .map(|category| category.as_str().to_string())
                .collect();
            result.confidence.insert(Field::Category, found.confidence);
        }

        if let Some(found) = PriorityMatcher::new(&self.config).match_text(text, days_until_due) {
            result.priority = Some(found.priority.as_str().to_string());
            result.confidence.insert(Field::Priority, found.confidence);
        }

        result.title = self.titles.clean(&remaining);
        if !result.title.is_empty() {
            result
                .confidence
                .insert(Field::Title, NATURAL_TITLE_CONFIDENCE);
        }

        debug!(
            "event=rule_based module=rule_based status=ok path=natural fields={}",
            result.confidence.len()
        );
        result
    }
}
