//! Merge of rule-based and semantic results.
//!
//! # Responsibility
//! - Pick one value per field from the two analysis paths.
//! - Reject malformed field values with a warning instead of failing.
//! - Keep priority consistent with the deadline.
//!
//! # Invariants
//! - The draft title is never empty.
//! - Draft categories are valid and unique.
//! - Priority is never silently lowered below the deadline-implied level.
//! - Warnings are ordered: date, priority, category, title.

use crate::config::ParserConfig;
use crate::model::task::{
    parse_category, parse_priority, Category, Field, Priority, RuleBasedResult, SemanticResult,
    TaskDraft, DATE_FORMAT,
};
use chrono::NaiveDate;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Title used when neither path produced one.
pub const UNTITLED_TASK: &str = "untitled task";

/// Days-until-due at or below which a deadline counts as approaching.
const APPROACHING_DAYS: i64 = 3;

static DATE_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date shape regex"));

/// Field-by-field arbiter between the two analysis paths.
pub struct ResultValidator {
    config: Arc<ParserConfig>,
}

#[derive(Default)]
struct Warnings {
    date: Vec<String>,
    priority: Vec<String>,
    category: Vec<String>,
    title: Vec<String>,
}

impl Warnings {
    fn into_ordered(self) -> Vec<String> {
        self.date
            .into_iter()
            .chain(self.priority)
            .chain(self.category)
            .chain(self.title)
            .collect()
    }
}

impl ResultValidator {
    pub fn new(config: Arc<ParserConfig>) -> Self {
        Self { config }
    }

    /// Merges both results into a draft.
    ///
    /// `semantic` is `None` when the model path is disabled or fell back.
    pub fn validate(
        &self,
        rule: &RuleBasedResult,
        semantic: Option<&SemanticResult>,
        reference: NaiveDate,
    ) -> TaskDraft {
        let mut warnings = Warnings::default();

        let due_date = select_due_date(rule, semantic, &mut warnings.date);
        let days_until_due = due_date.map(|date| date.signed_duration_since(reference).num_days());
        match days_until_due {
            Some(days) if days < 0 => warnings.date.push(format!(
                "deadline passed ({} {} overdue)",
                -days,
                day_word(-days)
            )),
            Some(days) if days <= APPROACHING_DAYS => warnings.date.push(format!(
                "deadline approaching ({days} {} left)",
                day_word(days)
            )),
            Some(_) => {}
            None => warnings.date.push("no deadline set".to_string()),
        }

        let chosen = select_priority(rule, semantic, &mut warnings.priority);
        let priority = match days_until_due {
            Some(days) => self.reconcile_priority(chosen, days, &mut warnings.priority),
            None => chosen,
        };

        let categories = merge_categories(rule, semantic, &mut warnings.category);
        match categories.len() {
            0 => warnings.category.push("no category set".to_string()),
            1 => {}
            _ => warnings
                .category
                .push("multiple categories detected".to_string()),
        }

        let title = match select_title(rule, semantic) {
            Some(title) => title,
            None => {
                warnings.title.push("no title set".to_string());
                UNTITLED_TASK.to_string()
            }
        };

        let warnings = warnings.into_ordered();
        debug!(
            "event=validate module=validate status=ok priority={} categories={} has_deadline={} warnings={}",
            priority,
            categories.len(),
            due_date.is_some(),
            warnings.len()
        );

        TaskDraft {
            title,
            due_date,
            priority,
            categories,
            warnings,
        }
    }

    fn reconcile_priority(
        &self,
        chosen: Priority,
        days: i64,
        warnings: &mut Vec<String>,
    ) -> Priority {
        let Some(level) = self.config.urgency.lookup(days) else {
            return chosen;
        };
        let implied = level.priority;
        if implied.is_more_urgent_than(chosen) {
            debug!(
                "event=validate module=validate status=upgrade from={} to={} level={}",
                chosen, implied, level.label
            );
            implied
        } else {
            if chosen.is_more_urgent_than(implied) {
                warnings.push(format!(
                    "priority {chosen} is higher than the deadline suggests ({implied})"
                ));
            }
            chosen
        }
    }
}

fn day_word(days: i64) -> &'static str {
    if days == 1 {
        "day"
    } else {
        "days"
    }
}

fn parse_due_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if !DATE_SHAPE_RE.is_match(raw) {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

fn select_due_date(
    rule: &RuleBasedResult,
    semantic: Option<&SemanticResult>,
    warnings: &mut Vec<String>,
) -> Option<NaiveDate> {
    let candidates = rule
        .due_date
        .iter()
        .chain(semantic.and_then(|result| result.due_date.as_ref()));
    for raw in candidates {
        match parse_due_date(raw) {
            Some(date) => return Some(date),
            None => {
                warn!("event=validate module=validate status=reject field=due_date");
                warnings.push(format!("invalid deadline format: {raw}"));
            }
        }
    }
    None
}

fn select_priority(
    rule: &RuleBasedResult,
    semantic: Option<&SemanticResult>,
    warnings: &mut Vec<String>,
) -> Priority {
    let mut accept = |raw: &String| match parse_priority(raw) {
        Ok(priority) => Some(priority),
        Err(_) => {
            warnings.push(format!("invalid priority: {raw}"));
            None
        }
    };

    let from_rule = rule.priority.as_ref().and_then(&mut accept).map(|priority| {
        (
            priority,
            rule.confidence_of(Field::Priority).unwrap_or_default(),
        )
    });
    let from_semantic = semantic.and_then(|result| {
        result
            .priority
            .as_ref()
            .and_then(&mut accept)
            .map(|priority| (priority, result.confidence_of(Field::Priority)))
    });

    match (from_rule, from_semantic) {
        (Some((rule_priority, rule_confidence)), Some((model_priority, model_confidence))) => {
            if model_priority.is_more_urgent_than(rule_priority) {
                warnings.push("model suggests higher priority".to_string());
            }
            if model_confidence > rule_confidence {
                model_priority
            } else {
                rule_priority
            }
        }
        (Some((priority, _)), None) | (None, Some((priority, _))) => priority,
        (None, None) => Priority::Medium,
    }
}

fn merge_categories(
    rule: &RuleBasedResult,
    semantic: Option<&SemanticResult>,
    warnings: &mut Vec<String>,
) -> Vec<Category> {
    let semantic_categories = semantic.map_or(&[][..], |result| result.categories.as_slice());
    let mut merged = Vec::new();
    for raw in rule.categories.iter().chain(semantic_categories) {
        match parse_category(raw) {
            Ok(category) if !merged.contains(&category) => merged.push(category),
            Ok(_) => {}
            Err(_) => warnings.push(format!("invalid category: {raw}")),
        }
    }
    merged
}

fn select_title(rule: &RuleBasedResult, semantic: Option<&SemanticResult>) -> Option<String> {
    let rule_title = Some(rule.title.trim()).filter(|title| !title.is_empty());
    let model_title = semantic
        .and_then(|result| result.title.as_deref())
        .map(str::trim)
        .filter(|title| !title.is_empty());

    let chosen = match (rule_title, model_title) {
        (Some(rule_title), Some(model_title)) => {
            let model_confidence =
                semantic.map_or(0.0, |result| result.confidence_of(Field::Title));
            match rule.confidence_of(Field::Title) {
                Some(rule_confidence) if model_confidence > rule_confidence => model_title,
                _ => rule_title,
            }
        }
        (Some(title), None) | (None, Some(title)) => title,
        (None, None) => return None,
    };
    Some(chosen.to_string())
}
