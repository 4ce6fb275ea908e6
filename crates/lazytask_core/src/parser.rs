//! Top-level extraction pipeline.
//!
//! # Responsibility
//! - Run `Preprocess -> [Semantic] -> RuleBased -> Validate` for one input.
//! - Report "nothing extractable" as `None`, never as an error.
//!
//! # Invariants
//! - Rule-based extraction always sees date trigger words.
//! - A semantic fallback is never merged into the draft.
//! - Logs carry metadata only; input text appears as a char count.

use crate::config::ParserConfig;
use crate::extract::preprocess::{preprocess, PreprocessOptions};
use crate::model::task::TaskDraft;
use crate::rule_based::RuleBasedAnalyzer;
use crate::semantic::analyzer::{SemanticAnalyzer, SemanticOutcome};
use crate::validate::ResultValidator;
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Arc;
use std::time::Instant;

/// Pipeline stage, used in log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preprocess,
    Semantic,
    RuleBased,
    Validate,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preprocess => "preprocess",
            Self::Semantic => "semantic",
            Self::RuleBased => "rule_based",
            Self::Validate => "validate",
        }
    }
}

/// Task extraction entry point.
pub struct TaskParser {
    rule_based: RuleBasedAnalyzer,
    semantic: Option<SemanticAnalyzer>,
    validator: ResultValidator,
}

impl TaskParser {
    /// Rule-based only parser.
    pub fn new(config: Arc<ParserConfig>) -> Self {
        Self {
            rule_based: RuleBasedAnalyzer::new(Arc::clone(&config)),
            semantic: None,
            validator: ResultValidator::new(config),
        }
    }

    /// Enables the semantic path.
    pub fn with_semantic(mut self, analyzer: SemanticAnalyzer) -> Self {
        self.semantic = Some(analyzer);
        self
    }

    pub fn has_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    /// Parses one free-text task description.
    ///
    /// Returns `None` for empty input or input without any extractable field.
    pub fn parse(&self, text: &str, reference: NaiveDate) -> Option<TaskDraft> {
        let started_at = Instant::now();

        let Some(normalized) = preprocess(text, PreprocessOptions::preserve_dates()) else {
            debug!(
                "event=task_parse module=parser stage={} status=empty chars={}",
                Stage::Preprocess.as_str(),
                text.chars().count()
            );
            return None;
        };

        let outcome = self.semantic.as_ref().map(|analyzer| {
            let outcome = analyzer.analyze(&normalized, reference);
            debug!(
                "event=task_parse module=parser stage={} status={}",
                Stage::Semantic.as_str(),
                if outcome.is_fallback() { "fallback" } else { "ok" }
            );
            outcome
        });

        let rule = self.rule_based.analyze(&normalized, reference);
        if rule.is_empty() {
            debug!(
                "event=task_parse module=parser stage={} status=empty",
                Stage::RuleBased.as_str()
            );
            return None;
        }

        let semantic = outcome.as_ref().and_then(SemanticOutcome::analyzed);
        let draft = self.validator.validate(&rule, semantic, reference);

        info!(
            "event=task_parse module=parser stage={} status=ok chars={} semantic={} warnings={} duration_ms={}",
            Stage::Validate.as_str(),
            normalized.chars().count(),
            semantic.is_some(),
            draft.warnings.len(),
            started_at.elapsed().as_millis()
        );
        Some(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::TaskParser;
    use crate::config::ParserConfig;
    use chrono::NaiveDate;
    use std::sync::Arc;

    #[test]
    fn whitespace_only_input_is_none() {
        let parser = TaskParser::new(Arc::new(ParserConfig::default()));
        let reference = NaiveDate::from_ymd_opt(2024, 11, 17).expect("valid date");
        assert!(parser.parse(" \u{3000}\t", reference).is_none());
        assert!(!parser.has_semantic());
    }
}
