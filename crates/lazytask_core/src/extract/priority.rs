//! Priority detection from keywords and deadline proximity.
//!
//! # Invariants
//! - Keyword confidence is `base + step * matches`, capped at the max.
//! - Deadline confidence comes from the urgency table only.
//! - On equal confidence the deadline-implied priority wins.

use crate::config::ParserConfig;
use crate::extract::text::contains_phrase;
use crate::model::task::Priority;
use log::debug;
use serde::{Deserialize, Serialize};

/// Which signal produced a priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrioritySource {
    Keyword,
    Deadline,
}

impl PrioritySource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Deadline => "deadline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityMatch {
    pub priority: Priority,
    pub confidence: f64,
    pub source: PrioritySource,
}

/// Keyword and urgency-table priority matcher.
pub struct PriorityMatcher<'a> {
    config: &'a ParserConfig,
}

impl<'a> PriorityMatcher<'a> {
    pub fn new(config: &'a ParserConfig) -> Self {
        Self { config }
    }

    /// Combines the keyword and deadline signals.
    ///
    /// Returns `None` when neither a keyword nor a due date is available.
    pub fn match_text(&self, text: &str, days_until_due: Option<i64>) -> Option<PriorityMatch> {
        let keyword = self.match_keywords(text);
        let deadline = days_until_due.and_then(|days| self.match_deadline(days));

        let chosen = match (keyword, deadline) {
            (Some(keyword), Some(deadline)) => {
                if keyword.confidence > deadline.confidence {
                    Some(keyword)
                } else {
                    Some(deadline)
                }
            }
            (keyword, deadline) => keyword.or(deadline),
        };

        if let Some(found) = chosen {
            debug!(
                "event=priority_match module=extract status=ok source={} priority={} confidence={}",
                found.source.as_str(),
                found.priority,
                found.confidence
            );
        }
        chosen
    }

    /// Best keyword tier; ties go to the more urgent tier.
    pub fn match_keywords(&self, text: &str) -> Option<PriorityMatch> {
        let mut best: Option<PriorityMatch> = None;
        for priority in Priority::ALL {
            let matches = self
                .config
                .priority_keywords_for(priority)
                .iter()
                .filter(|keyword| contains_phrase(text, keyword))
                .count();
            if matches == 0 {
                continue;
            }

            let confidence = (self.config.keyword_base_confidence
                + self.config.keyword_confidence_step * matches as f64)
                .min(self.config.keyword_max_confidence);
            // `Priority::ALL` is most urgent first, so strict `>` keeps ties urgent.
            if best.map_or(true, |current| confidence > current.confidence) {
                best = Some(PriorityMatch {
                    priority,
                    confidence,
                    source: PrioritySource::Keyword,
                });
            }
        }
        best
    }

    /// Urgency-table priority for a signed day count.
    pub fn match_deadline(&self, days_until_due: i64) -> Option<PriorityMatch> {
        self.config
            .urgency
            .lookup(days_until_due)
            .map(|level| PriorityMatch {
                priority: level.priority,
                confidence: level.confidence,
                source: PrioritySource::Deadline,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{PriorityMatcher, PrioritySource};
    use crate::config::ParserConfig;
    use crate::model::task::Priority;

    #[test]
    fn keyword_confidence_grows_with_matches() {
        let config = ParserConfig::default();
        let found = PriorityMatcher::new(&config)
            .match_keywords("urgent and important, do it asap")
            .expect("keyword match");
        assert_eq!(found.priority, Priority::High);
        assert!((found.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn keyword_tie_prefers_more_urgent_tier() {
        let config = ParserConfig::default();
        let found = PriorityMatcher::new(&config)
            .match_keywords("urgent, but no rush")
            .expect("keyword match");
        assert_eq!(found.priority, Priority::High);
    }

    #[test]
    fn equal_confidence_prefers_deadline() {
        let config = ParserConfig::default();
        // "someday" -> low 0.6; 10 days -> medium 0.6.
        let found = PriorityMatcher::new(&config)
            .match_text("someday tidy the notes", Some(10))
            .expect("priority");
        assert_eq!(found.priority, Priority::Medium);
        assert_eq!(found.source, PrioritySource::Deadline);
    }

    #[test]
    fn no_signal_is_none() {
        let config = ParserConfig::default();
        assert!(PriorityMatcher::new(&config)
            .match_text("tidy the notes", None)
            .is_none());
    }
}
