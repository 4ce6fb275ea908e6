//! Deadline urgency bands.
//!
//! # Invariants
//! - Levels are strictly ascending by `day_threshold`.
//! - The last level is unbounded (`UNBOUNDED_DAYS`), so every day count
//!   maps to exactly one level.

use crate::model::task::Priority;
use serde::{Deserialize, Serialize};

/// Threshold marking the open-ended last level.
pub const UNBOUNDED_DAYS: i64 = i64::MAX;

/// One named band of days-until-due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrgencyLevel {
    pub label: String,
    /// Inclusive upper bound of days-until-due for this band.
    pub day_threshold: i64,
    pub priority: Priority,
    pub confidence: f64,
}

impl UrgencyLevel {
    pub fn new(label: &str, day_threshold: i64, priority: Priority, confidence: f64) -> Self {
        Self {
            label: label.to_string(),
            day_threshold,
            priority,
            confidence,
        }
    }
}

/// Ordered urgency table; the single source of date-implied priority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrgencyTable {
    levels: Vec<UrgencyLevel>,
}

impl UrgencyTable {
    /// Wraps caller-provided levels. Call `validate` before use.
    pub fn new(levels: Vec<UrgencyLevel>) -> Self {
        Self { levels }
    }

    pub fn levels(&self) -> &[UrgencyLevel] {
        &self.levels
    }

    /// Returns the first level whose threshold is `>= days`.
    ///
    /// Returns `None` only for a table that failed validation.
    pub fn lookup(&self, days: i64) -> Option<&UrgencyLevel> {
        self.levels.iter().find(|level| level.day_threshold >= days)
    }

    /// Checks ordering and exhaustiveness.
    pub fn validate(&self) -> Result<(), String> {
        let Some(last) = self.levels.last() else {
            return Err("urgency table must not be empty".to_string());
        };
        if last.day_threshold != UNBOUNDED_DAYS {
            return Err(format!(
                "last urgency level `{}` must be unbounded",
                last.label
            ));
        }
        for pair in self.levels.windows(2) {
            if pair[0].day_threshold >= pair[1].day_threshold {
                return Err(format!(
                    "urgency levels must be strictly ascending: `{}` ({}) >= `{}` ({})",
                    pair[0].label, pair[0].day_threshold, pair[1].label, pair[1].day_threshold
                ));
            }
        }
        for level in &self.levels {
            if !(0.0..=1.0).contains(&level.confidence) {
                return Err(format!(
                    "urgency level `{}` confidence {} is outside [0, 1]",
                    level.label, level.confidence
                ));
            }
        }
        Ok(())
    }
}

impl Default for UrgencyTable {
    fn default() -> Self {
        Self::new(vec![
            UrgencyLevel::new("overdue", -1, Priority::High, 1.0),
            UrgencyLevel::new("due today", 0, Priority::High, 0.9),
            UrgencyLevel::new("due tomorrow", 1, Priority::High, 0.9),
            UrgencyLevel::new("within 3 days", 3, Priority::High, 0.8),
            UrgencyLevel::new("within a week", 7, Priority::High, 0.7),
            UrgencyLevel::new("within two weeks", 14, Priority::Medium, 0.6),
            UrgencyLevel::new("later", UNBOUNDED_DAYS, Priority::Low, 0.5),
        ])
    }
}
