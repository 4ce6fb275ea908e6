//! Date expression extraction.
//!
//! # Responsibility
//! - Recognize absolute and relative English date expressions.
//! - Resolve them against a caller-provided reference date.
//! - Remove the matched span (and an attached deadline marker) from text.
//!
//! # Invariants
//! - Patterns are tried in a fixed order; the first resolvable match wins,
//!   including a later match of the same pattern.
//! - A `YYYY-MM-DD` match always carries confidence `1.0`.
//! - Unresolvable captures (e.g. `02-30`) are skipped, never errors.

use crate::config::ParserConfig;
use crate::extract::text::{phrase_alternation, trim_separators};
use chrono::{Datelike, Days, NaiveDate};
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Match, Regex};

/// Resolved date with its confidence and the text left after removal.
#[derive(Debug, Clone, PartialEq)]
pub struct DateMatch {
    pub date: NaiveDate,
    pub confidence: f64,
    pub remaining_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateKind {
    /// `YYYY-MM-DD`.
    Absolute,
    /// `MM-DD`; year is inferred.
    MonthDay,
    /// `today`, `tomorrow`, `in N days`.
    RelativeDay,
    /// Weekend, month-end and weekday expressions.
    Calendar,
}

impl DateKind {
    fn confidence(self, has_marker: bool) -> f64 {
        match (self, has_marker) {
            (Self::Absolute, _) => 1.0,
            (Self::MonthDay, true) => 1.0,
            (Self::MonthDay, false) => 0.9,
            (Self::RelativeDay, true) => 0.95,
            (Self::RelativeDay, false) => 0.9,
            (Self::Calendar, true) => 0.9,
            (Self::Calendar, false) => 0.8,
        }
    }
}

type Resolver = fn(&Captures<'_>, NaiveDate) -> Option<NaiveDate>;

struct DatePattern {
    name: &'static str,
    kind: DateKind,
    regex: Regex,
    resolve: Resolver,
}

impl DatePattern {
    fn new(name: &'static str, kind: DateKind, pattern: &str, resolve: Resolver) -> Self {
        Self {
            name,
            kind,
            regex: Regex::new(pattern).expect("valid date pattern"),
            resolve,
        }
    }

    /// First match that resolves to a calendar date, with its span.
    fn first_resolvable<'t>(
        &self,
        text: &'t str,
        reference: NaiveDate,
    ) -> Option<(NaiveDate, Match<'t>)> {
        for captures in self.regex.captures_iter(text) {
            match ((self.resolve)(&captures, reference), captures.get(0)) {
                (Some(date), Some(span)) => return Some((date, span)),
                _ => debug!(
                    "event=date_extract module=extract status=skip pattern={} reason=unresolvable",
                    self.name
                ),
            }
        }
        None
    }
}

static DATE_PATTERNS: Lazy<Vec<DatePattern>> = Lazy::new(|| {
    vec![
        DatePattern::new(
            "iso_date",
            DateKind::Absolute,
            r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b",
            resolve_iso,
        ),
        DatePattern::new(
            "month_day",
            DateKind::MonthDay,
            r"\b(\d{1,2})-(\d{1,2})\b",
            resolve_month_day,
        ),
        DatePattern::new(
            "day_after_tomorrow",
            DateKind::RelativeDay,
            r"(?i)\bday\s+after\s+tomorrow\b",
            |_, reference| reference.checked_add_days(Days::new(2)),
        ),
        DatePattern::new(
            "today",
            DateKind::RelativeDay,
            r"(?i)\btoday\b",
            |_, reference| Some(reference),
        ),
        DatePattern::new(
            "tomorrow",
            DateKind::RelativeDay,
            r"(?i)\btomorrow\b",
            |_, reference| reference.checked_add_days(Days::new(1)),
        ),
        DatePattern::new(
            "days_later",
            DateKind::RelativeDay,
            r"(?i)\b(?:in\s+(\d{1,3})\s+days?|(\d{1,3})\s+days?\s+later)\b",
            resolve_days_later,
        ),
        DatePattern::new(
            "weekend",
            DateKind::Calendar,
            r"(?i)\b(this|next)\s+weekend\b",
            resolve_weekend,
        ),
        DatePattern::new(
            "month_end",
            DateKind::Calendar,
            r"(?i)\bend\s+of\s+(this|the|next)\s+month\b",
            resolve_month_end,
        ),
        DatePattern::new(
            "weekday",
            DateKind::Calendar,
            r"(?i)\b(this|next)\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            resolve_weekday,
        ),
    ]
});

/// Extracts the first resolvable date expression from text.
pub struct DateExtractor {
    marker_re: Option<Regex>,
    attached_marker_re: Option<Regex>,
}

impl DateExtractor {
    /// Builds marker matchers from `config.deadline_markers`.
    pub fn new(config: &ParserConfig) -> Self {
        let marker_re = phrase_alternation(&config.deadline_markers);
        let attached_marker_re = marker_re.as_ref().and_then(|re| {
            // Reuse the alternation body, anchored to the end of the prefix.
            let body = re.as_str().trim_start_matches("(?i)");
            Regex::new(&format!(r"(?i){body}(?:\s+on)?\s*:?\s*$")).ok()
        });
        Self {
            marker_re,
            attached_marker_re,
        }
    }

    /// Returns `None` when no pattern resolves to a calendar date.
    pub fn extract(&self, text: &str, reference: NaiveDate) -> Option<DateMatch> {
        let has_marker = self
            .marker_re
            .as_ref()
            .is_some_and(|re| re.is_match(text));

        for pattern in DATE_PATTERNS.iter() {
            let Some((date, span)) = pattern.first_resolvable(text, reference) else {
                continue;
            };

            let start = self.span_start_with_marker(text, span.start());
            let remaining_text =
                trim_separators(&format!("{} {}", &text[..start], &text[span.end()..]));
            let confidence = pattern.kind.confidence(has_marker);
            debug!(
                "event=date_extract module=extract status=ok pattern={} marker={} confidence={}",
                pattern.name, has_marker, confidence
            );
            return Some(DateMatch {
                date,
                confidence,
                remaining_text,
            });
        }

        None
    }

    fn span_start_with_marker(&self, text: &str, start: usize) -> usize {
        self.attached_marker_re
            .as_ref()
            .and_then(|re| re.find(&text[..start]))
            .map_or(start, |marker| marker.start())
    }
}

fn capture_u32(captures: &Captures<'_>, index: usize) -> Option<u32> {
    captures.get(index)?.as_str().parse().ok()
}

fn resolve_iso(captures: &Captures<'_>, _reference: NaiveDate) -> Option<NaiveDate> {
    let year = captures.get(1)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, capture_u32(captures, 2)?, capture_u32(captures, 3)?)
}

fn resolve_month_day(captures: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
    let month = capture_u32(captures, 1)?;
    let day = capture_u32(captures, 2)?;
    let this_year = NaiveDate::from_ymd_opt(reference.year(), month, day)?;
    if this_year >= reference {
        return Some(this_year);
    }
    NaiveDate::from_ymd_opt(reference.year() + 1, month, day)
}

fn resolve_days_later(captures: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
    let days = capture_u32(captures, 1).or_else(|| capture_u32(captures, 2))?;
    reference.checked_add_days(Days::new(u64::from(days)))
}

fn resolve_weekend(captures: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
    let weekday = i64::from(reference.weekday().num_days_from_monday());
    let offset = if captures.get(1)?.as_str().eq_ignore_ascii_case("next") {
        12 - weekday
    } else {
        // On Sunday the current weekend is today.
        (5 - weekday).max(0)
    };
    reference.checked_add_days(Days::new(u64::try_from(offset).ok()?))
}

fn resolve_month_end(captures: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if captures.get(1)?.as_str().eq_ignore_ascii_case("next") {
        if reference.month() == 12 {
            (reference.year() + 1, 1)
        } else {
            (reference.year(), reference.month() + 1)
        }
    } else {
        (reference.year(), reference.month())
    };
    last_day_of_month(year, month)
}

fn resolve_weekday(captures: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
    let target = weekday_index(captures.get(2)?.as_str())?;
    let current = i64::from(reference.weekday().num_days_from_monday());
    let mut days_ahead = target - current;
    if days_ahead <= 0 {
        days_ahead += 7;
    }
    if captures.get(1)?.as_str().eq_ignore_ascii_case("next") {
        days_ahead += 7;
    }
    reference.checked_add_days(Days::new(u64::try_from(days_ahead).ok()?))
}

fn weekday_index(name: &str) -> Option<i64> {
    let index = match name.to_ascii_lowercase().as_str() {
        "monday" => 0,
        "tuesday" => 1,
        "wednesday" => 2,
        "thursday" => 3,
        "friday" => 4,
        "saturday" => 5,
        "sunday" => 6,
        _ => return None,
    };
    Some(index)
}

/// Last calendar day of `year-month`.
pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
