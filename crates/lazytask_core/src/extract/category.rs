//! Category detection.
//!
//! # Responsibility
//! - Detect explicitly mentioned categories by name or keyword.
//! - Rank categories by ensemble similarity when nothing is explicit.
//!
//! # Invariants
//! - Explicit categories are reported in valid-set order.
//! - Similarity-ranked categories are reported by descending score.
//! - A fully degraded ensemble never fabricates a category.

use crate::config::{ParserConfig, EXPLICIT_CATEGORY_LIMIT, SIMILARITY_CATEGORY_LIMIT};
use crate::extract::text::contains_phrase;
use crate::model::task::Category;
use crate::semantic::ensemble::SimilarityEnsemble;
use log::debug;
use std::collections::BTreeMap;

/// Categories found in one text.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub categories: Vec<Category>,
    pub confidence: f64,
    /// Whether the categories were named in the text.
    pub explicit: bool,
    /// Per-category similarity; empty for explicit matches.
    pub scores: BTreeMap<Category, f64>,
}

/// Keyword and similarity based category matcher.
pub struct CategoryMatcher<'a> {
    config: &'a ParserConfig,
}

impl<'a> CategoryMatcher<'a> {
    pub fn new(config: &'a ParserConfig) -> Self {
        Self { config }
    }

    /// Returns `None` when nothing is explicit and no usable ensemble exists.
    pub fn match_text(
        &self,
        text: &str,
        ensemble: Option<&SimilarityEnsemble>,
    ) -> Option<CategoryMatch> {
        if text.trim().is_empty() {
            return None;
        }

        if let Some(found) = self.match_explicit(text) {
            return Some(found);
        }

        let ensemble = ensemble?;
        self.match_by_similarity(text, ensemble)
    }

    fn match_explicit(&self, text: &str) -> Option<CategoryMatch> {
        let categories: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|category| {
                contains_phrase(text, category.display_name())
                    || self
                        .config
                        .category_keywords_for(*category)
                        .iter()
                        .any(|keyword| contains_phrase(text, keyword))
            })
            .take(self.config.max_explicit_categories.min(EXPLICIT_CATEGORY_LIMIT))
            .collect();

        if categories.is_empty() {
            return None;
        }

        let extra = categories.len().saturating_sub(1) as f64;
        let confidence = (1.0 - self.config.explicit_category_penalty * extra).max(0.0);
        debug!(
            "event=category_match module=extract status=ok path=explicit count={} confidence={}",
            categories.len(),
            confidence
        );
        Some(CategoryMatch {
            categories,
            confidence,
            explicit: true,
            scores: BTreeMap::new(),
        })
    }

    fn match_by_similarity(
        &self,
        text: &str,
        ensemble: &SimilarityEnsemble,
    ) -> Option<CategoryMatch> {
        let mut scored = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let keywords = self.config.category_keywords_for(category).join(" ");
            let score = ensemble.score(text, &keywords);
            if score.is_degraded() {
                continue;
            }
            scored.push((category, score.value()));
        }

        if scored.is_empty() {
            debug!(
                "event=category_match module=extract status=skip path=similarity reason=degraded"
            );
            return None;
        }

        let scores: BTreeMap<Category, f64> = scored.iter().copied().collect();
        // Stable sort keeps valid-set order among equal scores.
        scored.sort_by(|left, right| right.1.total_cmp(&left.1));

        let mut categories: Vec<Category> = scored
            .iter()
            .filter(|(_, score)| *score > self.config.similarity_threshold)
            .take(
                self.config
                    .max_similarity_categories
                    .min(SIMILARITY_CATEGORY_LIMIT),
            )
            .map(|(category, _)| *category)
            .collect();
        let (best, best_score) = scored[0];
        if categories.is_empty() {
            categories.push(best);
        }

        debug!(
            "event=category_match module=extract status=ok path=similarity count={} confidence={:.3}",
            categories.len(),
            best_score
        );
        Some(CategoryMatch {
            categories,
            confidence: best_score,
            explicit: false,
            scores,
        })
    }
}
