//! Deterministic extractors used by the rule-based path.

pub mod category;
pub mod date;
pub mod preprocess;
pub mod priority;
pub mod text;
pub mod title;
