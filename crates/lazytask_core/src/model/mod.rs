//! Domain model for task extraction.
//!
//! # Responsibility
//! - Define value objects created fresh per parse request.
//! - Define the urgency table shared by extractors and the validator.
//!
//! # Invariants
//! - No model value persists across requests.
//! - Priority and category vocabularies are closed sets.

pub mod task;
pub mod urgency;
