//! Optional model-based analysis path.

pub mod analyzer;
pub mod ensemble;
pub mod model;
pub mod tokenizer;
