//! Part-of-speech tokenization contract and a built-in lexicon tagger.
//!
//! # Responsibility
//! - Define the `Tokenizer` trait consumed by semantic title generation.
//! - Provide `LexiconTokenizer`, a dependency-free English tagger based on
//!   closed word lists and suffix rules.
//!
//! # Invariants
//! - Tokens are returned in input order.
//! - Empty input yields an empty token list, not an error.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Particle,
    Auxiliary,
    Determiner,
    Pronoun,
    Number,
    Symbol,
    Other,
}

impl PartOfSpeech {
    /// Whether the tag marks a function word that never carries a title.
    pub fn is_function_word(self) -> bool {
        matches!(
            self,
            Self::Particle | Self::Auxiliary | Self::Determiner | Self::Pronoun | Self::Symbol
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub pos: PartOfSpeech,
}

impl Token {
    pub fn new(surface: impl Into<String>, pos: PartOfSpeech) -> Self {
        Self {
            surface: surface.into(),
            pos,
        }
    }
}

/// Tokenizer failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizeError {
    /// Backend could not be initialized.
    Unavailable(String),
    /// Backend rejected this input.
    Rejected(String),
}

impl Display for TokenizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "tokenizer unavailable: {message}"),
            Self::Rejected(message) => write!(f, "tokenizer rejected input: {message}"),
        }
    }
}

impl Error for TokenizeError {}

/// POS tokenizer used by semantic title generation.
pub trait Tokenizer: Send + Sync {
    fn tokenize_with_pos(&self, text: &str) -> Result<Vec<Token>, TokenizeError>;
}

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['.\-][\p{L}\p{N}]+)*|[^\s\p{L}\p{N}]")
        .expect("valid token regex")
});

const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "my", "your", "our", "their", "his",
    "her", "its", "some", "any", "every", "each", "all",
];
const PRONOUNS: &[&str] = &[
    "i", "me", "we", "us", "you", "he", "him", "she", "they", "them", "it", "myself",
];
const PARTICLES: &[&str] = &[
    "to", "for", "of", "on", "at", "in", "by", "with", "about", "from", "into", "and", "or",
    "but", "until", "before", "after", "up", "out",
];
const AUXILIARIES: &[&str] = &[
    "be", "is", "am", "are", "was", "were", "been", "have", "has", "had", "do", "does", "did",
    "will", "would", "shall", "should", "can", "could", "may", "might", "must", "need", "needs",
];
const ADVERBS: &[&str] = &[
    "soon", "now", "asap", "again", "later", "still", "very", "really", "just", "also",
    "today", "tomorrow", "tonight",
];
const VERBS: &[&str] = &[
    "submit", "create", "conduct", "start", "complete", "finish", "prepare", "make", "write",
    "read", "review", "study", "fix", "build", "send", "check", "call", "buy", "run", "train",
    "implement", "debug", "solve", "upload", "plan", "please", "go", "get",
];
const ADJECTIVES: &[&str] = &[
    "new", "final", "short", "long", "big", "small", "first", "last", "next", "weekly",
    "monthly", "linear", "urgent", "important", "critical",
];

/// Lexicon and suffix based English tagger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconTokenizer;

impl LexiconTokenizer {
    pub fn new() -> Self {
        Self
    }

    fn tag(word: &str) -> PartOfSpeech {
        let lower = word.to_lowercase();
        let lower = lower.as_str();

        if !lower.chars().any(char::is_alphanumeric) {
            return PartOfSpeech::Symbol;
        }
        if lower.chars().all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '-')) {
            return PartOfSpeech::Number;
        }
        if DETERMINERS.contains(&lower) {
            return PartOfSpeech::Determiner;
        }
        if PRONOUNS.contains(&lower) {
            return PartOfSpeech::Pronoun;
        }
        if PARTICLES.contains(&lower) {
            return PartOfSpeech::Particle;
        }
        if AUXILIARIES.contains(&lower) {
            return PartOfSpeech::Auxiliary;
        }
        if ADVERBS.contains(&lower) {
            return PartOfSpeech::Adverb;
        }
        if VERBS.contains(&lower) {
            return PartOfSpeech::Verb;
        }
        if ADJECTIVES.contains(&lower) {
            return PartOfSpeech::Adjective;
        }

        if lower.len() > 4 && lower.ends_with("ly") {
            PartOfSpeech::Adverb
        } else if ["ive", "ous", "ful", "able", "ible", "ical", "al", "less"]
            .iter()
            .any(|suffix| lower.len() > suffix.len() + 2 && lower.ends_with(suffix))
        {
            PartOfSpeech::Adjective
        } else if ["ize", "ise", "ify"]
            .iter()
            .any(|suffix| lower.len() > suffix.len() + 2 && lower.ends_with(suffix))
        {
            PartOfSpeech::Verb
        } else {
            PartOfSpeech::Noun
        }
    }
}

impl Tokenizer for LexiconTokenizer {
    fn tokenize_with_pos(&self, text: &str) -> Result<Vec<Token>, TokenizeError> {
        Ok(WORD_RE
            .find_iter(text)
            .map(|found| Token::new(found.as_str(), Self::tag(found.as_str())))
            .collect())
    }
}
