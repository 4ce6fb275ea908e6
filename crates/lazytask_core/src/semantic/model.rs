//! Embedding model contracts and load-once handles.
//!
//! # Responsibility
//! - Define the polymorphic `EmbeddingModel` interface consumed by the
//!   similarity ensemble.
//! - Guard expensive model loading behind a one-time initializer.
//!
//! # Invariants
//! - A `ModelHandle` runs its loader at most once, even under concurrent
//!   first use. A failed load stays failed for the handle lifetime.
//! - Model similarity scores reported through this module are finite.

use log::{error, info};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

pub type ModelResult<T> = Result<T, ModelError>;

/// Embedding backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Whole-word vectors (word2vec-style).
    WordVector,
    /// Character/subword vectors (fastText-style).
    SubwordVector,
    /// Sentence encoders (LASER-style).
    SentenceVector,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [
        ModelKind::WordVector,
        ModelKind::SubwordVector,
        ModelKind::SentenceVector,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WordVector => "word_vector",
            Self::SubwordVector => "subword_vector",
            Self::SentenceVector => "sentence_vector",
        }
    }
}

/// Model load/inference failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Loader failed; the handle stays unavailable.
    Load { kind: ModelKind, message: String },
    /// A single embed/similarity call failed.
    Inference { kind: ModelKind, message: String },
    /// Call exceeded the ensemble timeout.
    Timeout { kind: ModelKind, timeout_ms: u64 },
    /// Score was NaN or infinite.
    NonFiniteScore { kind: ModelKind },
    /// Skipped because an earlier call timed out.
    Suspended { kind: ModelKind },
}

impl Display for ModelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load { kind, message } => {
                write!(f, "{} model failed to load: {message}", kind.as_str())
            }
            Self::Inference { kind, message } => {
                write!(f, "{} model inference failed: {message}", kind.as_str())
            }
            Self::Timeout { kind, timeout_ms } => {
                write!(f, "{} model timed out after {timeout_ms}ms", kind.as_str())
            }
            Self::NonFiniteScore { kind } => {
                write!(f, "{} model returned a non-finite score", kind.as_str())
            }
            Self::Suspended { kind } => {
                write!(f, "{} model suspended after a timeout", kind.as_str())
            }
        }
    }
}

impl Error for ModelError {}

/// Loaded embedding model.
///
/// Implementations are read-only after load and shared across threads.
pub trait EmbeddingModel: Send + Sync {
    fn kind(&self) -> ModelKind;

    fn embed(&self, text: &str) -> ModelResult<Vec<f32>>;

    /// Similarity in `[0, 1]`. Defaults to clamped cosine over `embed`.
    fn similarity(&self, text_a: &str, text_b: &str) -> ModelResult<f64> {
        let left = self.embed(text_a)?;
        let right = self.embed(text_b)?;
        Ok(cosine_similarity(&left, &right).clamp(0.0, 1.0))
    }
}

/// Cosine similarity; zero-norm or mismatched vectors yield `0`.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    if left.len() != right.len() || left.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut left_norm = 0.0_f64;
    let mut right_norm = 0.0_f64;
    for (a, b) in left.iter().zip(right) {
        let (a, b) = (f64::from(*a), f64::from(*b));
        dot += a * b;
        left_norm += a * a;
        right_norm += b * b;
    }

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm.sqrt() * right_norm.sqrt())
}

type Loader = Box<dyn Fn() -> ModelResult<Arc<dyn EmbeddingModel>> + Send + Sync>;

/// Lazily loaded model resource.
///
/// Injected into the ensemble so tests can substitute doubles and no global
/// model singleton exists.
pub struct ModelHandle {
    kind: ModelKind,
    loader: Loader,
    state: OnceCell<Result<Arc<dyn EmbeddingModel>, ModelError>>,
}

impl ModelHandle {
    /// Creates a handle whose `loader` runs on first use.
    pub fn lazy<F>(kind: ModelKind, loader: F) -> Self
    where
        F: Fn() -> ModelResult<Arc<dyn EmbeddingModel>> + Send + Sync + 'static,
    {
        Self {
            kind,
            loader: Box::new(loader),
            state: OnceCell::new(),
        }
    }

    /// Creates an already-loaded handle.
    pub fn ready(model: Arc<dyn EmbeddingModel>) -> Self {
        let kind = model.kind();
        let state = OnceCell::new();
        let _ = state.set(Ok(Arc::clone(&model)));
        Self {
            kind,
            loader: Box::new(move || Ok(Arc::clone(&model))),
            state,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Whether the loader has already run (successfully or not).
    pub fn is_initialized(&self) -> bool {
        self.state.get().is_some()
    }

    /// Returns the loaded model, running the loader on first call only.
    pub fn get(&self) -> ModelResult<Arc<dyn EmbeddingModel>> {
        self.state
            .get_or_init(|| {
                let started_at = Instant::now();
                let loaded = (self.loader)();
                match &loaded {
                    Ok(_) => info!(
                        "event=model_load module=semantic status=ok model={} duration_ms={}",
                        self.kind.as_str(),
                        started_at.elapsed().as_millis()
                    ),
                    Err(err) => error!(
                        "event=model_load module=semantic status=error model={} duration_ms={} error={}",
                        self.kind.as_str(),
                        started_at.elapsed().as_millis(),
                        err
                    ),
                }
                loaded
            })
            .clone()
    }
}

/// Bag-of-character-n-gram model usable without any model files.
///
/// Embeds text into a fixed number of hashed trigram buckets. Serves as the
/// built-in subword backend.
#[derive(Debug, Clone)]
pub struct CharNgramModel {
    n: usize,
    dimensions: usize,
}

impl CharNgramModel {
    pub const DEFAULT_DIMENSIONS: usize = 512;

    pub fn new(n: usize, dimensions: usize) -> Self {
        Self {
            n: n.max(1),
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for CharNgramModel {
    fn default() -> Self {
        Self::new(3, Self::DEFAULT_DIMENSIONS)
    }
}

impl EmbeddingModel for CharNgramModel {
    fn kind(&self) -> ModelKind {
        ModelKind::SubwordVector
    }

    fn embed(&self, text: &str) -> ModelResult<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dimensions];
        for word in text.split_whitespace() {
            let padded: Vec<char> = format!("<{}>", word.to_lowercase()).chars().collect();
            if padded.len() < self.n {
                continue;
            }
            for gram in padded.windows(self.n) {
                let bucket = fnv1a(gram) % self.dimensions as u64;
                vector[bucket as usize] += 1.0;
            }
        }
        Ok(vector)
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for ch in chars {
        let mut buf = [0_u8; 4];
        for byte in ch.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

/// Default ensemble weights per model kind.
pub fn default_model_weights() -> BTreeMap<ModelKind, f64> {
    BTreeMap::from([
        (ModelKind::WordVector, 0.3),
        (ModelKind::SubwordVector, 0.3),
        (ModelKind::SentenceVector, 0.4),
    ])
}
