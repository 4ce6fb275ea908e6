//! Weighted similarity ensemble over independently failing models.
//!
//! # Responsibility
//! - Combine per-model similarity scores into one `[0, 1]` score.
//! - Exclude any model that fails to load, errors, panics, times out, or
//!   reports a non-finite score, and renormalize weights over the rest.
//!
//! # Invariants
//! - `similarity` always returns a finite value within `[0, 1]`.
//! - With no answering model the result is `EnsembleScore::Neutral` (0.5).
//! - Failures are logged and never surfaced to callers, panics included.
//! - A member that times out once is suspended for the ensemble's lifetime
//!   and is never called again.
//!
//! # See also
//! - `semantic::model` for the model contract and load-once handles.

use crate::config::ParserConfig;
use crate::model::task::clamp_confidence;
use crate::semantic::model::{ModelError, ModelHandle, ModelKind, ModelResult};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Score returned when no model could answer.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Aggregated similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnsembleScore {
    /// Weighted mean over `contributing` answering models.
    Weighted { score: f64, contributing: usize },
    /// Every model failed or none is configured.
    Neutral,
}

impl EnsembleScore {
    pub fn value(self) -> f64 {
        match self {
            Self::Weighted { score, .. } => score,
            Self::Neutral => NEUTRAL_SCORE,
        }
    }

    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Neutral)
    }
}

struct Member {
    handle: Arc<ModelHandle>,
    weight: f64,
    suspended: AtomicBool,
}

/// Weighted ensemble of embedding models.
pub struct SimilarityEnsemble {
    members: Vec<Member>,
    timeout: Option<Duration>,
}

impl SimilarityEnsemble {
    /// Builds an ensemble from handles and per-kind weights.
    ///
    /// Handles whose kind has no positive weight are left out.
    pub fn new(
        handles: Vec<Arc<ModelHandle>>,
        weights: &BTreeMap<ModelKind, f64>,
        timeout: Option<Duration>,
    ) -> Self {
        let members = handles
            .into_iter()
            .filter_map(|handle| {
                let weight = weights.get(&handle.kind()).copied().unwrap_or(0.0);
                if weight.is_finite() && weight > 0.0 {
                    Some(Member {
                        handle,
                        weight,
                        suspended: AtomicBool::new(false),
                    })
                } else {
                    debug!(
                        "event=ensemble_build module=semantic status=skip model={} reason=no_weight",
                        handle.kind().as_str()
                    );
                    None
                }
            })
            .collect();
        Self { members, timeout }
    }

    /// Builds an ensemble using the configured weights and timeout.
    pub fn from_config(handles: Vec<Arc<ModelHandle>>, config: &ParserConfig) -> Self {
        Self::new(
            handles,
            &config.model_weights,
            config.model_timeout_ms.map(Duration::from_millis),
        )
    }

    /// Ensemble with no members; every score is neutral.
    pub fn empty() -> Self {
        Self {
            members: Vec::new(),
            timeout: None,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Combined similarity within `[0, 1]`.
    pub fn similarity(&self, text_a: &str, text_b: &str) -> f64 {
        self.score(text_a, text_b).value()
    }

    /// Combined similarity with degradation reported explicitly.
    pub fn score(&self, text_a: &str, text_b: &str) -> EnsembleScore {
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        let mut contributing = 0;

        for member in &self.members {
            match self.score_member(member, text_a, text_b) {
                Ok(score) => {
                    weighted_sum += score * member.weight;
                    weight_sum += member.weight;
                    contributing += 1;
                }
                Err(ModelError::Suspended { kind }) => debug!(
                    "event=model_score module=semantic status=skip model={} reason=suspended",
                    kind.as_str()
                ),
                Err(err) => warn!(
                    "event=model_score module=semantic status=error model={} error={}",
                    member.handle.kind().as_str(),
                    err
                ),
            }
        }

        if contributing == 0 || weight_sum <= 0.0 {
            return EnsembleScore::Neutral;
        }
        EnsembleScore::Weighted {
            score: clamp_confidence(weighted_sum / weight_sum),
            contributing,
        }
    }

    fn score_member(&self, member: &Member, text_a: &str, text_b: &str) -> ModelResult<f64> {
        let kind = member.handle.kind();
        if member.suspended.load(Ordering::Acquire) {
            return Err(ModelError::Suspended { kind });
        }
        let raw = match self.timeout {
            Some(timeout) => {
                let result =
                    call_with_timeout(Arc::clone(&member.handle), text_a, text_b, timeout);
                if matches!(result, Err(ModelError::Timeout { .. }))
                    && !member.suspended.swap(true, Ordering::AcqRel)
                {
                    warn!(
                        "event=model_suspend module=semantic status=ok model={}",
                        kind.as_str()
                    );
                }
                result?
            }
            None => call_inline(&member.handle, text_a, text_b)?,
        };
        if !raw.is_finite() {
            return Err(ModelError::NonFiniteScore { kind });
        }
        Ok(raw.clamp(0.0, 1.0))
    }
}

/// Runs one model call on the caller's thread, containing a panic.
fn call_inline(handle: &ModelHandle, text_a: &str, text_b: &str) -> ModelResult<f64> {
    let kind = handle.kind();
    catch_unwind(AssertUnwindSafe(|| {
        handle
            .get()
            .and_then(|model| model.similarity(text_a, text_b))
    }))
    .unwrap_or_else(|_| {
        Err(ModelError::Inference {
            kind,
            message: "model call panicked".to_string(),
        })
    })
}

/// Runs one model call on a helper thread and waits up to `timeout`.
///
/// A timed-out call keeps running detached; its result is dropped.
fn call_with_timeout(
    handle: Arc<ModelHandle>,
    text_a: &str,
    text_b: &str,
    timeout: Duration,
) -> ModelResult<f64> {
    let kind = handle.kind();
    let (sender, receiver) = mpsc::channel();
    let text_a = text_a.to_string();
    let text_b = text_b.to_string();

    let spawned = thread::Builder::new()
        .name(format!("lazytask-model-{}", kind.as_str()))
        .spawn(move || {
            let result = handle
                .get()
                .and_then(|model| model.similarity(&text_a, &text_b));
            let _ = sender.send(result);
        });
    if let Err(err) = spawned {
        return Err(ModelError::Inference {
            kind,
            message: format!("failed to spawn model thread: {err}"),
        });
    }

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ModelError::Timeout {
            kind,
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ModelError::Inference {
            kind,
            message: "model call panicked".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{EnsembleScore, SimilarityEnsemble};
    use crate::semantic::model::{EmbeddingModel, ModelHandle, ModelKind, ModelResult};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    struct Fixed(ModelKind, f64);

    impl EmbeddingModel for Fixed {
        fn kind(&self) -> ModelKind {
            self.0
        }

        fn embed(&self, _text: &str) -> ModelResult<Vec<f32>> {
            Ok(Vec::new())
        }

        fn similarity(&self, _a: &str, _b: &str) -> ModelResult<f64> {
            Ok(self.1)
        }
    }

    fn handle(kind: ModelKind, score: f64) -> Arc<ModelHandle> {
        Arc::new(ModelHandle::ready(Arc::new(Fixed(kind, score))))
    }

    #[test]
    fn zero_weight_members_are_excluded() {
        let weights = BTreeMap::from([
            (ModelKind::WordVector, 1.0),
            (ModelKind::SubwordVector, 0.0),
        ]);
        let ensemble = SimilarityEnsemble::new(
            vec![
                handle(ModelKind::WordVector, 0.2),
                handle(ModelKind::SubwordVector, 0.9),
            ],
            &weights,
            None,
        );
        assert_eq!(ensemble.member_count(), 1);
        assert_eq!(
            ensemble.score("a", "b"),
            EnsembleScore::Weighted {
                score: 0.2,
                contributing: 1
            }
        );
    }

    #[test]
    fn out_of_range_scores_are_clamped() {
        let weights = BTreeMap::from([(ModelKind::WordVector, 1.0)]);
        let ensemble =
            SimilarityEnsemble::new(vec![handle(ModelKind::WordVector, 1.7)], &weights, None);
        assert_eq!(ensemble.similarity("a", "b"), 1.0);
    }

    #[test]
    fn empty_ensemble_is_neutral() {
        let ensemble = SimilarityEnsemble::empty();
        assert_eq!(ensemble.score("a", "b"), EnsembleScore::Neutral);
        assert_eq!(ensemble.similarity("a", "b"), 0.5);
    }
}
