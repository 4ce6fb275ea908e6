use chrono::NaiveDate;
use lazytask_core::semantic::model::ModelResult;
use lazytask_core::semantic::tokenizer::{Token, TokenizeError};
use lazytask_core::{
    CharNgramModel, EmbeddingModel, Field, LexiconTokenizer, ModelHandle, ModelKind,
    ParserConfig, SemanticAnalyzer, SemanticError, SemanticOutcome, SemanticResult,
    SimilarityEnsemble, Tokenizer,
};
use std::collections::BTreeMap;
use std::sync::Arc;

struct Constant(f64);

impl EmbeddingModel for Constant {
    fn kind(&self) -> ModelKind {
        ModelKind::SentenceVector
    }

    fn embed(&self, _text: &str) -> ModelResult<Vec<f32>> {
        Ok(Vec::new())
    }

    fn similarity(&self, _text_a: &str, _text_b: &str) -> ModelResult<f64> {
        Ok(self.0)
    }
}

struct PanickingModel;

impl EmbeddingModel for PanickingModel {
    fn kind(&self) -> ModelKind {
        ModelKind::WordVector
    }

    fn embed(&self, _text: &str) -> ModelResult<Vec<f32>> {
        panic!("vector table unmapped")
    }

    fn similarity(&self, _text_a: &str, _text_b: &str) -> ModelResult<f64> {
        panic!("vector table unmapped")
    }
}

struct BrokenTokenizer;

impl Tokenizer for BrokenTokenizer {
    fn tokenize_with_pos(&self, _text: &str) -> Result<Vec<Token>, TokenizeError> {
        Err(TokenizeError::Unavailable("dictionary missing".to_string()))
    }
}

struct PanickingTokenizer;

impl Tokenizer for PanickingTokenizer {
    fn tokenize_with_pos(&self, _text: &str) -> Result<Vec<Token>, TokenizeError> {
        panic!("tagger state corrupted")
    }
}

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 17).unwrap()
}

fn analyzer_with(ensemble: SimilarityEnsemble, tokenizer: Arc<dyn Tokenizer>) -> SemanticAnalyzer {
    SemanticAnalyzer::new(Arc::new(ParserConfig::default()), Arc::new(ensemble), tokenizer)
}

fn constant_ensemble(score: f64) -> SimilarityEnsemble {
    let weights = BTreeMap::from([(ModelKind::SentenceVector, 1.0)]);
    SimilarityEnsemble::new(
        vec![Arc::new(ModelHandle::ready(Arc::new(Constant(score))))],
        &weights,
        None,
    )
}

fn analyzed(outcome: SemanticOutcome) -> SemanticResult {
    match outcome {
        SemanticOutcome::Analyzed(result) => result,
        SemanticOutcome::Fallback { reason, .. } => panic!("unexpected fallback: {reason}"),
    }
}

#[test]
fn tokenizer_failure_returns_fixed_fallback() {
    let analyzer = analyzer_with(constant_ensemble(0.8), Arc::new(BrokenTokenizer));
    let outcome = analyzer.analyze("write the regression summary", reference());

    assert!(outcome.is_fallback());
    assert!(outcome.analyzed().is_none());
    match outcome {
        SemanticOutcome::Fallback { result, reason } => {
            assert_eq!(
                reason,
                SemanticError::Tokenize(TokenizeError::Unavailable(
                    "dictionary missing".to_string()
                ))
            );
            assert_eq!(result.title.as_deref(), Some(""));
            assert!(result.categories.is_empty());
            assert_eq!(result.priority.as_deref(), Some("medium"));
            assert_eq!(result.due_date, None);
            assert_eq!(result.confidence, 0.0);
            assert!(result.error);
        }
        SemanticOutcome::Analyzed(_) => unreachable!(),
    }
}

#[test]
fn tokenizer_panic_is_contained() {
    let analyzer = analyzer_with(constant_ensemble(0.8), Arc::new(PanickingTokenizer));
    match analyzer.analyze("write the regression summary", reference()) {
        SemanticOutcome::Fallback { result, reason } => {
            assert_eq!(reason, SemanticError::Panicked);
            assert_eq!(result, SemanticResult::fallback());
        }
        SemanticOutcome::Analyzed(_) => panic!("panic should degrade to fallback"),
    }
}

#[test]
fn blank_input_falls_back() {
    let analyzer = analyzer_with(constant_ensemble(0.8), Arc::new(LexiconTokenizer::new()));
    match analyzer.analyze(" \u{3000} ", reference()) {
        SemanticOutcome::Fallback { reason, .. } => assert_eq!(reason, SemanticError::EmptyInput),
        SemanticOutcome::Analyzed(_) => panic!("blank input has nothing to analyze"),
    }
}

#[test]
fn overall_confidence_is_rounded_mean_of_fields() {
    let analyzer = analyzer_with(constant_ensemble(0.7777), Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze("tidy the desk drawer", reference()));

    let details = result.details.as_ref().unwrap();
    assert_eq!(details.len(), 4);
    let mean = [Field::Title, Field::Category, Field::Priority, Field::DueDate]
        .iter()
        .map(|field| details[field].confidence)
        .sum::<f64>()
        / 4.0;
    assert_eq!(result.confidence, (mean * 1000.0).round() / 1000.0);
    assert_eq!(result.confidence, 0.778);
    assert!(!result.error);
}

#[test]
fn uniform_scores_resolve_ties_toward_urgency_and_first_hint() {
    let analyzer = analyzer_with(constant_ensemble(0.7777), Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze("tidy the desk drawer", reference()));

    assert_eq!(result.title.as_deref(), Some("tidy desk drawer"));
    assert_eq!(result.priority.as_deref(), Some("high"));
    assert_eq!(result.due_date.as_deref(), Some("2024-11-18"));
    assert_eq!(result.categories, vec!["math", "statistics"]);
}

#[test]
fn panicking_model_is_left_out_instead_of_falling_back() {
    let weights = BTreeMap::from([
        (ModelKind::WordVector, 0.5),
        (ModelKind::SentenceVector, 0.5),
    ]);
    let ensemble = SimilarityEnsemble::new(
        vec![
            Arc::new(ModelHandle::ready(Arc::new(PanickingModel))),
            Arc::new(ModelHandle::ready(Arc::new(Constant(0.7777)))),
        ],
        &weights,
        None,
    );
    let analyzer = analyzer_with(ensemble, Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze("tidy the desk drawer", reference()));

    assert_eq!(result.priority.as_deref(), Some("high"));
    assert_eq!(result.categories, vec!["math", "statistics"]);
    assert_eq!(result.confidence, 0.778);
}

#[test]
fn explicit_keyword_overrides_similarity_for_categories() {
    let analyzer = analyzer_with(constant_ensemble(0.7777), Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze("debug the parser code", reference()));
    assert_eq!(result.categories, vec!["programming"]);
    assert_eq!(result.details.unwrap()[&Field::Category].confidence, 1.0);
}

#[test]
fn low_similarity_yields_no_deadline() {
    let analyzer = analyzer_with(constant_ensemble(0.2), Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze("tidy the desk drawer", reference()));
    assert_eq!(result.due_date, None);
    assert_eq!(result.details.unwrap()[&Field::DueDate].confidence, 0.0);
}

#[test]
fn all_filler_title_falls_back_to_input_prefix() {
    let analyzer = analyzer_with(constant_ensemble(0.7777), Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze("do it tomorrow", reference()));
    let details = result.details.unwrap();
    assert_eq!(details[&Field::Title].value, "do it");
    assert_eq!(details[&Field::Title].confidence, 0.3);
}

#[test]
fn degraded_ensemble_decides_no_priority_or_deadline() {
    let analyzer = analyzer_with(SimilarityEnsemble::empty(), Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze("tidy the desk drawer", reference()));
    assert_eq!(result.priority, None);
    assert_eq!(result.due_date, None);
    assert!(result.categories.is_empty());
    assert!(result.title.is_some_and(|title| !title.is_empty()));
}

#[test]
fn ngram_model_produces_bounded_result() {
    let weights = BTreeMap::from([(ModelKind::SubwordVector, 1.0)]);
    let ensemble = SimilarityEnsemble::new(
        vec![Arc::new(ModelHandle::ready(Arc::new(CharNgramModel::default())))],
        &weights,
        None,
    );
    let analyzer = analyzer_with(ensemble, Arc::new(LexiconTokenizer::new()));
    let result = analyzed(analyzer.analyze(
        "tomorrow, submit the statistics report",
        reference(),
    ));

    assert!((0.0..=1.0).contains(&result.confidence));
    assert!(result.categories.contains(&"statistics".to_string()));
    let title = result.title.unwrap();
    assert!(!title.is_empty());
    assert!(title.chars().count() <= 50);
    assert!(!title.contains("tomorrow"));
}
