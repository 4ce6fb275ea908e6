use chrono::NaiveDate;
use lazytask_core::semantic::tokenizer::{Token, TokenizeError};
use lazytask_core::{
    parse_task_info, Category, CharNgramModel, LexiconTokenizer, ModelHandle, ParserConfig,
    Priority, SemanticAnalyzer, SimilarityEnsemble, TaskParser, Tokenizer,
};
use std::sync::Arc;

const SCENARIO: &str = "tomorrow, submit the statistics report";

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 17).unwrap()
}

fn semantic_parser(tokenizer: Arc<dyn Tokenizer>) -> TaskParser {
    let config = Arc::new(ParserConfig::default());
    let subword = Arc::new(ModelHandle::ready(Arc::new(CharNgramModel::default())));
    let ensemble = Arc::new(SimilarityEnsemble::from_config(vec![subword], &config));
    TaskParser::new(Arc::clone(&config)).with_semantic(SemanticAnalyzer::new(
        config, ensemble, tokenizer,
    ))
}

struct BrokenTokenizer;

impl Tokenizer for BrokenTokenizer {
    fn tokenize_with_pos(&self, _text: &str) -> Result<Vec<Token>, TokenizeError> {
        Err(TokenizeError::Rejected("unsupported script".to_string()))
    }
}

#[test]
fn statistics_report_due_tomorrow() {
    let draft = parse_task_info(SCENARIO, reference()).unwrap();

    assert_eq!(draft.title, "statistics report");
    assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 11, 18));
    assert_eq!(draft.due_date_string().as_deref(), Some("2024-11-18"));
    assert_eq!(draft.priority, Priority::High);
    assert_eq!(
        draft.categories,
        vec![Category::Statistics, Category::Submission]
    );
    assert_eq!(
        draft.warnings,
        vec![
            "deadline approaching (1 day left)",
            "multiple categories detected"
        ]
    );
}

#[test]
fn empty_and_blank_input_is_none() {
    assert!(parse_task_info("", reference()).is_none());
    assert!(parse_task_info("  \t\n", reference()).is_none());
    assert!(parse_task_info("\u{3000}\u{3000}", reference()).is_none());
}

#[test]
fn input_without_any_field_is_none() {
    assert!(parse_task_info("please do the", reference()).is_none());
}

#[test]
fn full_width_input_parses_like_ascii() {
    let full_width =
        "ｔｏｍｏｒｒｏｗ，\u{3000}ｓｕｂｍｉｔ\u{3000}ｔｈｅ\u{3000}ｓｔａｔｉｓｔｉｃｓ\u{3000}ｒｅｐｏｒｔ";
    assert_eq!(
        parse_task_info(full_width, reference()),
        parse_task_info(SCENARIO, reference())
    );
}

#[test]
fn formatted_input_rejects_malformed_date() {
    let draft = parse_task_info(
        "Lab report | due: 2024/03/21 | priority: high | category: math",
        reference(),
    )
    .unwrap();

    assert_eq!(draft.title, "Lab report");
    assert_eq!(draft.due_date, None);
    assert_eq!(draft.priority, Priority::High);
    assert_eq!(draft.categories, vec![Category::Math]);
    assert_eq!(
        draft.warnings,
        vec!["invalid deadline format: 2024/03/21", "no deadline set"]
    );
}

#[test]
fn formatted_input_with_valid_fields() {
    let draft = parse_task_info(
        "Thesis draft | deadline: 2024-12-20 | priority: low | categories: theory, Machine Learning",
        reference(),
    )
    .unwrap();

    assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 12, 20));
    assert_eq!(draft.priority, Priority::Low);
    assert_eq!(
        draft.categories,
        vec![Category::Theory, Category::MachineLearning]
    );
    assert_eq!(draft.warnings, vec!["multiple categories detected"]);
}

#[test]
fn semantic_path_keeps_rule_based_deadline() {
    let parser = semantic_parser(Arc::new(LexiconTokenizer::new()));
    assert!(parser.has_semantic());

    let draft = parser.parse(SCENARIO, reference()).unwrap();
    assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 11, 18));
    assert_eq!(draft.priority, Priority::High);
    assert_eq!(draft.categories[..2], [Category::Statistics, Category::Submission]);
    assert!(!draft.title.is_empty());
    assert_eq!(draft.warnings[0], "deadline approaching (1 day left)");
}

#[test]
fn semantic_fallback_is_not_merged() {
    let parser = semantic_parser(Arc::new(BrokenTokenizer));
    assert_eq!(
        parser.parse(SCENARIO, reference()),
        parse_task_info(SCENARIO, reference())
    );
}

#[test]
fn overdue_explicit_date_raises_priority() {
    let draft = parse_task_info("someday, clean up the lemma 2024-11-01", reference()).unwrap();
    assert_eq!(draft.due_date, NaiveDate::from_ymd_opt(2024, 11, 1));
    assert_eq!(draft.priority, Priority::High);
    assert_eq!(draft.categories, vec![Category::Theory]);
    assert_eq!(draft.warnings, vec!["deadline passed (16 days overdue)"]);
}
