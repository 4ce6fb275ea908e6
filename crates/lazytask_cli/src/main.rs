//! `lazytask` command line entry point.
//!
//! # Responsibility
//! - Parse free-text tasks and print the validated draft as JSON.
//! - Drive the SQLite task store (`add`, `list`, `update`, `refresh`).
//!
//! # Invariants
//! - Every command prints exactly one JSON document on success.
//! - Logging is only enabled when `--log-dir` is given.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use lazytask_core::db::open_db;
use lazytask_core::model::task::{parse_category, parse_priority, parse_task_status};
use lazytask_core::{
    CharNgramModel, LexiconTokenizer, ModelHandle, ParserConfig, SemanticAnalyzer,
    SimilarityEnsemble, SqliteTaskStore, TaskFilter, TaskParser, TaskService,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(false)` when the command ran but reported failure.
fn run(cli: Cli) -> CliResult<bool> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or_else(|| lazytask_core::default_log_level());
        lazytask_core::init_logging(level, log_dir)?;
    }

    let config = Arc::new(match &cli.config {
        Some(path) => ParserConfig::from_json_file(path)?,
        None => ParserConfig::default(),
    });
    info!(
        "event=cli_start module=cli status=ok version={}",
        lazytask_core::core_version()
    );

    match cli.command {
        Commands::Parse {
            text,
            date,
            semantic,
        } => {
            let parser = build_parser(&config, semantic);
            let reference = date.unwrap_or_else(cli::today);
            match parser.parse(&text, reference) {
                Some(draft) => {
                    print_json(&draft)?;
                    Ok(true)
                }
                None => {
                    print_json(&serde_json::json!({ "task": null }))?;
                    Ok(false)
                }
            }
        }
        Commands::Add {
            text,
            date,
            semantic,
        } => {
            let conn = open_db(&cli.db)?;
            let service = TaskService::new(
                SqliteTaskStore::new(&conn),
                build_parser(&config, semantic),
                Arc::clone(&config),
            );
            let response = service.add_from_text(&text, date.unwrap_or_else(cli::today));
            print_json(&response)?;
            Ok(response.success)
        }
        Commands::List {
            status,
            category,
            priority,
            overdue,
        } => {
            let filter = TaskFilter {
                status: status.as_deref().map(parse_task_status).transpose()?,
                category: category.as_deref().map(parse_category).transpose()?,
                priority: priority.as_deref().map(parse_priority).transpose()?,
                overdue_as_of: overdue.then(cli::today),
            };
            let conn = open_db(&cli.db)?;
            let service = TaskService::new(
                SqliteTaskStore::new(&conn),
                TaskParser::new(Arc::clone(&config)),
                Arc::clone(&config),
            );
            let response = service.list(&filter);
            print_json(&response)?;
            Ok(response.success)
        }
        Commands::Update { title, status } => {
            let status = parse_task_status(&status)?;
            let conn = open_db(&cli.db)?;
            let service = TaskService::new(
                SqliteTaskStore::new(&conn),
                TaskParser::new(Arc::clone(&config)),
                Arc::clone(&config),
            );
            let response = service.update_status(&title, status);
            print_json(&response)?;
            Ok(response.success)
        }
        Commands::Refresh { date } => {
            let conn = open_db(&cli.db)?;
            let service = TaskService::new(
                SqliteTaskStore::new(&conn),
                TaskParser::new(Arc::clone(&config)),
                Arc::clone(&config),
            );
            let response = service.refresh(date.unwrap_or_else(cli::today));
            print_json(&response)?;
            Ok(response.success)
        }
    }
}

fn build_parser(config: &Arc<ParserConfig>, semantic: bool) -> TaskParser {
    let parser = TaskParser::new(Arc::clone(config));
    if !semantic {
        return parser;
    }

    let subword = Arc::new(ModelHandle::ready(Arc::new(CharNgramModel::default())));
    let ensemble = Arc::new(SimilarityEnsemble::from_config(vec![subword], config));
    parser.with_semantic(SemanticAnalyzer::new(
        Arc::clone(config),
        ensemble,
        Arc::new(LexiconTokenizer::new()),
    ))
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
