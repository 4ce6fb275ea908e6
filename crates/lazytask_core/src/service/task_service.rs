//! Task use-case service.
//!
//! # Responsibility
//! - Turn free text into stored tasks through the parser.
//! - Wrap store results into `StoreResponse` envelopes for command surfaces.
//!
//! # Invariants
//! - Store errors never escape as `Err`; they become failed envelopes.
//! - Service layer stays storage-agnostic.

use crate::config::ParserConfig;
use crate::model::task::{TaskDraft, TaskStatus};
use crate::parser::TaskParser;
use crate::repo::task_repo::{StoreResponse, StoredTask, TaskFilter, TaskStore};
use chrono::NaiveDate;
use log::warn;
use std::sync::Arc;

/// Saved task with the warnings produced while parsing it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AddedTask {
    pub task: StoredTask,
    pub warnings: Vec<String>,
}

pub struct TaskService<S: TaskStore> {
    store: S,
    parser: TaskParser,
    config: Arc<ParserConfig>,
}

impl<S: TaskStore> TaskService<S> {
    pub fn new(store: S, parser: TaskParser, config: Arc<ParserConfig>) -> Self {
        Self {
            store,
            parser,
            config,
        }
    }

    /// Parses `text` and stores the resulting draft.
    pub fn add_from_text(&self, text: &str, reference: NaiveDate) -> StoreResponse<AddedTask> {
        let Some(draft) = self.parser.parse(text, reference) else {
            return StoreResponse::failed("no task information found");
        };
        self.add_draft(&draft)
    }

    /// Stores an already validated draft.
    pub fn add_draft(&self, draft: &TaskDraft) -> StoreResponse<AddedTask> {
        match self.store.save(draft) {
            Ok(task) => StoreResponse::ok(
                format!("added task: {}", task.title),
                AddedTask {
                    task,
                    warnings: draft.warnings.clone(),
                },
            ),
            Err(err) => failed("task_save", err),
        }
    }

    pub fn list(&self, filter: &TaskFilter) -> StoreResponse<Vec<StoredTask>> {
        match self.store.query(filter) {
            Ok(tasks) if tasks.is_empty() => StoreResponse::ok("no tasks", tasks),
            Ok(tasks) => StoreResponse::ok(format!("{} tasks", tasks.len()), tasks),
            Err(err) => failed("task_query", err),
        }
    }

    pub fn update_status(&self, title: &str, status: TaskStatus) -> StoreResponse<StoredTask> {
        match self.store.update_status(title, status) {
            Ok(task) => StoreResponse::ok(
                format!("updated `{}` to {}", task.title, status.as_str()),
                task,
            ),
            Err(err) => failed("task_update_status", err),
        }
    }

    /// Re-applies the urgency table to unfinished tasks.
    pub fn refresh(&self, reference: NaiveDate) -> StoreResponse<usize> {
        match self.store.refresh_priorities(reference, &self.config.urgency) {
            Ok(updated) => StoreResponse::ok(format!("updated {updated} priorities"), updated),
            Err(err) => failed("task_refresh", err),
        }
    }
}

fn failed<T>(event: &str, err: impl std::fmt::Display) -> StoreResponse<T> {
    warn!("event={event} module=service status=error error={err}");
    StoreResponse::failed(format!("error: {err}"))
}
