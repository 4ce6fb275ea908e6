//! Task store contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist validated drafts as tasks with a lifecycle status.
//! - Query tasks by status, category, priority and overdue state.
//! - Raise stored priorities when deadlines move closer.
//!
//! # Invariants
//! - Only drafts with a non-empty title are written.
//! - Query order is due date ascending (undated last), then most urgent.
//! - Read paths reject invalid persisted values instead of masking them.
//!
//! # See also
//! - `db::migrations` for the `tasks` and `task_categories` schema.

use crate::db::DbError;
use crate::model::task::{
    parse_category, parse_priority, parse_task_status, Category, Priority, TaskDraft, TaskStatus,
    DATE_FORMAT,
};
use crate::model::urgency::UrgencyTable;
use chrono::NaiveDate;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TaskId = Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    due_date,
    priority,
    status
FROM tasks";

const PRIORITY_RANK_SQL: &str =
    "CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END";

pub type StoreResult<T> = Result<T, StoreError>;

/// Task persistence error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// No task has the requested title.
    NotFound(String),
    /// Draft cannot be stored.
    Validation(String),
    /// Persisted row holds a value outside the vocabulary.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(title) => write!(f, "task `{title}` not found"),
            Self::Validation(message) => write!(f, "invalid task: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Validation(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTask {
    pub id: TaskId,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub categories: Vec<Category>,
    pub status: TaskStatus,
}

/// Query filter; `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    /// Only unfinished tasks due strictly before this date.
    pub overdue_as_of: Option<NaiveDate>,
}

/// Result envelope returned to command surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreResponse<T> {
    pub success: bool,
    pub message: String,
    pub payload: Option<T>,
}

impl<T> StoreResponse<T> {
    pub fn ok(message: impl Into<String>, payload: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            payload: Some(payload),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            payload: None,
        }
    }
}

/// Task persistence interface.
pub trait TaskStore {
    fn save(&self, draft: &TaskDraft) -> StoreResult<StoredTask>;
    fn query(&self, filter: &TaskFilter) -> StoreResult<Vec<StoredTask>>;
    /// Updates the first task whose title matches exactly.
    fn update_status(&self, title: &str, status: TaskStatus) -> StoreResult<StoredTask>;
    /// Upgrades unfinished tasks whose deadline implies a more urgent
    /// priority. Returns the number of updated tasks.
    fn refresh_priorities(&self, reference: NaiveDate, urgency: &UrgencyTable)
        -> StoreResult<usize>;
}

/// SQLite-backed task store.
pub struct SqliteTaskStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_categories(&self, id: TaskId) -> StoreResult<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT category FROM task_categories
             WHERE task_uuid = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            categories.push(parse_category(&value).map_err(|_| {
                StoreError::InvalidData(format!(
                    "invalid category `{value}` in task_categories.category"
                ))
            })?);
        }
        Ok(categories)
    }

    fn hydrate(&self, row: &Row<'_>) -> StoreResult<StoredTask> {
        let mut task = parse_task_row(row)?;
        task.categories = self.load_categories(task.id)?;
        Ok(task)
    }
}

impl TaskStore for SqliteTaskStore<'_> {
    fn save(&self, draft: &TaskDraft) -> StoreResult<StoredTask> {
        let title = draft.title.trim();
        if title.is_empty() {
            return Err(StoreError::Validation("title must not be empty".to_string()));
        }

        let id = Uuid::new_v4();
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO tasks (uuid, title, due_date, priority, status)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                id.to_string(),
                title,
                draft.due_date_string(),
                draft.priority.as_str(),
                TaskStatus::Todo.as_str(),
            ],
        )?;
        for (position, category) in draft.categories.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO task_categories (task_uuid, category, position)
                 VALUES (?1, ?2, ?3);",
                params![id.to_string(), category.as_str(), position as i64],
            )?;
        }
        tx.commit()?;

        info!(
            "event=task_save module=repo status=ok categories={} has_deadline={}",
            draft.categories.len(),
            draft.due_date.is_some()
        );
        Ok(StoredTask {
            id,
            title: title.to_string(),
            due_date: draft.due_date,
            priority: draft.priority,
            categories: draft.categories.clone(),
            status: TaskStatus::Todo,
        })
    }

    fn query(&self, filter: &TaskFilter) -> StoreResult<Vec<StoredTask>> {
        let mut sql = format!("{TASK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }
        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }
        if let Some(category) = filter.category {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1 FROM task_categories c
                    WHERE c.task_uuid = tasks.uuid AND c.category = ?
                )",
            );
            bind_values.push(Value::Text(category.as_str().to_string()));
        }
        if let Some(reference) = filter.overdue_as_of {
            sql.push_str(" AND due_date IS NOT NULL AND due_date < ? AND status <> 'done'");
            bind_values.push(Value::Text(reference.format(DATE_FORMAT).to_string()));
        }

        sql.push_str(&format!(
            " ORDER BY due_date IS NULL, due_date ASC, {PRIORITY_RANK_SQL}, created_at ASC, rowid ASC"
        ));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(self.hydrate(row)?);
        }
        Ok(tasks)
    }

    fn update_status(&self, title: &str, status: TaskStatus) -> StoreResult<StoredTask> {
        let title = title.trim();
        let found = self
            .conn
            .query_row(
                &format!(
                    "{TASK_SELECT_SQL} WHERE title = ?1 ORDER BY created_at ASC, rowid ASC LIMIT 1;"
                ),
                [title],
                |row| row.get::<_, String>("uuid"),
            )
            .optional()?;
        let Some(uuid) = found else {
            return Err(StoreError::NotFound(title.to_string()));
        };

        self.conn.execute(
            "UPDATE tasks
             SET status = ?1, updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![status.as_str(), uuid],
        )?;

        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([uuid.as_str()])?;
        let Some(row) = rows.next()? else {
            return Err(StoreError::NotFound(title.to_string()));
        };
        let task = self.hydrate(row)?;
        info!(
            "event=task_update_status module=repo status=ok new_status={}",
            status.as_str()
        );
        Ok(task)
    }

    fn refresh_priorities(
        &self,
        reference: NaiveDate,
        urgency: &UrgencyTable,
    ) -> StoreResult<usize> {
        let open_tasks: Vec<StoredTask> = self
            .query(&TaskFilter::default())?
            .into_iter()
            .filter(|task| task.status != TaskStatus::Done)
            .collect();

        let tx = self.conn.unchecked_transaction()?;
        let mut updated = 0;
        for task in open_tasks {
            let Some(due_date) = task.due_date else {
                continue;
            };
            let days = due_date.signed_duration_since(reference).num_days();
            let Some(level) = urgency.lookup(days) else {
                continue;
            };
            if !level.priority.is_more_urgent_than(task.priority) {
                continue;
            }
            tx.execute(
                "UPDATE tasks
                 SET priority = ?1, updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?2;",
                params![level.priority.as_str(), task.id.to_string()],
            )?;
            updated += 1;
        }
        tx.commit()?;

        info!("event=task_refresh module=repo status=ok updated={updated}");
        Ok(updated)
    }
}

fn parse_task_row(row: &Row<'_>) -> StoreResult<StoredTask> {
    let uuid_text: String = row.get("uuid")?;
    let id = Uuid::parse_str(&uuid_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{uuid_text}` in tasks.uuid"))
    })?;

    let due_date = match row.get::<_, Option<String>>("due_date")? {
        Some(value) => Some(NaiveDate::parse_from_str(&value, DATE_FORMAT).map_err(|_| {
            StoreError::InvalidData(format!("invalid due date `{value}` in tasks.due_date"))
        })?),
        None => None,
    };

    let priority_text: String = row.get("priority")?;
    let priority = parse_priority(&priority_text).map_err(|err| {
        StoreError::InvalidData(format!("{err} in tasks.priority"))
    })?;

    let status_text: String = row.get("status")?;
    let status = parse_task_status(&status_text).map_err(|err| {
        StoreError::InvalidData(format!("{err} in tasks.status"))
    })?;

    Ok(StoredTask {
        id,
        title: row.get("title")?,
        due_date,
        priority,
        categories: Vec::new(),
        status,
    })
}
