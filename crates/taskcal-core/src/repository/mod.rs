use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::Sqlite;
use uuid::Uuid;

use crate::calendar::DateWindow;
use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    BulkDeleteOutcome, DeleteScope, EditScope, MaterializerConfig, NewTaskData, SeriesKind,
    TaskChanges, TaskRecord, TaskRow,
};
use crate::query::TaskFilters;
use crate::recurrence::{EndCondition, RecurrenceRule};

pub mod deletion;
pub mod materializer;
pub mod reschedule;
pub mod series;
pub mod tasks;

/// Task CRUD plus the windowed occurrence query.
#[async_trait]
pub trait TaskRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<TaskRecord, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<TaskRecord>, CoreError>;
    /// Direct single-task update, the implicit scope for standalone tasks.
    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> Result<TaskRecord, CoreError>;
    /// Occurrences whose start date falls in the window, or every matching
    /// task sorted by start date when no window is given (list view).
    /// Extends materialization over the window before answering.
    async fn query(
        &self,
        window: Option<DateWindow>,
        filters: &TaskFilters,
    ) -> Result<Vec<TaskRecord>, CoreError>;
}

/// Expands a master's recurrence rule into persisted instances over a
/// bounded window. Idempotent: overlapping calls never duplicate a
/// `(master, sequence_index)` pair and never touch existing overrides.
#[async_trait]
pub trait InstanceMaterializer {
    async fn materialize(
        &self,
        master_id: Uuid,
        window: DateWindow,
    ) -> Result<Vec<TaskRecord>, CoreError>;
}

/// Scoped mutations across a master/instance chain.
#[async_trait]
pub trait SeriesEditor {
    async fn apply_edit(
        &self,
        target_id: Uuid,
        changes: TaskChanges,
        scope: EditScope,
    ) -> Result<TaskRecord, CoreError>;
}

/// Cascade deletion across a chain, plus the bulk entry point.
#[async_trait]
pub trait SeriesDeleter {
    async fn delete_chain(&self, target_id: Uuid, scope: DeleteScope) -> Result<usize, CoreError>;
    async fn delete_many(&self, ids: &[Uuid]) -> Result<BulkDeleteOutcome, CoreError>;
}

/// Drag-and-drop date moves.
#[async_trait]
pub trait Rescheduler {
    async fn reschedule(&self, task_id: Uuid, new_date: NaiveDate) -> Result<TaskRecord, CoreError>;
}

/// Composed repository surface.
#[async_trait]
pub trait Repository:
    TaskRepository + InstanceMaterializer + SeriesEditor + SeriesDeleter + Rescheduler
{
}

/// SQLite implementation of the repository pattern.
pub struct SqliteRepository {
    pool: DbPool,
    config: MaterializerConfig,
}

impl SqliteRepository {
    pub fn new(pool: DbPool, config: MaterializerConfig) -> Self {
        Self { pool, config }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub(crate) fn config(&self) -> &MaterializerConfig {
        &self.config
    }
}

impl Repository for SqliteRepository {}

/// Fetches a task row by id on any executor (pool or open transaction).
pub(crate) async fn fetch_record<'e, E>(
    executor: E,
    id: Uuid,
) -> Result<Option<TaskRecord>, CoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?;
    row.map(TaskRecord::try_from).transpose()
}

/// Like [`fetch_record`] but treats a missing row as an error.
pub(crate) async fn require_record<'e, E>(executor: E, id: Uuid) -> Result<TaskRecord, CoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    fetch_record(executor, id)
        .await?
        .ok_or_else(|| CoreError::NotFound(id.to_string()))
}

/// Inserts a full task record. Returns the number of rows written, which is
/// zero when `ignore_conflict` is set and the `(master, sequence)` slot is
/// already taken by a concurrent writer.
pub(crate) async fn insert_record<'e, E>(
    executor: E,
    record: &TaskRecord,
    ignore_conflict: bool,
) -> Result<u64, CoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let (series_role, rule, master_id, sequence_index, is_override) = match &record.kind {
        SeriesKind::Standalone => (record.kind.role(), None, None, None, false),
        SeriesKind::Master { rule } => (record.kind.role(), Some(*rule), None, None, false),
        SeriesKind::Instance {
            master_id,
            sequence_index,
            is_override,
        } => (
            record.kind.role(),
            None,
            Some(*master_id),
            Some(i64::from(*sequence_index)),
            *is_override,
        ),
    };
    let (frequency, interval, count, until) = rule_columns(rule.as_ref());

    let conflict_clause = if ignore_conflict {
        " ON CONFLICT (parent_task_id, sequence_index) WHERE parent_task_id IS NOT NULL DO NOTHING"
    } else {
        ""
    };
    let sql = format!(
        "INSERT INTO tasks (id, title, description, status, priority, start_at, end_at, all_day, \
         assignee_id, business_id, series_role, recur_frequency, recur_interval, recur_count, \
         recur_until, parent_task_id, sequence_index, is_override, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20){}",
        conflict_clause
    );

    let result = sqlx::query(&sql)
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.description)
        .bind(&record.status)
        .bind(&record.priority)
        .bind(record.start_at)
        .bind(record.end_at)
        .bind(record.all_day)
        .bind(record.assignee_id)
        .bind(record.business_id)
        .bind(series_role)
        .bind(frequency)
        .bind(interval)
        .bind(count)
        .bind(until)
        .bind(master_id)
        .bind(sequence_index)
        .bind(is_override)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

/// Splits a rule into its four storage columns.
pub(crate) fn rule_columns(
    rule: Option<&RecurrenceRule>,
) -> (
    Option<crate::recurrence::Frequency>,
    Option<i64>,
    Option<i64>,
    Option<NaiveDate>,
) {
    match rule {
        Some(rule) => {
            let (count, until) = match rule.end {
                EndCondition::Never => (None, None),
                EndCondition::AfterCount(n) => (Some(i64::from(n)), None),
                EndCondition::UntilDate(d) => (None, Some(d)),
            };
            (
                Some(rule.frequency),
                Some(i64::from(rule.interval)),
                count,
                until,
            )
        }
        None => (None, None, None, None),
    }
}
