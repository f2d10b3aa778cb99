use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;
use crate::recurrence::{EndCondition, Frequency, RecurrenceRule};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" | "in-progress" | "inprogress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

/// Storage discriminator for the three task shapes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SeriesRole {
    Standalone,
    Master,
    Instance,
}

impl fmt::Display for SeriesRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesRole::Standalone => write!(f, "standalone"),
            SeriesRole::Master => write!(f, "master"),
            SeriesRole::Instance => write!(f, "instance"),
        }
    }
}

/// What a task is within a series, as a sum type: a master cannot carry a
/// parent reference and a standalone cannot carry a rule, by construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SeriesKind {
    Standalone,
    Master { rule: RecurrenceRule },
    Instance {
        master_id: Uuid,
        sequence_index: u32,
        is_override: bool,
    },
}

impl SeriesKind {
    pub fn role(&self) -> SeriesRole {
        match self {
            SeriesKind::Standalone => SeriesRole::Standalone,
            SeriesKind::Master { .. } => SeriesRole::Master,
            SeriesKind::Instance { .. } => SeriesRole::Instance,
        }
    }
}

/// The core entity: a standalone task, a recurring master (template), or a
/// materialized instance linked to its master.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    /// Opaque reference into the users directory; stored, never validated.
    pub assignee_id: Option<Uuid>,
    /// Opaque reference into the businesses directory; stored, never validated.
    pub business_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub kind: SeriesKind,
}

impl TaskRecord {
    pub fn rule(&self) -> Option<&RecurrenceRule> {
        match &self.kind {
            SeriesKind::Master { rule } => Some(rule),
            _ => None,
        }
    }

    pub fn master_id(&self) -> Option<Uuid> {
        match &self.kind {
            SeriesKind::Instance { master_id, .. } => Some(*master_id),
            _ => None,
        }
    }

    pub fn sequence_index(&self) -> Option<u32> {
        match &self.kind {
            SeriesKind::Instance { sequence_index, .. } => Some(*sequence_index),
            _ => None,
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(
            self.kind,
            SeriesKind::Instance {
                is_override: true,
                ..
            }
        )
    }

    /// True for masters and instances alike.
    pub fn is_series_member(&self) -> bool {
        !matches!(self.kind, SeriesKind::Standalone)
    }
}

/// Flat row shape as stored in SQLite. Converted to [`TaskRecord`] with a
/// fallible mapping so corrupt role/column combinations surface as
/// integrity errors instead of half-populated records.
#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub assignee_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    pub series_role: SeriesRole,
    pub recur_frequency: Option<Frequency>,
    pub recur_interval: Option<i64>,
    pub recur_count: Option<i64>,
    pub recur_until: Option<chrono::NaiveDate>,
    pub parent_task_id: Option<Uuid>,
    pub sequence_index: Option<i64>,
    pub is_override: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for TaskRecord {
    type Error = CoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let kind = match row.series_role {
            SeriesRole::Standalone => SeriesKind::Standalone,
            SeriesRole::Master => {
                let frequency = row.recur_frequency.ok_or_else(|| {
                    CoreError::Integrity(format!("master {} has no recurrence frequency", row.id))
                })?;
                let interval = row.recur_interval.unwrap_or(1) as u32;
                let end = match (row.recur_count, row.recur_until) {
                    (Some(n), _) => EndCondition::AfterCount(n as u32),
                    (None, Some(until)) => EndCondition::UntilDate(until),
                    (None, None) => EndCondition::Never,
                };
                SeriesKind::Master {
                    rule: RecurrenceRule::new(frequency, interval, end),
                }
            }
            SeriesRole::Instance => {
                let master_id = row.parent_task_id.ok_or_else(|| {
                    CoreError::Integrity(format!("instance {} has no parent task", row.id))
                })?;
                let sequence_index = row.sequence_index.ok_or_else(|| {
                    CoreError::Integrity(format!("instance {} has no sequence index", row.id))
                })? as u32;
                SeriesKind::Instance {
                    master_id,
                    sequence_index,
                    is_override: row.is_override,
                }
            }
        };
        Ok(TaskRecord {
            id: row.id,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            start_at: row.start_at,
            end_at: row.end_at,
            all_day: row.all_day,
            assignee_id: row.assignee_id,
            business_id: row.business_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            kind,
        })
    }
}

/// Data for creating a task. When `recurrence` is present the task is
/// stored as a series master and its occurrences materialize on demand.
#[derive(Debug, Clone)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub assignee_id: Option<Uuid>,
    pub business_id: Option<Uuid>,
    pub recurrence: Option<RecurrenceRule>,
}

impl NewTaskData {
    pub fn titled(title: impl Into<String>, start_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: None,
            start_at,
            end_at: None,
            all_day: false,
            assignee_id: None,
            business_id: None,
            recurrence: None,
        }
    }
}

/// Field changes for scoped edits. `None` leaves a field untouched; the
/// nested options distinguish "clear" from "leave alone".
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<Option<Uuid>>,
    pub business_id: Option<Option<Uuid>>,
    pub end_at: Option<Option<DateTime<Utc>>>,
}

impl TaskChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee_id.is_none()
            && self.business_id.is_none()
            && self.end_at.is_none()
    }
}

/// Scope for edits on series members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditScope {
    /// Affect only the selected occurrence (it becomes an override).
    ThisOccurrence,
    /// Split the series at the selected occurrence and change everything
    /// from there on.
    ThisAndFuture,
    /// Change the master template; non-override instances follow.
    EntireSeries,
}

impl fmt::Display for EditScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditScope::ThisOccurrence => write!(f, "this"),
            EditScope::ThisAndFuture => write!(f, "future"),
            EditScope::EntireSeries => write!(f, "all"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid edit scope: {0}")]
pub struct ParseEditScopeError(String);

impl FromStr for EditScope {
    type Err = ParseEditScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "this" | "occurrence" => Ok(EditScope::ThisOccurrence),
            "future" | "this-and-future" => Ok(EditScope::ThisAndFuture),
            "all" | "series" => Ok(EditScope::EntireSeries),
            _ => Err(ParseEditScopeError(s.to_string())),
        }
    }
}

/// Scope for deletions on series members.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    /// Remove one occurrence and record a skip so it is not regenerated.
    ThisOccurrence,
    /// Cascade: remove the master and every instance.
    EntireSeries,
}

/// A skip marker: a sequence index the materializer must not regenerate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeriesSkip {
    pub master_id: Uuid,
    pub sequence_index: i64,
    pub created_at: DateTime<Utc>,
}

/// Aggregate outcome of a bulk delete. Failures never abort the remaining
/// deletions; each carries its own reason.
#[derive(Debug, Default)]
pub struct BulkDeleteOutcome {
    pub deleted: usize,
    pub failures: Vec<BulkDeleteFailure>,
}

#[derive(Debug)]
pub struct BulkDeleteFailure {
    pub id: Uuid,
    pub reason: CoreError,
}

/// Materialization policy knobs.
#[derive(Debug, Clone)]
pub struct MaterializerConfig {
    /// Minimum lookahead past the requested window, in days.
    pub lookahead_days: i64,
    /// Upper bound on instances created in one materialization pass.
    pub max_batch_size: usize,
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            lookahead_days: 31,
            max_batch_size: 500,
        }
    }
}
