use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use sqlx::{QueryBuilder, Sqlite};
use tracing::warn;
use uuid::Uuid;

use crate::calendar::DateWindow;
use crate::error::CoreError;
use crate::models::{
    NewTaskData, SeriesKind, TaskChanges, TaskPriority, TaskRecord, TaskRow, TaskStatus,
};
use crate::query::TaskFilters;
use crate::repository::series::apply_changes_by_id;
use crate::repository::{
    fetch_record, insert_record, require_record, InstanceMaterializer, SqliteRepository,
};

#[async_trait]
impl super::TaskRepository for SqliteRepository {
    async fn add_task(&self, data: NewTaskData) -> Result<TaskRecord, CoreError> {
        let kind = match data.recurrence {
            Some(rule) => {
                rule.validate(data.start_at.date_naive())?;
                SeriesKind::Master { rule }
            }
            None => SeriesKind::Standalone,
        };
        let now = Utc::now();
        let record = TaskRecord {
            id: Uuid::now_v7(),
            title: data.title,
            description: data.description,
            status: TaskStatus::Pending,
            priority: data.priority.unwrap_or(TaskPriority::Medium),
            start_at: data.start_at,
            end_at: data.end_at,
            all_day: data.all_day,
            assignee_id: data.assignee_id,
            business_id: data.business_id,
            created_at: now,
            updated_at: now,
            kind,
        };
        insert_record(self.pool(), &record, false).await?;

        // Prime the horizon so a freshly created series shows up on the
        // calendar without waiting for the first windowed query.
        if matches!(record.kind, SeriesKind::Master { .. }) {
            let anchor = record.start_at.date_naive();
            let window = DateWindow::new(anchor, anchor + Duration::days(self.config().lookahead_days));
            self.materialize(record.id, window).await?;
        }
        Ok(record)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<TaskRecord>, CoreError> {
        fetch_record(self.pool(), id).await
    }

    async fn update_task(&self, id: Uuid, changes: TaskChanges) -> Result<TaskRecord, CoreError> {
        let record = require_record(self.pool(), id).await?;
        if record.is_series_member() {
            return Err(CoreError::scope_mismatch(
                "direct",
                "series members require a scoped edit",
            ));
        }
        apply_changes_by_id(self.pool(), id, &changes).await?;
        require_record(self.pool(), id).await
    }

    async fn query(
        &self,
        window: Option<DateWindow>,
        filters: &TaskFilters,
    ) -> Result<Vec<TaskRecord>, CoreError> {
        self.extend_horizon(window).await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM tasks WHERE series_role != 'master'");
        if let Some(window) = window {
            let start = window.start.and_time(NaiveTime::MIN).and_utc();
            let end = window.end.and_time(NaiveTime::MIN).and_utc();
            qb.push(" AND start_at >= ");
            qb.push_bind(start);
            qb.push(" AND start_at < ");
            qb.push_bind(end);
        }
        if let Some(assignee_id) = filters.assignee_id {
            qb.push(" AND assignee_id = ");
            qb.push_bind(assignee_id);
        }
        if let Some(business_id) = filters.business_id {
            qb.push(" AND business_id = ");
            qb.push_bind(business_id);
        }
        if let Some(status) = &filters.status {
            qb.push(" AND status = ");
            qb.push_bind(status.clone());
        }
        if let Some(text) = &filters.text {
            let pattern = format!("%{}%", text);
            qb.push(" AND (title LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR description LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }
        qb.push(" ORDER BY start_at ASC, sequence_index ASC");

        let rows: Vec<TaskRow> = qb.build_query_as().fetch_all(self.pool()).await?;
        // Corrupt rows are logged and dropped from the answer instead of
        // failing the whole view.
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                match TaskRecord::try_from(row) {
                    Ok(record) => Some(record),
                    Err(err) => {
                        warn!(%id, %err, "skipping corrupt task row");
                        None
                    }
                }
            })
            .collect())
    }
}

impl SqliteRepository {
    /// Ensures every master whose recurrence could intersect the requested
    /// window has been materialized over it, plus a lookahead buffer.
    async fn extend_horizon(&self, window: Option<DateWindow>) -> Result<(), CoreError> {
        let lookahead = self.config().lookahead_days;
        let target = match window {
            Some(window) => DateWindow::new(
                window.start,
                window.end + Duration::days(lookahead.max(window.len_days())),
            ),
            None => {
                let today = Utc::now().date_naive();
                DateWindow::new(today, today + Duration::days(lookahead))
            }
        };

        let rows: Vec<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE series_role = 'master'")
            .fetch_all(self.pool())
            .await?;
        for row in rows {
            let id = row.id;
            // Same policy as the answer path: a corrupt master is logged
            // and skipped, never a reason to fail the whole view.
            let master = match TaskRecord::try_from(row) {
                Ok(master) => master,
                Err(err) => {
                    warn!(%id, %err, "skipping corrupt master row");
                    continue;
                }
            };
            let rule = match master.rule() {
                Some(rule) => *rule,
                None => continue,
            };
            let anchor = master.start_at.date_naive();
            if anchor >= target.end || rule.ends_before(anchor, target.start) {
                continue;
            }
            self.materialize(master.id, target).await?;
        }
        Ok(())
    }
}
