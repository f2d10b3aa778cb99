use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{SeriesKind, TaskRecord};
use crate::repository::{require_record, SqliteRepository};

#[async_trait]
impl super::Rescheduler for SqliteRepository {
    async fn reschedule(&self, task_id: Uuid, new_date: NaiveDate) -> Result<TaskRecord, CoreError> {
        let target = require_record(self.pool(), task_id).await?;

        // All-day tasks land on midnight; timed tasks keep their
        // time-of-day across the move.
        let new_start = if target.all_day {
            new_date.and_time(NaiveTime::MIN).and_utc()
        } else {
            new_date.and_time(target.start_at.time()).and_utc()
        };
        let new_end = target
            .end_at
            .map(|end| new_start + (end - target.start_at));

        let mark_override = match &target.kind {
            // Moving one occurrence never silently moves the whole series:
            // a plain instance detaches into an override.
            SeriesKind::Instance { .. } => true,
            SeriesKind::Standalone => false,
            SeriesKind::Master { .. } => {
                return Err(CoreError::scope_mismatch(
                    "reschedule",
                    "target an occurrence, not the series template",
                ))
            }
        };

        sqlx::query(
            "UPDATE tasks SET start_at = $1, end_at = $2, is_override = $3, updated_at = $4 \
             WHERE id = $5",
        )
        .bind(new_start)
        .bind(new_end)
        .bind(mark_override || target.is_override())
        .bind(Utc::now())
        .bind(task_id)
        .execute(self.pool())
        .await?;

        require_record(self.pool(), task_id).await
    }
}
