use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::calendar::DateWindow;
use crate::error::CoreError;
use crate::models::{SeriesKind, SeriesSkip, TaskRecord, TaskRow, TaskStatus};
use crate::recurrence::occurrence_datetime;
use crate::repository::{insert_record, require_record, SqliteRepository};

#[async_trait]
impl super::InstanceMaterializer for SqliteRepository {
    async fn materialize(
        &self,
        master_id: Uuid,
        window: DateWindow,
    ) -> Result<Vec<TaskRecord>, CoreError> {
        let master = require_record(self.pool(), master_id).await?;
        let rule = match &master.kind {
            SeriesKind::Master { rule } => *rule,
            _ => {
                return Err(CoreError::InvalidInput(format!(
                    "task {} is not a series master",
                    master_id
                )))
            }
        };

        let skips: Vec<SeriesSkip> =
            sqlx::query_as("SELECT * FROM series_skips WHERE master_id = $1")
                .bind(master_id)
                .fetch_all(self.pool())
                .await?;
        let skipped: HashSet<u32> = skips.iter().map(|s| s.sequence_index as u32).collect();

        let anchor = master.start_at.date_naive();
        let mut created = 0usize;
        for (index, date) in rule.occurrences_between(anchor, window.start, window.end)? {
            if skipped.contains(&index) {
                continue;
            }
            if created >= self.config().max_batch_size {
                break;
            }
            let instance = instance_from_template(&master, index, date);
            // The unique (master, sequence) index resolves the race between
            // concurrent materializations: the losing writer sees zero rows
            // affected and moves on.
            let written = insert_record(self.pool(), &instance, true).await?;
            if written > 0 {
                created += 1;
            }
        }
        if created > 0 {
            debug!(%master_id, created, "materialized series instances");
        }

        let start = window.start.and_time(NaiveTime::MIN).and_utc();
        let end = window.end.and_time(NaiveTime::MIN).and_utc();
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE parent_task_id = $1 AND start_at >= $2 AND start_at < $3 \
             ORDER BY start_at, sequence_index",
        )
        .bind(master_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?;
        rows.into_iter().map(TaskRecord::try_from).collect()
    }
}

/// Builds a fresh instance carrying the master's template fields. The
/// occurrence keeps the master's time-of-day and event duration.
fn instance_from_template(
    master: &TaskRecord,
    sequence_index: u32,
    date: chrono::NaiveDate,
) -> TaskRecord {
    let start_at = occurrence_datetime(master.start_at, date);
    let end_at = master.end_at.map(|end| start_at + (end - master.start_at));
    let now = Utc::now();
    TaskRecord {
        id: Uuid::now_v7(),
        title: master.title.clone(),
        description: master.description.clone(),
        status: TaskStatus::Pending,
        priority: master.priority.clone(),
        start_at,
        end_at,
        all_day: master.all_day,
        assignee_id: master.assignee_id,
        business_id: master.business_id,
        created_at: now,
        updated_at: now,
        kind: SeriesKind::Instance {
            master_id: master.id,
            sequence_index,
            is_override: false,
        },
    }
}
