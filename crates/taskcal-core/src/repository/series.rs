use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{EditScope, SeriesKind, TaskChanges, TaskRecord};
use crate::recurrence::{occurrence_datetime, EndCondition};
use crate::repository::{fetch_record, insert_record, require_record, SqliteRepository};

#[async_trait]
impl super::SeriesEditor for SqliteRepository {
    async fn apply_edit(
        &self,
        target_id: Uuid,
        changes: TaskChanges,
        scope: EditScope,
    ) -> Result<TaskRecord, CoreError> {
        let target = require_record(self.pool(), target_id).await?;
        match (&target.kind, scope) {
            (SeriesKind::Standalone, _) => Err(CoreError::scope_mismatch(
                scope,
                "scope only applies to series members",
            )),
            (SeriesKind::Master { .. }, EditScope::ThisOccurrence)
            | (SeriesKind::Master { .. }, EditScope::ThisAndFuture) => Err(
                CoreError::scope_mismatch(scope, "target an occurrence, not the series template"),
            ),
            (SeriesKind::Instance { .. }, EditScope::ThisOccurrence) => {
                self.override_occurrence(&target, &changes).await
            }
            (
                SeriesKind::Instance {
                    master_id,
                    sequence_index,
                    ..
                },
                EditScope::ThisAndFuture,
            ) => {
                self.split_series(&target, *master_id, *sequence_index, &changes)
                    .await
            }
            (_, EditScope::EntireSeries) => self.edit_entire_series(&target, &changes).await,
        }
    }
}

impl SqliteRepository {
    /// `this` scope: the occurrence detaches from its master's template for
    /// the changed fields and is marked as an override.
    async fn override_occurrence(
        &self,
        target: &TaskRecord,
        changes: &TaskChanges,
    ) -> Result<TaskRecord, CoreError> {
        let mut qb = changes_update_builder(changes, true)
            .expect("override builder always has the flag column");
        qb.push(" WHERE id = ");
        qb.push_bind(target.id);
        qb.build().execute(self.pool()).await?;
        require_record(self.pool(), target.id).await
    }

    /// `this-and-future` scope: splits the series at the target occurrence.
    ///
    /// The whole split runs in one transaction, and the new master's id is
    /// derived from `(old master, split date)` so a retried split finds the
    /// master it already created instead of minting a second one.
    async fn split_series(
        &self,
        target: &TaskRecord,
        master_id: Uuid,
        split_index: u32,
        changes: &TaskChanges,
    ) -> Result<TaskRecord, CoreError> {
        // Splitting at the first occurrence leaves nothing behind the
        // split, so the edit covers the entire series. This also makes a
        // retried split land on the master it already created.
        if split_index == 0 {
            return self.edit_entire_series(target, changes).await;
        }
        let mut tx = self.pool().begin().await?;

        let master = fetch_record(&mut *tx, master_id).await?.ok_or_else(|| {
            warn!(instance_id = %target.id, %master_id, "instance references missing master");
            CoreError::MasterNotFound {
                instance_id: target.id,
                master_id,
            }
        })?;
        let rule = *master.rule().ok_or_else(|| {
            CoreError::Integrity(format!("master {} has no recurrence rule", master_id))
        })?;
        let anchor = master.start_at.date_naive();
        // The split point is the scheduled date for this sequence index,
        // even if the targeted occurrence was previously moved.
        let split_date = rule.occurrence_date(anchor, split_index).ok_or_else(|| {
            CoreError::InvalidInput("occurrence date out of range".to_string())
        })?;

        let new_master_id = Uuid::new_v5(&master_id, split_date.to_string().as_bytes());
        if fetch_record(&mut *tx, new_master_id).await?.is_none() {
            let now = Utc::now();
            let start_at = occurrence_datetime(master.start_at, split_date);
            let mut new_master = TaskRecord {
                id: new_master_id,
                start_at,
                end_at: master.end_at.map(|end| start_at + (end - master.start_at)),
                created_at: now,
                updated_at: now,
                kind: SeriesKind::Master {
                    rule: rule.remainder_after(split_index),
                },
                ..master.clone()
            };
            apply_changes_in_memory(&mut new_master, changes);
            insert_record(&mut *tx, &new_master, false).await?;
        }

        // Truncate the old master to end the day before the split.
        let truncated = rule.truncated_before(split_date);
        let until = match truncated.end {
            EndCondition::UntilDate(d) => d,
            _ => unreachable!("truncation always produces an until date"),
        };
        sqlx::query(
            "UPDATE tasks SET recur_count = NULL, recur_until = $1, updated_at = $2 WHERE id = $3",
        )
        .bind(until)
        .bind(Utc::now())
        .bind(master_id)
        .execute(&mut *tx)
        .await?;

        // Re-parent materialized instances at or after the split and rebase
        // their sequence indices onto the new master.
        sqlx::query(
            "UPDATE tasks SET parent_task_id = $1, sequence_index = sequence_index - $2, \
             updated_at = $3 WHERE parent_task_id = $4 AND sequence_index >= $5",
        )
        .bind(new_master_id)
        .bind(i64::from(split_index))
        .bind(Utc::now())
        .bind(master_id)
        .bind(i64::from(split_index))
        .execute(&mut *tx)
        .await?;

        // Skip markers past the split belong to the new master now.
        sqlx::query(
            "UPDATE series_skips SET master_id = $1, sequence_index = sequence_index - $2 \
             WHERE master_id = $3 AND sequence_index >= $4",
        )
        .bind(new_master_id)
        .bind(i64::from(split_index))
        .bind(master_id)
        .bind(i64::from(split_index))
        .execute(&mut *tx)
        .await?;

        // Already-materialized occurrences of the new series pick up the
        // requested changes; overrides keep their own fields.
        if let Some(mut qb) = changes_update_builder(changes, false) {
            qb.push(" WHERE parent_task_id = ");
            qb.push_bind(new_master_id);
            qb.push(" AND is_override = FALSE");
            qb.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        info!(old_master = %master_id, new_master = %new_master_id, %split_date, "split series");
        require_record(self.pool(), new_master_id).await
    }

    /// `all` scope: the master template changes and every non-override
    /// instance is re-synced to it. Overrides take precedence and are left
    /// untouched.
    async fn edit_entire_series(
        &self,
        target: &TaskRecord,
        changes: &TaskChanges,
    ) -> Result<TaskRecord, CoreError> {
        let master_id = match &target.kind {
            SeriesKind::Master { .. } => target.id,
            SeriesKind::Instance { master_id, .. } => *master_id,
            SeriesKind::Standalone => unreachable!("standalone rejected by apply_edit"),
        };
        let mut tx = self.pool().begin().await?;
        if fetch_record(&mut *tx, master_id).await?.is_none() {
            warn!(instance_id = %target.id, %master_id, "instance references missing master");
            return Err(CoreError::MasterNotFound {
                instance_id: target.id,
                master_id,
            });
        }
        if let Some(mut qb) = changes_update_builder(changes, false) {
            qb.push(" WHERE id = ");
            qb.push_bind(master_id);
            qb.build().execute(&mut *tx).await?;
        }
        if let Some(mut qb) = changes_update_builder(changes, false) {
            qb.push(" WHERE parent_task_id = ");
            qb.push_bind(master_id);
            qb.push(" AND is_override = FALSE");
            qb.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;
        require_record(self.pool(), master_id).await
    }
}

/// Builds `UPDATE tasks SET <assignments>` for the given changes. Returns
/// `None` when there is nothing to assign (unless `mark_override` forces
/// the override flag in). The caller appends the WHERE clause.
pub(crate) fn changes_update_builder(
    changes: &TaskChanges,
    mark_override: bool,
) -> Option<QueryBuilder<'static, Sqlite>> {
    if changes.is_empty() && !mark_override {
        return None;
    }
    let mut qb: QueryBuilder<'static, Sqlite> = QueryBuilder::new("UPDATE tasks SET ");
    let mut updated = false;
    let mut push_sep = |qb: &mut QueryBuilder<'static, Sqlite>, updated: &mut bool| {
        if *updated {
            qb.push(", ");
        }
        *updated = true;
    };

    if let Some(title) = &changes.title {
        push_sep(&mut qb, &mut updated);
        qb.push("title = ");
        qb.push_bind(title.clone());
    }
    if let Some(description) = &changes.description {
        push_sep(&mut qb, &mut updated);
        qb.push("description = ");
        qb.push_bind(description.clone());
    }
    if let Some(status) = &changes.status {
        push_sep(&mut qb, &mut updated);
        qb.push("status = ");
        qb.push_bind(status.clone());
    }
    if let Some(priority) = &changes.priority {
        push_sep(&mut qb, &mut updated);
        qb.push("priority = ");
        qb.push_bind(priority.clone());
    }
    if let Some(assignee_id) = &changes.assignee_id {
        push_sep(&mut qb, &mut updated);
        qb.push("assignee_id = ");
        qb.push_bind(*assignee_id);
    }
    if let Some(business_id) = &changes.business_id {
        push_sep(&mut qb, &mut updated);
        qb.push("business_id = ");
        qb.push_bind(*business_id);
    }
    if let Some(end_at) = &changes.end_at {
        push_sep(&mut qb, &mut updated);
        qb.push("end_at = ");
        qb.push_bind(*end_at);
    }
    if mark_override {
        push_sep(&mut qb, &mut updated);
        qb.push("is_override = TRUE");
    }
    push_sep(&mut qb, &mut updated);
    qb.push("updated_at = ");
    qb.push_bind(Utc::now());
    Some(qb)
}

/// Applies a direct update to one row. Used for standalone tasks where no
/// scope semantics apply.
pub(crate) async fn apply_changes_by_id<'e, E>(
    executor: E,
    id: Uuid,
    changes: &TaskChanges,
) -> Result<(), CoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    if let Some(mut qb) = changes_update_builder(changes, false) {
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.build().execute(executor).await?;
    }
    Ok(())
}

/// Mirrors the SQL assignments onto an in-memory record, used when a split
/// creates the new master before writing it.
fn apply_changes_in_memory(record: &mut TaskRecord, changes: &TaskChanges) {
    if let Some(title) = &changes.title {
        record.title = title.clone();
    }
    if let Some(description) = &changes.description {
        record.description = description.clone();
    }
    if let Some(status) = &changes.status {
        record.status = status.clone();
    }
    if let Some(priority) = &changes.priority {
        record.priority = priority.clone();
    }
    if let Some(assignee_id) = &changes.assignee_id {
        record.assignee_id = *assignee_id;
    }
    if let Some(business_id) = &changes.business_id {
        record.business_id = *business_id;
    }
    if let Some(end_at) = &changes.end_at {
        record.end_at = *end_at;
    }
}
