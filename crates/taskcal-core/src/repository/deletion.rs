use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{BulkDeleteFailure, BulkDeleteOutcome, DeleteScope, SeriesKind, TaskRecord};
use crate::repository::{fetch_record, require_record, SqliteRepository};

#[async_trait]
impl super::SeriesDeleter for SqliteRepository {
    async fn delete_chain(&self, target_id: Uuid, scope: DeleteScope) -> Result<usize, CoreError> {
        let target = require_record(self.pool(), target_id).await?;
        match (&target.kind, scope) {
            // Scope is a series concept; a standalone row is simply removed.
            (SeriesKind::Standalone, _) => {
                sqlx::query("DELETE FROM tasks WHERE id = $1")
                    .bind(target_id)
                    .execute(self.pool())
                    .await?;
                Ok(1)
            }
            (SeriesKind::Master { .. }, DeleteScope::EntireSeries) => {
                self.delete_series(target_id).await
            }
            (SeriesKind::Master { .. }, DeleteScope::ThisOccurrence) => Err(
                CoreError::scope_mismatch("this", "target an occurrence, not the series template"),
            ),
            (SeriesKind::Instance { master_id, .. }, DeleteScope::EntireSeries) => {
                let master_id = *master_id;
                if fetch_record(self.pool(), master_id).await?.is_none() {
                    warn!(instance_id = %target_id, %master_id, "instance references missing master");
                    return Err(CoreError::MasterNotFound {
                        instance_id: target_id,
                        master_id,
                    });
                }
                self.delete_series(master_id).await
            }
            (SeriesKind::Instance { .. }, DeleteScope::ThisOccurrence) => {
                self.delete_occurrence(&target).await
            }
        }
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<BulkDeleteOutcome, CoreError> {
        let mut outcome = BulkDeleteOutcome::default();
        for &id in ids {
            // Each chain is deleted independently; one failure never stops
            // the rest.
            let result = match fetch_record(self.pool(), id).await {
                Ok(Some(_)) => self.delete_chain(id, DeleteScope::EntireSeries).await,
                Ok(None) => Err(CoreError::NotFound(id.to_string())),
                Err(err) => Err(err),
            };
            match result {
                Ok(count) => outcome.deleted += count,
                Err(reason) => outcome.failures.push(BulkDeleteFailure { id, reason }),
            }
        }
        Ok(outcome)
    }
}

impl SqliteRepository {
    /// Cascade: every instance, every skip marker, then the master itself,
    /// in one transaction.
    async fn delete_series(&self, master_id: Uuid) -> Result<usize, CoreError> {
        let mut tx = self.pool().begin().await?;
        let instances = sqlx::query("DELETE FROM tasks WHERE parent_task_id = $1")
            .bind(master_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM series_skips WHERE master_id = $1")
            .bind(master_id)
            .execute(&mut *tx)
            .await?;
        let master = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(master_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        let total = (instances + master) as usize;
        info!(%master_id, total, "deleted series chain");
        Ok(total)
    }

    /// Removes one occurrence and records a skip marker so the materializer
    /// does not regenerate that date. An orphaned instance is deleted like
    /// a standalone row.
    async fn delete_occurrence(&self, target: &TaskRecord) -> Result<usize, CoreError> {
        let (master_id, sequence_index) = match &target.kind {
            SeriesKind::Instance {
                master_id,
                sequence_index,
                ..
            } => (*master_id, *sequence_index),
            _ => unreachable!("delete_occurrence only called for instances"),
        };
        let mut tx = self.pool().begin().await?;
        if fetch_record(&mut *tx, master_id).await?.is_some() {
            sqlx::query(
                "INSERT INTO series_skips (master_id, sequence_index, created_at) \
                 VALUES ($1, $2, $3) ON CONFLICT (master_id, sequence_index) DO NOTHING",
            )
            .bind(master_id)
            .bind(i64::from(sequence_index))
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        } else {
            warn!(instance_id = %target.id, %master_id, "deleting orphaned instance without skip marker");
        }
        sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(target.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(1)
    }
}
