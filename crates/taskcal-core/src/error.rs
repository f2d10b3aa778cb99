use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrenceRule(String),

    #[error("Edit scope '{scope}' does not apply: {reason}")]
    SeriesScopeMismatch { scope: String, reason: String },

    #[error("Instance {instance_id} references missing master {master_id}")]
    MasterNotFound { instance_id: Uuid, master_id: Uuid },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Data integrity violation: {0}")]
    Integrity(String),
}

impl CoreError {
    pub fn scope_mismatch(scope: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        CoreError::SeriesScopeMismatch {
            scope: scope.to_string(),
            reason: reason.into(),
        }
    }
}
