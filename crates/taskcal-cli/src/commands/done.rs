use owo_colors::OwoColorize;
use taskcal_core::models::{EditScope, TaskChanges, TaskStatus};
use taskcal_core::repository::{SeriesEditor, SqliteRepository, TaskRepository};

use crate::cli::DoneArgs;

/// Completion always targets just the given task. For a series member that
/// means the single occurrence becomes an override; the rest of the series
/// stays pending.
pub async fn run(repo: &SqliteRepository, args: DoneArgs) -> anyhow::Result<()> {
    let changes = TaskChanges {
        status: Some(TaskStatus::Completed),
        ..TaskChanges::default()
    };
    let task = repo
        .find_task_by_id(args.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no task with id {}", args.id))?;
    let updated = if task.is_series_member() {
        repo.apply_edit(args.id, changes, EditScope::ThisOccurrence)
            .await?
    } else {
        repo.update_task(args.id, changes).await?
    };
    println!("{} Completed '{}'.", "✓".green(), updated.title.bold());
    Ok(())
}
