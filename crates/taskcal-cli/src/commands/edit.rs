use anyhow::bail;
use owo_colors::OwoColorize;
use taskcal_core::models::{EditScope, TaskChanges, TaskPriority, TaskStatus};
use taskcal_core::repository::{SeriesEditor, SqliteRepository, TaskRepository};

use crate::cli::EditArgs;
use crate::commands::parse_datetime;

pub async fn run(repo: &SqliteRepository, args: EditArgs) -> anyhow::Result<()> {
    let changes = TaskChanges {
        title: args.title,
        description: if args.clear_description {
            Some(None)
        } else {
            args.description.map(Some)
        },
        status: args
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        priority: args
            .priority
            .as_deref()
            .map(str::parse::<TaskPriority>)
            .transpose()?,
        assignee_id: if args.clear_assignee {
            Some(None)
        } else {
            args.assignee.map(Some)
        },
        business_id: args.business.map(Some),
        end_at: args
            .end
            .as_deref()
            .map(parse_datetime)
            .transpose()?
            .map(Some),
    };
    if changes.is_empty() {
        bail!("nothing to change; pass at least one field flag");
    }

    let updated = match args.scope.as_deref() {
        Some(scope) => {
            let scope: EditScope = scope.parse()?;
            repo.apply_edit(args.id, changes, scope).await?
        }
        None => repo.update_task(args.id, changes).await?,
    };
    println!("{} Updated '{}'.", "✓".green(), updated.title.bold());
    Ok(())
}
