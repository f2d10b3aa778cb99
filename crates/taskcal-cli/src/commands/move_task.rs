use owo_colors::OwoColorize;
use taskcal_core::repository::{Rescheduler, SqliteRepository};

use crate::cli::MoveArgs;
use crate::commands::parse_date;

pub async fn run(repo: &SqliteRepository, args: MoveArgs) -> anyhow::Result<()> {
    let new_date = parse_date(&args.date)?;
    let moved = repo.reschedule(args.id, new_date).await?;
    println!(
        "{} Moved '{}' to {}.",
        "✓".green(),
        moved.title.bold(),
        moved.start_at.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}
