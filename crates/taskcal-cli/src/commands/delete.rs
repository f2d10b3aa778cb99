use anyhow::bail;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use taskcal_core::models::DeleteScope;
use taskcal_core::repository::{SeriesDeleter, SqliteRepository};

use crate::cli::DeleteArgs;

pub async fn run(repo: &SqliteRepository, args: DeleteArgs) -> anyhow::Result<()> {
    if args.occurrence && args.ids.len() > 1 {
        bail!("--occurrence takes a single id");
    }

    if !args.force {
        let what = if args.occurrence {
            "this occurrence".to_string()
        } else if args.ids.len() == 1 {
            "this task (and its series, if recurring)".to_string()
        } else {
            format!("{} tasks (and their series, if recurring)", args.ids.len())
        };
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {}?", what))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    if args.occurrence {
        repo.delete_chain(args.ids[0], DeleteScope::ThisOccurrence)
            .await?;
        println!("{} Deleted 1 occurrence.", "✓".green());
        return Ok(());
    }

    let outcome = repo.delete_many(&args.ids).await?;
    println!("{} Deleted {} task(s).", "✓".green(), outcome.deleted);
    for failure in &outcome.failures {
        eprintln!(
            "{} {}: {}",
            "✗".red(),
            failure.id.to_string().dimmed(),
            failure.reason
        );
    }
    if !outcome.failures.is_empty() {
        bail!("{} deletion(s) failed", outcome.failures.len());
    }
    Ok(())
}
