use chrono::Utc;
use taskcal_core::calendar::{self, CalendarView};
use taskcal_core::models::TaskStatus;
use taskcal_core::query::TaskFilters;
use taskcal_core::repository::{SqliteRepository, TaskRepository};

use crate::cli::ViewArgs;
use crate::commands::parse_date;
use crate::views;

pub async fn run(repo: &SqliteRepository, args: ViewArgs) -> anyhow::Result<()> {
    let view: CalendarView = args.view.parse()?;
    let reference = match args.on.as_deref() {
        Some(on) => parse_date(on)?,
        None => Utc::now().date_naive(),
    };
    let custom = match (args.from.as_deref(), args.to.as_deref()) {
        (Some(from), Some(to)) => Some((parse_date(from)?, parse_date(to)?)),
        _ => None,
    };
    let resolved = calendar::resolve(view, reference, custom)?;

    let filters = TaskFilters {
        assignee_id: args.assignee,
        business_id: args.business,
        status: args
            .status
            .as_deref()
            .map(str::parse::<TaskStatus>)
            .transpose()?,
        text: args.search,
    };
    let tasks = repo.query(resolved.window, &filters).await?;

    if resolved.weeks.is_empty() {
        views::render_list(&tasks);
    } else {
        views::render_grid(&resolved, &tasks);
    }
    Ok(())
}
