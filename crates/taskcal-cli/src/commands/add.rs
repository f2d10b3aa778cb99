use owo_colors::OwoColorize;
use taskcal_core::models::{NewTaskData, TaskPriority};
use taskcal_core::recurrence::{EndCondition, Frequency, RecurrenceRule};
use taskcal_core::repository::{SqliteRepository, TaskRepository};

use crate::cli::AddArgs;
use crate::commands::{parse_date, parse_datetime};

pub async fn run(repo: &SqliteRepository, args: AddArgs) -> anyhow::Result<()> {
    let start_at = parse_datetime(&args.start)?;
    let mut data = NewTaskData::titled(args.title, start_at);
    data.description = args.description;
    data.all_day = args.all_day;
    data.end_at = args.end.as_deref().map(parse_datetime).transpose()?;
    data.priority = args
        .priority
        .as_deref()
        .map(str::parse::<TaskPriority>)
        .transpose()?;
    data.assignee_id = args.assignee;
    data.business_id = args.business;

    if let Some(every) = args.every.as_deref() {
        let frequency: Frequency = every.parse()?;
        let end = match (args.count, args.until.as_deref()) {
            (Some(n), _) => EndCondition::AfterCount(n),
            (None, Some(until)) => EndCondition::UntilDate(parse_date(until)?),
            (None, None) => EndCondition::Never,
        };
        data.recurrence = Some(RecurrenceRule::new(frequency, args.interval, end));
    }

    let task = repo.add_task(data).await?;
    match task.rule() {
        Some(rule) => println!(
            "{} Created series '{}' repeating {} (every {}). Id: {}",
            "✓".green(),
            task.title.bold(),
            rule.frequency,
            rule.interval,
            task.id
        ),
        None => println!(
            "{} Created task '{}' on {}. Id: {}",
            "✓".green(),
            task.title.bold(),
            task.start_at.format("%Y-%m-%d"),
            task.id
        ),
    }
    Ok(())
}
