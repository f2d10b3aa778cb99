use owo_colors::OwoColorize;
use taskcal_core::recurrence::{EndCondition, Frequency, RecurrenceRule};

use crate::cli::PreviewArgs;
use crate::commands::parse_date;

pub fn run(args: PreviewArgs) -> anyhow::Result<()> {
    let anchor = parse_date(&args.start)?;
    let frequency: Frequency = args.every.parse()?;
    let end = match (args.count, args.until.as_deref()) {
        (Some(n), _) => EndCondition::AfterCount(n),
        (None, Some(until)) => EndCondition::UntilDate(parse_date(until)?),
        (None, None) => EndCondition::Never,
    };
    let rule = RecurrenceRule::new(frequency, args.interval, end);
    rule.validate(anchor)?;

    let dates: Vec<_> = rule.occurrences(anchor).take(args.take).collect();
    for (index, date) in &dates {
        println!("  {:>3}. {}", index + 1, date.format("%Y-%m-%d (%a)"));
    }
    if dates.len() == args.take {
        println!("{}", "…".dimmed());
    }
    Ok(())
}
