use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "taskcal", version, about = "Recurring tasks on a calendar, from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a task, optionally as a recurring series
    Add(AddArgs),
    /// Render a calendar view of occurrences
    View(ViewArgs),
    /// Edit a task, with a scope when it belongs to a series
    Edit(EditArgs),
    /// Delete tasks, one occurrence or the whole series
    Delete(DeleteArgs),
    /// Move a task or occurrence to a different date
    Move(MoveArgs),
    /// Mark a task as completed
    Done(DoneArgs),
    /// Show the next dates a recurrence rule would produce, without saving
    Preview(PreviewArgs),
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title
    pub title: String,

    /// Start date or datetime: YYYY-MM-DD or "YYYY-MM-DD HH:MM" (UTC)
    #[arg(short, long)]
    pub start: String,

    /// End datetime, same formats as --start
    #[arg(long)]
    pub end: Option<String>,

    /// Mark as an all-day task
    #[arg(long)]
    pub all_day: bool,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Priority: low, medium, high
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Assignee id from the users directory
    #[arg(long)]
    pub assignee: Option<Uuid>,

    /// Business id the task belongs to
    #[arg(long)]
    pub business: Option<Uuid>,

    /// Repeat frequency: daily, weekly, monthly, yearly
    #[arg(long, value_name = "FREQUENCY")]
    pub every: Option<String>,

    /// Repeat every N frequency units
    #[arg(long, default_value_t = 1, requires = "every")]
    pub interval: u32,

    /// Stop after N occurrences (counting the first)
    #[arg(long, requires = "every", conflicts_with = "until")]
    pub count: Option<u32>,

    /// Last date (inclusive) an occurrence may fall on: YYYY-MM-DD
    #[arg(long, requires = "every")]
    pub until: Option<String>,
}

#[derive(Args)]
pub struct ViewArgs {
    /// View kind: month, week, day, list, custom
    #[arg(short, long, default_value = "month")]
    pub view: String,

    /// Reference date (defaults to today): YYYY-MM-DD
    #[arg(long)]
    pub on: Option<String>,

    /// Custom range start: YYYY-MM-DD
    #[arg(long, requires = "to")]
    pub from: Option<String>,

    /// Custom range end (inclusive): YYYY-MM-DD
    #[arg(long, requires = "from")]
    pub to: Option<String>,

    /// Only tasks assigned to this user id
    #[arg(long)]
    pub assignee: Option<Uuid>,

    /// Only tasks for this business id
    #[arg(long)]
    pub business: Option<Uuid>,

    /// Only tasks with this status: pending, in_progress, completed
    #[arg(long)]
    pub status: Option<String>,

    /// Substring match on title and description
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task or occurrence id
    pub id: Uuid,

    /// Scope for series members: this, future, all
    #[arg(long)]
    pub scope: Option<String>,

    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short, long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    /// Remove the description
    #[arg(long)]
    pub clear_description: bool,

    /// Priority: low, medium, high
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Status: pending, in_progress, completed
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long, conflicts_with = "clear_assignee")]
    pub assignee: Option<Uuid>,

    /// Unassign the task
    #[arg(long)]
    pub clear_assignee: bool,

    #[arg(long)]
    pub business: Option<Uuid>,

    /// End datetime: YYYY-MM-DD or "YYYY-MM-DD HH:MM" (UTC)
    #[arg(long)]
    pub end: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// One or more task ids
    #[arg(required = true)]
    pub ids: Vec<Uuid>,

    /// Delete only the targeted occurrence instead of its whole series
    #[arg(long)]
    pub occurrence: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Task or occurrence id
    pub id: Uuid,

    /// New date: YYYY-MM-DD (time of day is preserved)
    pub date: String,
}

#[derive(Args)]
pub struct DoneArgs {
    /// Task or occurrence id
    pub id: Uuid,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// First occurrence date: YYYY-MM-DD
    #[arg(short, long)]
    pub start: String,

    /// Repeat frequency: daily, weekly, monthly, yearly
    #[arg(long, value_name = "FREQUENCY")]
    pub every: String,

    /// Repeat every N frequency units
    #[arg(long, default_value_t = 1)]
    pub interval: u32,

    /// Stop after N occurrences (counting the first)
    #[arg(long, conflicts_with = "until")]
    pub count: Option<u32>,

    /// Last date (inclusive) an occurrence may fall on: YYYY-MM-DD
    #[arg(long)]
    pub until: Option<String>,

    /// How many dates to show
    #[arg(long, default_value_t = 10)]
    pub take: usize,
}
