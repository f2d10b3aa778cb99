use chrono::{Datelike, NaiveDate};
use comfy_table::{presets, Table};
use owo_colors::OwoColorize;
use taskcal_core::calendar::ResolvedView;
use taskcal_core::models::{TaskPriority, TaskRecord, TaskStatus};

/// Week-grid rendering for month, week, day, and custom views: a compact
/// day grid with occurrence counts, followed by an agenda of the busy days.
pub fn render_grid(view: &ResolvedView, tasks: &[TaskRecord]) {
    println!(" Sun   Mon   Tue   Wed   Thu   Fri   Sat");
    for week in &view.weeks {
        let mut row = String::new();
        for day in week {
            let count = tasks_on(tasks, *day).count();
            let cell = if count > 0 {
                format!("{:>2}({})", day.day(), count)
            } else {
                format!("{:>2}   ", day.day())
            };
            row.push_str(&format!("{:<6}", cell));
        }
        println!("{}", row);
    }

    let mut printed_any = false;
    for week in &view.weeks {
        for day in week {
            let mut day_tasks: Vec<&TaskRecord> = tasks_on(tasks, *day).collect();
            if day_tasks.is_empty() {
                continue;
            }
            day_tasks.sort_by_key(|t| t.start_at);
            if !printed_any {
                println!();
                printed_any = true;
            }
            println!("{}", day.format("%A, %B %-d").to_string().bold());
            for task in day_tasks {
                print_task_line(task);
            }
        }
    }
    if tasks.is_empty() {
        println!("{}", "No tasks in this range.".dimmed());
    }
}

/// Flat agenda used by the list view.
pub fn render_list(tasks: &[TaskRecord]) {
    if tasks.is_empty() {
        println!("{}", "No tasks.".dimmed());
        return;
    }
    let mut table = Table::new();
    table.load_preset(presets::UTF8_BORDERS_ONLY);
    table.set_header(vec!["Status", "When", "Title", "Priority", "Id"]);
    for task in tasks {
        let status = match task.status {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in progress",
            TaskStatus::Completed => "completed",
        };
        let when = if task.all_day {
            task.start_at.format("%Y-%m-%d (all-day)").to_string()
        } else {
            task.start_at.format("%Y-%m-%d %H:%M").to_string()
        };
        let title = if task.is_series_member() {
            format!("{} ↻", task.title)
        } else {
            task.title.clone()
        };
        let priority = match task.priority {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        };
        table.add_row(vec![
            status.to_string(),
            when,
            title,
            priority.to_string(),
            task.id.to_string(),
        ]);
    }
    println!("{table}");
}

fn tasks_on(tasks: &[TaskRecord], day: NaiveDate) -> impl Iterator<Item = &TaskRecord> {
    tasks
        .iter()
        .filter(move |t| t.start_at.date_naive() == day)
}

fn print_task_line(task: &TaskRecord) {
    let status = match task.status {
        TaskStatus::Pending => "○".to_string(),
        TaskStatus::InProgress => "◐".yellow().to_string(),
        TaskStatus::Completed => "●".green().to_string(),
    };
    let when = if task.all_day {
        "all-day".to_string()
    } else {
        task.start_at.format("%H:%M").to_string()
    };
    let priority = match task.priority {
        TaskPriority::Low => "low".dimmed().to_string(),
        TaskPriority::Medium => "medium".to_string(),
        TaskPriority::High => "high".red().bold().to_string(),
    };
    let series = if task.is_series_member() { " ↻" } else { "" };
    println!(
        "  {} {}  {}{}  [{}]  {}",
        status,
        when.dimmed(),
        task.title,
        series,
        priority,
        task.id.to_string().dimmed()
    );
}
