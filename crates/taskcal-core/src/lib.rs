//! # Taskcal Core Library
//!
//! The recurring-task scheduling and calendar engine behind taskcal:
//! recurrence expansion, lazy instance materialization, scoped series
//! edits, cascade deletion, and windowed calendar queries over SQLite.
//!
//! ## Features
//!
//! - **Constrained recurrence vocabulary**: daily/weekly/monthly/yearly
//!   rules with an interval and an optional end condition, with monthly
//!   dates clamped to short months
//! - **Lazy materialization**: occurrences become persisted rows only when
//!   a calendar window needs them, idempotently and safely under
//!   concurrent requests
//! - **Scoped series edits**: this occurrence, this-and-future (series
//!   split), or the entire series, with per-occurrence overrides taking
//!   precedence over series-wide changes
//! - **Calendar range resolution**: month/week/day/list/custom views with
//!   week grids and unit-sized navigation
//! - **Type safety**: the task's series role is a sum type, so a master
//!   with a parent reference is unrepresentable
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use taskcal_core::{
//!     calendar::{self, CalendarView},
//!     db,
//!     models::{MaterializerConfig, NewTaskData},
//!     query::TaskFilters,
//!     recurrence::{EndCondition, Frequency, RecurrenceRule},
//!     repository::{SqliteRepository, TaskRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("taskcal.db").await?;
//!     let repo = SqliteRepository::new(pool, MaterializerConfig::default());
//!
//!     let mut data = NewTaskData::titled("Weekly stock check", Utc::now());
//!     data.recurrence = Some(RecurrenceRule::new(
//!         Frequency::Weekly,
//!         1,
//!         EndCondition::Never,
//!     ));
//!     let master = repo.add_task(data).await?;
//!
//!     let view = calendar::resolve(CalendarView::Month, Utc::now().date_naive(), None)?;
//!     let occurrences = repo.query(view.window, &TaskFilters::default()).await?;
//!     println!("{} occurrences for {}", occurrences.len(), master.title);
//!
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod db;
pub mod error;
pub mod models;
pub mod query;
pub mod recurrence;
pub mod repository;
