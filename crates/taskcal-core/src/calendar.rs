use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;

/// Requested calendar view.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CalendarView {
    Month,
    Week,
    Day,
    List,
    Custom,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid calendar view: {0}")]
pub struct ParseCalendarViewError(String);

impl FromStr for CalendarView {
    type Err = ParseCalendarViewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "month" => Ok(CalendarView::Month),
            "week" => Ok(CalendarView::Week),
            "day" => Ok(CalendarView::Day),
            "list" => Ok(CalendarView::List),
            "custom" => Ok(CalendarView::Custom),
            _ => Err(ParseCalendarViewError(s.to_string())),
        }
    }
}

impl fmt::Display for CalendarView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarView::Month => write!(f, "month"),
            CalendarView::Week => write!(f, "week"),
            CalendarView::Day => write!(f, "day"),
            CalendarView::List => write!(f, "list"),
            CalendarView::Custom => write!(f, "custom"),
        }
    }
}

/// Half-open date window: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

/// A concrete view window plus the week-grid rows used for rendering.
/// `window` is `None` for the list view, which carries no date bounds.
///
/// All views start weeks on Sunday, including custom-range chunking. The
/// system this replaces chunked custom ranges Monday-first while rendering
/// month and week grids Sunday-first; the asymmetry looked incidental, so
/// one convention is used throughout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedView {
    pub window: Option<DateWindow>,
    pub weeks: Vec<Vec<NaiveDate>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Prev,
    Next,
}

/// Sunday on or before the given date.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 is valid for every month")
}

/// Converts a view request into a concrete window and week grid.
///
/// `custom` supplies the inclusive `[start, end]` range for
/// [`CalendarView::Custom`] and is ignored by the other views.
pub fn resolve(
    view: CalendarView,
    reference: NaiveDate,
    custom: Option<(NaiveDate, NaiveDate)>,
) -> Result<ResolvedView, CoreError> {
    match view {
        CalendarView::Month => {
            let start = first_of_month(reference);
            let end = start + Months::new(1);
            // Grid padded to full weeks so leading/trailing days of the
            // neighboring months render in place.
            let grid_start = week_start(start);
            let mut weeks = Vec::new();
            let mut day = grid_start;
            while day < end {
                let week: Vec<NaiveDate> = (0..7).map(|i| day + Duration::days(i)).collect();
                day += Duration::days(7);
                weeks.push(week);
            }
            Ok(ResolvedView {
                window: Some(DateWindow::new(start, end)),
                weeks,
            })
        }
        CalendarView::Week => {
            let start = week_start(reference);
            let end = start + Duration::days(7);
            let week: Vec<NaiveDate> = (0..7).map(|i| start + Duration::days(i)).collect();
            Ok(ResolvedView {
                window: Some(DateWindow::new(start, end)),
                weeks: vec![week],
            })
        }
        CalendarView::Day => Ok(ResolvedView {
            window: Some(DateWindow::new(reference, reference + Duration::days(1))),
            weeks: vec![vec![reference]],
        }),
        CalendarView::List => Ok(ResolvedView {
            window: None,
            weeks: Vec::new(),
        }),
        CalendarView::Custom => {
            let (start, last) = custom.ok_or_else(|| {
                CoreError::InvalidInput("custom view requires a date range".to_string())
            })?;
            if last < start {
                return Err(CoreError::InvalidInput(format!(
                    "custom range end {} precedes start {}",
                    last, start
                )));
            }
            let end = last + Duration::days(1);
            // Ragged chunking: the first and last rows may be short, new
            // rows open whenever the week rolls over.
            let mut weeks: Vec<Vec<NaiveDate>> = Vec::new();
            let mut day = start;
            while day < end {
                match weeks.last_mut() {
                    Some(week) if week_start(day) == week_start(week[0]) => week.push(day),
                    _ => weeks.push(vec![day]),
                }
                day += Duration::days(1);
            }
            Ok(ResolvedView {
                window: Some(DateWindow::new(start, end)),
                weeks,
            })
        }
    }
}

/// Shifts a view by one unit of its own size, returning the new reference
/// date and (for custom views) the shifted range. A 10-day custom range
/// pages forward or back by 10 days; the list view does not navigate.
pub fn step(
    view: CalendarView,
    reference: NaiveDate,
    custom: Option<(NaiveDate, NaiveDate)>,
    direction: NavDirection,
) -> (NaiveDate, Option<(NaiveDate, NaiveDate)>) {
    let sign = match direction {
        NavDirection::Prev => -1,
        NavDirection::Next => 1,
    };
    match view {
        CalendarView::Month => {
            let anchored = first_of_month(reference);
            let shifted = if sign > 0 {
                anchored + Months::new(1)
            } else {
                anchored - Months::new(1)
            };
            (shifted, custom)
        }
        CalendarView::Week => (reference + Duration::days(7 * sign), custom),
        CalendarView::Day => (reference + Duration::days(sign), custom),
        CalendarView::List => (reference, custom),
        CalendarView::Custom => match custom {
            Some((start, last)) => {
                let span = (last - start).num_days() + 1;
                let delta = Duration::days(span * sign);
                (reference + delta, Some((start + delta, last + delta)))
            }
            None => (reference, custom),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_view_spans_the_calendar_month() {
        let view = resolve(CalendarView::Month, date(2024, 1, 20), None).unwrap();
        let window = view.window.unwrap();
        assert_eq!(window.start, date(2024, 1, 1));
        assert_eq!(window.end, date(2024, 2, 1));
        // January 2024 starts on a Monday, so the grid opens on Sunday the
        // 31st of December and holds five rows.
        assert_eq!(view.weeks.len(), 5);
        assert_eq!(view.weeks[0][0], date(2023, 12, 31));
        assert!(view.weeks.iter().all(|w| w.len() == 7));
    }

    #[test]
    fn week_view_starts_on_sunday() {
        let view = resolve(CalendarView::Week, date(2024, 1, 17), None).unwrap();
        let window = view.window.unwrap();
        assert_eq!(window.start, date(2024, 1, 14));
        assert_eq!(window.end, date(2024, 1, 21));
        assert_eq!(view.weeks, vec![(0..7)
            .map(|i| date(2024, 1, 14) + Duration::days(i))
            .collect::<Vec<_>>()]);
    }

    #[test]
    fn day_view_is_a_single_day_window() {
        let view = resolve(CalendarView::Day, date(2024, 3, 5), None).unwrap();
        let window = view.window.unwrap();
        assert_eq!(window.len_days(), 1);
        assert!(window.contains(date(2024, 3, 5)));
        assert!(!window.contains(date(2024, 3, 6)));
    }

    #[test]
    fn list_view_has_no_window() {
        let view = resolve(CalendarView::List, date(2024, 3, 5), None).unwrap();
        assert!(view.window.is_none());
        assert!(view.weeks.is_empty());
    }

    #[test]
    fn custom_view_chunks_on_week_boundaries() {
        // Wed Jan 10 through Tue Jan 16: Wed-Sat, then Sun-Tue.
        let view = resolve(
            CalendarView::Custom,
            date(2024, 1, 10),
            Some((date(2024, 1, 10), date(2024, 1, 16))),
        )
        .unwrap();
        assert_eq!(view.weeks.len(), 2);
        assert_eq!(view.weeks[0].len(), 4);
        assert_eq!(view.weeks[1].len(), 3);
        assert_eq!(view.weeks[1][0], date(2024, 1, 14));
        assert_eq!(view.window.unwrap().end, date(2024, 1, 17));
    }

    #[test]
    fn custom_view_requires_an_ordered_range() {
        assert!(resolve(CalendarView::Custom, date(2024, 1, 1), None).is_err());
        assert!(resolve(
            CalendarView::Custom,
            date(2024, 1, 1),
            Some((date(2024, 1, 5), date(2024, 1, 1)))
        )
        .is_err());
    }

    #[test]
    fn month_navigation_moves_by_whole_months() {
        let (next, _) = step(CalendarView::Month, date(2024, 1, 31), None, NavDirection::Next);
        assert_eq!(next, date(2024, 2, 1));
        let (prev, _) = step(CalendarView::Month, date(2024, 3, 15), None, NavDirection::Prev);
        assert_eq!(prev, date(2024, 2, 1));
    }

    #[test]
    fn custom_navigation_pages_by_its_own_span() {
        let range = Some((date(2024, 1, 1), date(2024, 1, 10)));
        let (_, next) = step(CalendarView::Custom, date(2024, 1, 1), range, NavDirection::Next);
        assert_eq!(next, Some((date(2024, 1, 11), date(2024, 1, 20))));
        let (_, prev) = step(CalendarView::Custom, date(2024, 1, 1), range, NavDirection::Prev);
        assert_eq!(prev, Some((date(2023, 12, 22), date(2023, 12, 31))));
    }
}
