use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::CoreError;

/// Hard cap on occurrences walked for a single window. Keeps an unbounded
/// rule from spinning when a caller asks for a window far past the anchor.
const MAX_OCCURRENCES_PER_WALK: u32 = 10_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

/// When a series stops producing occurrences.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EndCondition {
    Never,
    /// Total number of occurrences, counting the anchor itself.
    AfterCount(u32),
    /// Last date (inclusive) on which an occurrence may fall.
    UntilDate(NaiveDate),
}

/// How a series repeats. Pure data; validation is the only behavior that
/// lives here besides date generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub end: EndCondition,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, interval: u32, end: EndCondition) -> Self {
        Self {
            frequency,
            interval,
            end,
        }
    }

    /// Validates the rule against the series anchor date.
    pub fn validate(&self, anchor: NaiveDate) -> Result<(), CoreError> {
        if self.interval == 0 {
            return Err(CoreError::InvalidRecurrenceRule(
                "interval must be at least 1".to_string(),
            ));
        }
        match self.end {
            EndCondition::AfterCount(0) => Err(CoreError::InvalidRecurrenceRule(
                "occurrence count must be at least 1".to_string(),
            )),
            EndCondition::UntilDate(until) if until < anchor => {
                Err(CoreError::InvalidRecurrenceRule(format!(
                    "end date {} precedes the first occurrence {}",
                    until, anchor
                )))
            }
            _ => Ok(()),
        }
    }

    /// Date of the occurrence at `index` (0 = the anchor), ignoring the end
    /// condition. Monthly and yearly steps clamp to the last valid day of a
    /// short month, always measured from the anchor's own day-of-month so a
    /// series on the 31st returns to the 31st after February.
    pub fn occurrence_date(&self, anchor: NaiveDate, index: u32) -> Option<NaiveDate> {
        let steps = index.checked_mul(self.interval)?;
        match self.frequency {
            Frequency::Daily => anchor.checked_add_signed(Duration::days(i64::from(steps))),
            Frequency::Weekly => anchor.checked_add_signed(Duration::weeks(i64::from(steps))),
            Frequency::Monthly => anchor.checked_add_months(Months::new(steps)),
            Frequency::Yearly => anchor.checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }

    /// True if `index` falls past the rule's end condition.
    fn index_ended(&self, anchor: NaiveDate, index: u32) -> bool {
        match self.end {
            EndCondition::Never => false,
            EndCondition::AfterCount(n) => index >= n,
            EndCondition::UntilDate(until) => match self.occurrence_date(anchor, index) {
                Some(date) => date > until,
                None => true,
            },
        }
    }

    /// Iterator over `(sequence_index, date)` pairs from the anchor forward,
    /// honoring the end condition.
    pub fn occurrences(&self, anchor: NaiveDate) -> Occurrences {
        Occurrences {
            rule: *self,
            anchor,
            index: 0,
        }
    }

    /// Occurrences whose date falls in `[start, end)`.
    ///
    /// A window so far past the anchor that reaching its end would step
    /// through more than the walk cap is rejected instead of silently
    /// truncated.
    pub fn occurrences_between(
        &self,
        anchor: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(u32, NaiveDate)>, CoreError> {
        let mut hits = Vec::new();
        for (index, date) in self.occurrences(anchor) {
            if date >= end {
                break;
            }
            if index >= MAX_OCCURRENCES_PER_WALK {
                return Err(CoreError::InvalidInput(format!(
                    "window [{}, {}) lies more than {} occurrences past the anchor {}",
                    start, end, MAX_OCCURRENCES_PER_WALK, anchor
                )));
            }
            if date >= start {
                hits.push((index, date));
            }
        }
        Ok(hits)
    }

    /// True if the series produces no occurrence at or after `date`.
    pub fn ends_before(&self, anchor: NaiveDate, date: NaiveDate) -> bool {
        match self.end {
            EndCondition::Never => false,
            EndCondition::AfterCount(n) => match n
                .checked_sub(1)
                .and_then(|last| self.occurrence_date(anchor, last))
            {
                Some(last_date) => last_date < date,
                None => false,
            },
            EndCondition::UntilDate(until) => until < date,
        }
    }

    /// The rule an old master keeps after a this-and-future split: same
    /// shape, ending the day before the split date.
    pub fn truncated_before(&self, split: NaiveDate) -> RecurrenceRule {
        RecurrenceRule {
            end: EndCondition::UntilDate(split.pred_opt().unwrap_or(split)),
            ..*self
        }
    }

    /// The rule a new master starts with at a split, after `consumed`
    /// occurrences stayed behind with the old master.
    pub fn remainder_after(&self, consumed: u32) -> RecurrenceRule {
        let end = match self.end {
            EndCondition::AfterCount(n) => EndCondition::AfterCount(n.saturating_sub(consumed).max(1)),
            other => other,
        };
        RecurrenceRule { end, ..*self }
    }
}

/// Iterator produced by [`RecurrenceRule::occurrences`].
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    anchor: NaiveDate,
    index: u32,
}

impl Iterator for Occurrences {
    type Item = (u32, NaiveDate);

    fn next(&mut self) -> Option<Self::Item> {
        if self.rule.index_ended(self.anchor, self.index) {
            return None;
        }
        let date = self.rule.occurrence_date(self.anchor, self.index)?;
        let index = self.index;
        self.index = self.index.checked_add(1)?;
        Some((index, date))
    }
}

/// Re-attaches the anchor's time-of-day to a generated occurrence date.
pub fn occurrence_datetime(anchor: DateTime<Utc>, date: NaiveDate) -> DateTime<Utc> {
    date.and_time(anchor.time()).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(frequency: Frequency, interval: u32, end: EndCondition) -> RecurrenceRule {
        RecurrenceRule::new(frequency, interval, end)
    }

    #[test]
    fn zero_interval_is_rejected() {
        let r = rule(Frequency::Daily, 0, EndCondition::Never);
        assert!(matches!(
            r.validate(date(2024, 1, 1)),
            Err(CoreError::InvalidRecurrenceRule(_))
        ));
    }

    #[test]
    fn until_before_anchor_is_rejected() {
        let r = rule(
            Frequency::Weekly,
            1,
            EndCondition::UntilDate(date(2023, 12, 31)),
        );
        assert!(r.validate(date(2024, 1, 1)).is_err());
    }

    #[test]
    fn weekly_series_covers_january() {
        let r = rule(Frequency::Weekly, 1, EndCondition::Never);
        let dates: Vec<NaiveDate> = r
            .occurrences_between(date(2024, 1, 1), date(2024, 1, 1), date(2024, 2, 1))
            .unwrap()
            .into_iter()
            .map(|(_, d)| d)
            .collect();
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22),
                date(2024, 1, 29),
            ]
        );
    }

    #[rstest]
    #[case(date(2024, 1, 31), 1, date(2024, 2, 29))] // leap year clamp
    #[case(date(2023, 1, 31), 1, date(2023, 2, 28))]
    #[case(date(2024, 1, 31), 2, date(2024, 3, 31))] // back to the 31st
    #[case(date(2024, 1, 31), 3, date(2024, 4, 30))]
    fn monthly_clamps_to_short_months(
        #[case] anchor: NaiveDate,
        #[case] index: u32,
        #[case] expected: NaiveDate,
    ) {
        let r = rule(Frequency::Monthly, 1, EndCondition::Never);
        assert_eq!(r.occurrence_date(anchor, index), Some(expected));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let r = rule(Frequency::Yearly, 1, EndCondition::Never);
        assert_eq!(
            r.occurrence_date(date(2024, 2, 29), 1),
            Some(date(2025, 2, 28))
        );
        assert_eq!(
            r.occurrence_date(date(2024, 2, 29), 4),
            Some(date(2028, 2, 29))
        );
    }

    #[test]
    fn after_count_includes_the_anchor() {
        let r = rule(Frequency::Daily, 1, EndCondition::AfterCount(3));
        let all: Vec<_> = r.occurrences(date(2024, 1, 1)).collect();
        assert_eq!(
            all,
            vec![
                (0, date(2024, 1, 1)),
                (1, date(2024, 1, 2)),
                (2, date(2024, 1, 3)),
            ]
        );
    }

    #[test]
    fn until_date_is_inclusive() {
        let r = rule(
            Frequency::Daily,
            2,
            EndCondition::UntilDate(date(2024, 1, 5)),
        );
        let dates: Vec<_> = r.occurrences(date(2024, 1, 1)).map(|(_, d)| d).collect();
        assert_eq!(
            dates,
            vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 5)]
        );
    }

    #[test]
    fn truncation_ends_the_day_before_the_split() {
        let r = rule(Frequency::Weekly, 1, EndCondition::Never);
        let truncated = r.truncated_before(date(2024, 1, 15));
        assert_eq!(truncated.end, EndCondition::UntilDate(date(2024, 1, 14)));
        let dates: Vec<_> = truncated
            .occurrences(date(2024, 1, 1))
            .map(|(_, d)| d)
            .collect();
        assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 8)]);
    }

    #[test]
    fn remainder_reduces_count_by_consumed_occurrences() {
        let r = rule(Frequency::Weekly, 1, EndCondition::AfterCount(5));
        let remainder = r.remainder_after(2);
        assert_eq!(remainder.end, EndCondition::AfterCount(3));

        let unbounded = rule(Frequency::Weekly, 1, EndCondition::Never).remainder_after(2);
        assert_eq!(unbounded.end, EndCondition::Never);
    }

    #[test]
    fn ends_before_respects_each_end_condition() {
        let counted = rule(Frequency::Weekly, 1, EndCondition::AfterCount(2));
        assert!(counted.ends_before(date(2024, 1, 1), date(2024, 1, 9)));
        assert!(!counted.ends_before(date(2024, 1, 1), date(2024, 1, 8)));

        let until = rule(
            Frequency::Daily,
            1,
            EndCondition::UntilDate(date(2024, 1, 10)),
        );
        assert!(until.ends_before(date(2024, 1, 1), date(2024, 1, 11)));

        let never = rule(Frequency::Daily, 1, EndCondition::Never);
        assert!(!never.ends_before(date(2024, 1, 1), date(2034, 1, 1)));
    }

    #[test]
    fn windows_far_past_the_anchor_are_rejected() {
        let r = rule(Frequency::Daily, 1, EndCondition::Never);
        // Reaching 2060 from 2024 takes ~13k daily steps, past the walk cap.
        let result = r.occurrences_between(date(2024, 1, 1), date(2060, 1, 1), date(2060, 2, 1));
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));

        // The same rule over a nearby window still answers.
        let nearby = r
            .occurrences_between(date(2024, 1, 1), date(2024, 1, 1), date(2024, 1, 4))
            .unwrap();
        assert_eq!(nearby.len(), 3);
    }

    #[test]
    fn generation_is_deterministic() {
        use proptest::prelude::*;

        proptest!(|(interval in 1u32..6, offset in 0i64..3650, count in 1u32..50)| {
            let anchor = date(2020, 1, 1) + Duration::days(offset);
            let r = rule(Frequency::Daily, interval, EndCondition::AfterCount(count));
            let first: Vec<_> = r.occurrences(anchor).collect();
            let second: Vec<_> = r.occurrences(anchor).collect();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.len(), count as usize);
            // Indices are dense and dates strictly increasing.
            for (i, window) in first.windows(2).enumerate() {
                prop_assert_eq!(window[0].0, i as u32);
                prop_assert!(window[0].1 < window[1].1);
            }
        });
    }
}
