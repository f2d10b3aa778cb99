pub mod add;
pub mod delete;
pub mod done;
pub mod edit;
pub mod move_task;
pub mod preview;
pub mod view;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parses `YYYY-MM-DD`.
pub(crate) fn parse_date(input: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{}', expected YYYY-MM-DD", input))
}

/// Parses `YYYY-MM-DD HH:MM` or a bare date (midnight UTC).
pub(crate) fn parse_datetime(input: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    let date = parse_date(input).with_context(|| {
        format!(
            "invalid datetime '{}', expected YYYY-MM-DD or \"YYYY-MM-DD HH:MM\"",
            input
        )
    })?;
    Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_dates_parse_to_midnight() {
        let parsed = parse_datetime("2024-03-05").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T00:00:00+00:00");
    }

    #[test]
    fn datetimes_keep_their_time_of_day() {
        let parsed = parse_datetime("2024-03-05 14:30").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-05T14:30:00+00:00");
    }

    #[test]
    fn garbage_is_rejected_with_the_expected_format() {
        let err = parse_datetime("next tuesday").unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }
}
