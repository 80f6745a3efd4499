use chrono::{NaiveDate, NaiveTime};

use crate::shared::types::DomainError;

/// Parse a wall-clock time of day as entered by a customer ("10:30", "14:00:00").
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime, DomainError> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| DomainError::MissingSchedule(format!("unreadable time '{}'", trimmed)))
}

/// Both halves of a schedule must be present before anything is reserved.
pub fn require_schedule(
    date: Option<NaiveDate>,
    time: Option<&str>,
) -> Result<(NaiveDate, NaiveTime), DomainError> {
    let date = date.ok_or_else(|| DomainError::MissingSchedule("no date selected".into()))?;
    let time = match time.map(str::trim) {
        Some(t) if !t.is_empty() => parse_time_of_day(t)?,
        _ => return Err(DomainError::MissingSchedule("no time selected".into())),
    };
    Ok((date, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::types::ErrorKind;

    #[test]
    fn parses_hours_and_minutes() {
        assert_eq!(
            parse_time_of_day("10:30").unwrap(),
            NaiveTime::from_hms_opt(10, 30, 0).unwrap()
        );
        assert_eq!(
            parse_time_of_day(" 14:00:15 ").unwrap(),
            NaiveTime::from_hms_opt(14, 0, 15).unwrap()
        );
    }

    #[test]
    fn garbage_time_is_a_missing_schedule() {
        let err = parse_time_of_day("half past ten").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingSchedule);
    }

    #[test]
    fn schedule_requires_date_and_time() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1);

        assert_eq!(require_schedule(None, Some("10:30")).unwrap_err().kind(), ErrorKind::MissingSchedule);
        assert_eq!(require_schedule(date, None).unwrap_err().kind(), ErrorKind::MissingSchedule);
        assert_eq!(require_schedule(date, Some("  ")).unwrap_err().kind(), ErrorKind::MissingSchedule);

        let (d, t) = require_schedule(date, Some("10:30")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(t, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
    }
}
