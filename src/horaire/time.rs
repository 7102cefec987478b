//! Time token parsing and timezone resolution.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::horaire::error::CellErrorKind;

/// Tokens shorter than this carry an hour only (`9AM`, `12PM`).
const HOUR_ONLY_MAX_LEN: usize = 6;

/// Parses a compact time token such as `9AM` or `10:30PM`.
///
/// Tokens under six characters are read as `H AM/PM`, longer ones as
/// `H:MM AM/PM`. The meridiem is case-insensitive.
pub fn parse_time_token(token: &str) -> Result<NaiveTime, CellErrorKind> {
    let invalid = || CellErrorKind::TimeToken {
        token: token.to_string(),
    };

    let expanded = if token.len() < HOUR_ONLY_MAX_LEN {
        let split = token.len().checked_sub(2).ok_or_else(invalid)?;
        let (hour, meridiem) = match (token.get(..split), token.get(split..)) {
            (Some(hour), Some(meridiem)) if !hour.is_empty() => (hour, meridiem),
            _ => return Err(invalid()),
        };
        format!("{hour}:00{meridiem}")
    } else {
        token.to_string()
    };

    NaiveTime::parse_from_str(&expanded, "%I:%M%p").map_err(|_| invalid())
}

/// Resolves a wall-clock time on `date` in `zone`.
///
/// During a fall-back transition the earlier instant wins; times inside a
/// spring-forward gap do not exist and are rejected.
pub fn localize(zone: Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>, CellErrorKind> {
    let naive = date.and_time(time);
    match zone.from_local_datetime(&naive) {
        LocalResult::Single(instant) => Ok(instant),
        LocalResult::Ambiguous(earlier, _later) => Ok(earlier),
        LocalResult::None => Err(CellErrorKind::NonexistentLocalTime {
            local: format!("{naive} {zone}"),
        }),
    }
}
