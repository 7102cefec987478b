//! Walks a [`ScheduleTable`] and produces [`ShiftInterval`]s.

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::{debug, instrument, warn};

use crate::horaire::error::{CellError, CellErrorKind, HoraireError, Result};
use crate::horaire::model::{
    DayOfWeek, NormalizedHours, ScheduleTable, ShiftInterval, ShiftKind, TimeRange,
};
use crate::horaire::normalize::normalize_hours;
use crate::horaire::time::{localize, parse_time_token};

/// Lunch breaks always last this long.
pub const LUNCH_DURATION_MINUTES: i64 = 30;

/// Settings that shape how cells become intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParseOptions {
    /// Zone in which shift times are written.
    pub source_timezone: Tz,
    /// Zone of the emitted instants.
    pub output_timezone: Tz,
    /// Reject lunches that do not start inside the work block.
    ///
    /// In this mode a lunch written before the start of an overnight shift
    /// (`10PM - 6AM LUNCH:2AM`) is read as falling after midnight.
    pub strict_lunch: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            source_timezone: chrono_tz::America::Vancouver,
            output_timezone: chrono_tz::UTC,
            strict_lunch: false,
        }
    }
}

/// Outcome of parsing a whole table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleReport {
    /// Intervals in weekday order, then row order.
    pub intervals: Vec<ShiftInterval>,
    /// Cells that could not be turned into intervals.
    pub rejected: Vec<CellError>,
}

impl ScheduleReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Parses every weekday column of `table`.
///
/// Cell-level problems are collected in the report. A missing or invalid
/// date row aborts the whole table because no later cell of that column
/// can be placed on the calendar.
#[instrument(level = "debug", skip_all, fields(rows = table.len()))]
pub fn parse_schedule(table: &ScheduleTable, options: &ParseOptions) -> Result<ScheduleReport> {
    let mut report = ScheduleReport::default();
    for day in DayOfWeek::ALL {
        parse_column(table, day, options, &mut report)?;
    }
    debug!(
        intervals = report.intervals.len(),
        rejected = report.rejected.len(),
        "schedule parsed"
    );
    Ok(report)
}

fn parse_column(
    table: &ScheduleTable,
    day: DayOfWeek,
    options: &ParseOptions,
    report: &mut ScheduleReport,
) -> Result<()> {
    table
        .cells(day)
        .try_fold(None, |anchor, (row, employee, cell)| -> Result<Option<NaiveDate>> {
            let cell = cell.trim();
            if cell.is_empty() {
                return Ok(anchor);
            }

            let employee = employee.trim();
            if employee.is_empty() {
                let date = parse_date_marker(cell).ok_or_else(|| HoraireError::InvalidDateMarker {
                    day,
                    row,
                    value: cell.to_string(),
                })?;
                debug!(%day, row, %date, "date anchor set");
                return Ok(Some(date));
            }

            let date = anchor.ok_or(HoraireError::MissingDateAnchor { day, row })?;
            match cell_intervals(employee, date, cell, options) {
                Ok(intervals) => report.intervals.extend(intervals),
                Err(kind) => {
                    let error = CellError {
                        day,
                        row,
                        employee: employee.to_string(),
                        raw: cell.to_string(),
                        kind,
                    };
                    warn!(%error, "schedule cell rejected");
                    report.rejected.push(error);
                }
            }
            Ok(anchor)
        })
        .map(|_| ())
}

/// Reads the value of a date row, e.g. `2024-06-02` or `2024-06-02 00:00:00`.
///
/// Text after the date is only allowed as a time part, separated by a space
/// or `T`.
pub fn parse_date_marker(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let (date_part, rest) = match value.get(..10) {
        Some(date_part) => (date_part, &value[10..]),
        None => (value, ""),
    };
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('T')) {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Builds the intervals described by one non-blank cell.
pub fn cell_intervals(
    employee: &str,
    date: NaiveDate,
    cell: &str,
    options: &ParseOptions,
) -> std::result::Result<Vec<ShiftInterval>, CellErrorKind> {
    let hours = normalize_hours(cell)?;
    build_intervals(employee, date, &hours, options)
}

/// Turns normalised hours for `date` into intervals.
pub fn build_intervals(
    employee: &str,
    date: NaiveDate,
    hours: &NormalizedHours,
    options: &ParseOptions,
) -> std::result::Result<Vec<ShiftInterval>, CellErrorKind> {
    match hours {
        NormalizedHours::Off => Ok(vec![ShiftInterval::all_day(employee, ShiftKind::Off, date)]),
        NormalizedHours::Vacation => Ok(vec![ShiftInterval::all_day(
            employee,
            ShiftKind::Vacation,
            date,
        )]),
        NormalizedHours::Range(range) => time_range_intervals(employee, date, range, options),
    }
}

fn time_range_intervals(
    employee: &str,
    date: NaiveDate,
    range: &TimeRange,
    options: &ParseOptions,
) -> std::result::Result<Vec<ShiftInterval>, CellErrorKind> {
    let zone = options.source_timezone;
    let start_time = parse_time_token(&range.start)?;
    let end_time = parse_time_token(&range.end)?;

    let start = localize(zone, date, start_time)?;
    let mut end = localize(zone, date, end_time)?;
    let overnight = end <= start;
    if overnight {
        // Overnight: the shift ends on the next calendar day.
        end = localize(zone, date + Duration::days(1), end_time)?;
    }

    let output = options.output_timezone;
    let mut intervals = vec![ShiftInterval::timed(
        employee,
        ShiftKind::Work,
        start.with_timezone(&output),
        end.with_timezone(&output),
    )];

    if let Some(token) = &range.lunch {
        let lunch_time = parse_time_token(token)?;
        let mut lunch_start = localize(zone, date, lunch_time)?;
        if options.strict_lunch && overnight && lunch_start < start {
            lunch_start = localize(zone, date + Duration::days(1), lunch_time)?;
        }
        if options.strict_lunch && !(start <= lunch_start && lunch_start < end) {
            return Err(CellErrorKind::LunchOutsideShift {
                lunch: token.clone(),
            });
        }
        let lunch_end = lunch_start + Duration::minutes(LUNCH_DURATION_MINUTES);
        intervals.push(ShiftInterval::timed(
            employee,
            ShiftKind::Lunch,
            lunch_start.with_timezone(&output),
            lunch_end.with_timezone(&output),
        ));
    }

    Ok(intervals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_marker_accepts_iso_dates_with_time_part() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 2);
        assert_eq!(parse_date_marker("2024-06-02"), expected);
        assert_eq!(parse_date_marker("2024-06-02 00:00:00"), expected);
        assert_eq!(parse_date_marker("2024-06-02T00:00:00"), expected);
        assert_eq!(parse_date_marker("Sunday"), None);
        assert_eq!(parse_date_marker("9AM - 5PM"), None);
    }

    #[test]
    fn date_marker_rejects_trailing_text() {
        assert_eq!(parse_date_marker("2024-06-021"), None);
        assert_eq!(parse_date_marker("2024-06-02junk"), None);
        assert_eq!(parse_date_marker("2024-06-02-03"), None);
    }
}
