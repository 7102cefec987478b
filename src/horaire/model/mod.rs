use std::fmt;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

use crate::horaire::error::{HoraireError, Result};

/// Weekday columns of a schedule sheet, in sheet order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DayOfWeek {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl DayOfWeek {
    /// All weekdays in the order the sheet lays them out.
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Sun,
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
        DayOfWeek::Sat,
    ];

    /// Position of the weekday among the seven day columns.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DayOfWeek::Sun => "sun",
            DayOfWeek::Mon => "mon",
            DayOfWeek::Tue => "tue",
            DayOfWeek::Wed => "wed",
            DayOfWeek::Thu => "thu",
            DayOfWeek::Fri => "fri",
            DayOfWeek::Sat => "sat",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One spreadsheet row: the employee cell followed by the seven day cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleRow {
    pub employee: String,
    pub cells: [String; 7],
}

impl ScheduleRow {
    pub fn new(employee: impl Into<String>, cells: [&str; 7]) -> Self {
        Self {
            employee: employee.into(),
            cells: cells.map(str::to_string),
        }
    }

    /// Builds a date row: empty employee cell, one date per weekday column.
    pub fn dates(dates: [&str; 7]) -> Self {
        Self::new(String::new(), dates)
    }
}

/// Column-oriented view of a weekly schedule sheet.
///
/// Every weekday column holds exactly one cell per entry of the employee
/// column. Rows with an empty employee cell are date rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleTable {
    employees: Vec<String>,
    days: [Vec<String>; 7],
}

impl ScheduleTable {
    /// Creates a table from its columns, checking that they all have the
    /// same length as the employee column.
    pub fn new(employees: Vec<String>, days: [Vec<String>; 7]) -> Result<Self> {
        for day in DayOfWeek::ALL {
            let column = &days[day.index()];
            if column.len() != employees.len() {
                return Err(HoraireError::InvalidTable(format!(
                    "column {day} has {} cells but there are {} employee cells",
                    column.len(),
                    employees.len()
                )));
            }
        }
        Ok(Self { employees, days })
    }

    /// Creates a table from rows. Rows always fill every column, so this
    /// cannot break the column length invariant.
    pub fn from_rows(rows: impl IntoIterator<Item = ScheduleRow>) -> Self {
        let mut table = Self::default();
        for row in rows {
            table.employees.push(row.employee);
            for (column, cell) in table.days.iter_mut().zip(row.cells) {
                column.push(cell);
            }
        }
        table
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn employees(&self) -> &[String] {
        &self.employees
    }

    pub fn column(&self, day: DayOfWeek) -> &[String] {
        &self.days[day.index()]
    }

    /// Iterates `(row index, employee, cell)` for one weekday column.
    pub fn cells(&self, day: DayOfWeek) -> impl Iterator<Item = (usize, &str, &str)> {
        self.employees
            .iter()
            .zip(self.column(day))
            .enumerate()
            .map(|(row, (employee, cell))| (row, employee.as_str(), cell.as_str()))
    }
}

/// Time tokens of a cell describing a shift, e.g. `9AM`, `5PM`, `12PM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRange {
    pub start: String,
    pub end: String,
    /// Start of the 30 minute lunch break, when the cell names one.
    pub lunch: Option<String>,
}

/// A schedule cell after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedHours {
    Off,
    Vacation,
    Range(TimeRange),
}

/// What a shift interval represents on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftKind {
    Work,
    Lunch,
    Off,
    Vacation,
}

impl ShiftKind {
    /// Calendar summary used for an employee's event of this kind.
    pub fn summary(self, employee: &str) -> String {
        match self {
            ShiftKind::Work => format!("<> {employee}"),
            ShiftKind::Lunch => format!("-- {employee}"),
            ShiftKind::Off => format!("Off {employee}"),
            ShiftKind::Vacation => format!("Vacation {employee}"),
        }
    }
}

/// Time covered by an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftSpan {
    /// Whole days; `end` is exclusive.
    AllDay { start: NaiveDate, end: NaiveDate },
    /// Absolute instants expressed in the output timezone.
    Timed {
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    },
}

/// A block of time produced from one schedule cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftInterval {
    pub employee: String,
    pub kind: ShiftKind,
    pub span: ShiftSpan,
}

impl ShiftInterval {
    pub fn all_day(employee: &str, kind: ShiftKind, day: NaiveDate) -> Self {
        Self {
            employee: employee.to_string(),
            kind,
            span: ShiftSpan::AllDay {
                start: day,
                end: day + chrono::Duration::days(1),
            },
        }
    }

    pub fn timed(employee: &str, kind: ShiftKind, start: DateTime<Tz>, end: DateTime<Tz>) -> Self {
        Self {
            employee: employee.to_string(),
            kind,
            span: ShiftSpan::Timed { start, end },
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self.span, ShiftSpan::AllDay { .. })
    }

    pub fn summary(&self) -> String {
        self.kind.summary(&self.employee)
    }
}
