use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::horaire::model::DayOfWeek;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, HoraireError>;

/// Error type covering the failures that stop a schedule from being read,
/// parsed, or published.
#[derive(Debug, Error)]
pub enum HoraireError {
    /// Wrapper for IO failures such as reading or moving files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the configuration file is not valid TOML.
    #[error("invalid configuration file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Raised when a workbook does not hold a usable schedule sheet.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the weekday columns do not line up with the employee column.
    #[error("invalid schedule table: {0}")]
    InvalidTable(String),

    /// An employee row was found before any date row in the same column.
    #[error("no date row precedes row {row} in column {day}")]
    MissingDateAnchor { day: DayOfWeek, row: usize },

    /// A date row holds something that is not a calendar date.
    #[error("date row {row} in column {day} holds '{value}', which is not a date")]
    InvalidDateMarker {
        day: DayOfWeek,
        row: usize,
        value: String,
    },

    /// Summary error returned when some cells could not be turned into shifts.
    #[error("{count} schedule cell(s) were rejected")]
    RejectedCells { count: usize },

    /// Summary error returned when some schedule files could not be processed.
    #[error("{count} schedule file(s) could not be processed")]
    FilesFailed { count: usize },

    /// Raised when a configuration value cannot be used.
    #[error("configuration error: {0}")]
    Config(String),

    /// Raised when the calendar backend refuses an operation.
    #[error("calendar error: {0}")]
    Calendar(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

/// Location and cause of a schedule cell that produced no shift.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{day} row {row} ({employee}): {kind} in cell '{raw}'")]
pub struct CellError {
    pub day: DayOfWeek,
    /// Zero-based row index within the table.
    pub row: usize,
    pub employee: String,
    /// Cell text as it appeared in the sheet.
    pub raw: String,
    pub kind: CellErrorKind,
}

/// Reasons a single cell is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellErrorKind {
    /// The normalised text is neither a sentinel nor 2-3 time tokens.
    Malformed { normalized: String },
    /// A time token is not `H AM/PM` or `H:MM AM/PM`.
    TimeToken { token: String },
    /// The local time falls into a daylight-saving gap.
    NonexistentLocalTime { local: String },
    /// Strict mode only: lunch does not start inside the work block.
    LunchOutsideShift { lunch: String },
}

impl fmt::Display for CellErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellErrorKind::Malformed { normalized } => {
                write!(f, "malformed hours '{normalized}'")
            }
            CellErrorKind::TimeToken { token } => write!(f, "unreadable time '{token}'"),
            CellErrorKind::NonexistentLocalTime { local } => {
                write!(f, "local time {local} does not exist")
            }
            CellErrorKind::LunchOutsideShift { lunch } => {
                write!(f, "lunch at {lunch} falls outside the shift")
            }
        }
    }
}
