use serde::Serialize;
use serde_json::Value;

use crate::horaire::error::Result;
use crate::horaire::model::{ShiftInterval, ShiftKind, ShiftSpan};

/// Flat, serialisable view of a [`ShiftInterval`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalRecord {
    pub employee: String,
    pub kind: ShiftKind,
    pub all_day: bool,
    /// ISO date for all-day intervals, RFC 3339 instant otherwise.
    pub start: String,
    pub end: String,
}

impl From<&ShiftInterval> for IntervalRecord {
    fn from(interval: &ShiftInterval) -> Self {
        let (start, end) = match interval.span {
            ShiftSpan::AllDay { start, end } => (start.to_string(), end.to_string()),
            ShiftSpan::Timed { start, end } => (start.to_rfc3339(), end.to_rfc3339()),
        };
        Self {
            employee: interval.employee.clone(),
            kind: interval.kind,
            all_day: interval.is_all_day(),
            start,
            end,
        }
    }
}

/// Converts intervals into a JSON array of [`IntervalRecord`]s.
pub fn intervals_to_json(intervals: &[ShiftInterval]) -> Result<Value> {
    let records: Vec<IntervalRecord> = intervals.iter().map(IntervalRecord::from).collect();
    Ok(serde_json::to_value(records)?)
}
