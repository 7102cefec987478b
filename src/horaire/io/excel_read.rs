use std::path::Path;

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::{debug, instrument};

use crate::horaire::error::{HoraireError, Result};
use crate::horaire::model::{DayOfWeek, ScheduleRow, ScheduleTable};

/// Reads the schedule held on the first worksheet of an xlsx workbook.
///
/// The sheet has no header row: column A names the employee and columns
/// B..H hold Sunday through Saturday. Date cells are rendered as ISO dates
/// so date rows can be recognised downstream.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn read_schedule(path: &Path) -> Result<ScheduleTable> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| HoraireError::InvalidWorkbook("workbook has no sheets".into()))?;
    let range = read_required_sheet(&mut workbook, &sheet)?;
    let table = range_to_table(&range);
    debug!(%sheet, rows = table.len(), "schedule sheet read");
    Ok(table)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| HoraireError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(HoraireError::from)?;
    Ok(range)
}

/// Converts a sheet range into a table. Cells are addressed by absolute
/// position because the range starts at the first non-empty cell, which is
/// not A1 when the date row leaves the employee cell blank.
fn range_to_table(range: &Range<DataType>) -> ScheduleTable {
    let Some((last_row, _)) = range.end() else {
        return ScheduleTable::default();
    };

    let rows = (0..=last_row).map(|row| {
        let cell = |col: u32| cell_to_string(range.get_value((row, col)));
        let mut cells: [String; 7] = Default::default();
        for day in DayOfWeek::ALL {
            cells[day.index()] = cell(day.index() as u32 + 1);
        }
        ScheduleRow {
            employee: cell(0),
            cells,
        }
    });
    ScheduleTable::from_rows(rows)
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.trim().to_string(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(date @ DataType::DateTime(_)) => date
            .as_date()
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| date.to_string()),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
