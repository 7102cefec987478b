use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::horaire::error::{HoraireError, Result};
use crate::horaire::io::ics;
use crate::horaire::materialize::{CalendarEvent, CalendarService};

/// Calendar store laid out on disk: one directory per calendar and one
/// `<uid>.ics` file per event.
#[derive(Debug, Clone)]
pub struct DirectoryCalendar {
    root: PathBuf,
    prodid: String,
}

impl DirectoryCalendar {
    pub fn new(root: impl Into<PathBuf>, prodid: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            prodid: prodid.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one calendar. Names that could escape the root are refused.
    pub fn calendar_dir(&self, calendar: &str) -> Result<PathBuf> {
        if calendar.is_empty()
            || calendar == "."
            || calendar == ".."
            || calendar.contains(['/', '\\'])
        {
            return Err(HoraireError::Calendar(format!(
                "invalid calendar name '{calendar}'"
            )));
        }
        Ok(self.root.join(calendar))
    }

    /// Paths of the events stored in `calendar`, sorted.
    pub fn event_files(&self, calendar: &str) -> Result<Vec<PathBuf>> {
        let dir = self.calendar_dir(calendar)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "ics") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

impl CalendarService for DirectoryCalendar {
    fn ensure_calendar(&mut self, calendar: &str) -> Result<()> {
        let dir = self.calendar_dir(calendar)?;
        if !dir.is_dir() {
            debug!(calendar, "creating calendar");
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    fn clear_calendar(&mut self, calendar: &str) -> Result<usize> {
        let files = self.event_files(calendar)?;
        for path in &files {
            fs::remove_file(path)?;
        }
        Ok(files.len())
    }

    fn save_event(&mut self, calendar: &str, event: &CalendarEvent) -> Result<()> {
        let dir = self.calendar_dir(calendar)?;
        if !dir.is_dir() {
            return Err(HoraireError::Calendar(format!(
                "calendar '{calendar}' does not exist"
            )));
        }
        let path = dir.join(format!("{}.ics", event.uid));
        ics::write_file(&path, std::slice::from_ref(event), &self.prodid)
    }
}
