use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument, warn};

use crate::horaire::config::Config;
use crate::horaire::error::{CellError, HoraireError, Result};
use crate::horaire::io::{excel_read, ics, json};
use crate::horaire::materialize::{self, CalendarService, DeliveryReport};
use crate::horaire::parse::{ParseOptions, ScheduleReport, parse_schedule};

/// Output format of a single-file conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Ics,
    Json,
}

/// A schedule file that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: PathBuf,
    pub reason: String,
}

/// A rejected cell together with the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedCell {
    pub file: PathBuf,
    pub cell: CellError,
}

/// Result of a workspace run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub pruned: usize,
    pub processed: Vec<PathBuf>,
    pub failed: Vec<FileFailure>,
    pub intervals: usize,
    pub rejected: Vec<RejectedCell>,
    pub delivery: DeliveryReport,
}

impl SyncSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.rejected.is_empty() && self.delivery.failures.is_empty()
    }

    /// Turns the problems of a finished run into the error the CLI exits with.
    ///
    /// Failed files take precedence over undelivered events, which take
    /// precedence over rejected cells.
    pub fn outcome(&self) -> Result<()> {
        if !self.failed.is_empty() {
            return Err(HoraireError::FilesFailed {
                count: self.failed.len(),
            });
        }
        if !self.delivery.failures.is_empty() {
            return Err(HoraireError::Calendar(format!(
                "{} event(s) could not be delivered",
                self.delivery.failures.len()
            )));
        }
        if !self.rejected.is_empty() {
            return Err(HoraireError::RejectedCells {
                count: self.rejected.len(),
            });
        }
        Ok(())
    }
}

/// Reads and parses one schedule workbook.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<ScheduleReport> {
    if !path.exists() {
        return Err(HoraireError::MissingInput(path.to_path_buf()));
    }
    let table = excel_read::read_schedule(path)?;
    let report = parse_schedule(&table, options)?;
    info!(
        intervals = report.intervals.len(),
        rejected = report.rejected.len(),
        "schedule converted"
    );
    Ok(report)
}

/// Converts one workbook into an `.ics` or JSON file without publishing.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), output = %output.display(), ?format)
)]
pub fn convert(
    input: &Path,
    output: &Path,
    format: ExportFormat,
    config: &Config,
) -> Result<ScheduleReport> {
    let report = parse_file(input, &config.parse_options()?)?;
    match format {
        ExportFormat::Ics => {
            let events = materialize::build_events(&report.intervals, &config.events.uid_suffix);
            ics::write_file(output, &events, &config.events.prodid)?;
        }
        ExportFormat::Json => {
            let value = json::intervals_to_json(&report.intervals)?;
            fs::write(output, serde_json::to_string_pretty(&value)?)?;
        }
    }
    Ok(report)
}

/// Processes every workbook waiting in the prepared folder.
///
/// Each file is parsed, exported to the `ics` folder, archived into the
/// processed folder and published. A file that cannot be parsed stays in
/// the prepared folder so a later run can pick it up again.
#[instrument(level = "info", skip_all, fields(workspace = %config.workspace.root.display()))]
pub fn run(config: &Config, service: &mut dyn CalendarService, prune: bool) -> Result<SyncSummary> {
    let options = config.parse_options()?;
    let workspace = &config.workspace;
    fs::create_dir_all(workspace.processed_dir())?;
    fs::create_dir_all(workspace.ics_dir())?;

    let mut summary = SyncSummary::default();
    if prune {
        summary.pruned = materialize::prune(service, &config.calendars.names())?;
    }

    let files = list_workbooks(&workspace.prepared_dir())?;
    if files.is_empty() {
        info!("no schedule files to process");
        return Ok(summary);
    }

    for file in files {
        match process_file(&file, config, &options, service) {
            Ok((report, delivery)) => {
                summary.intervals += report.intervals.len();
                summary
                    .rejected
                    .extend(report.rejected.into_iter().map(|cell| RejectedCell {
                        file: file.clone(),
                        cell,
                    }));
                summary.delivery.merge(delivery);
                summary.processed.push(file);
            }
            Err(err) => {
                error!(file = %file.display(), error = %err, "schedule file failed");
                summary.failed.push(FileFailure {
                    file,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        processed = summary.processed.len(),
        failed = summary.failed.len(),
        rejected = summary.rejected.len(),
        "workspace synchronised"
    );
    Ok(summary)
}

fn process_file(
    file: &Path,
    config: &Config,
    options: &ParseOptions,
    service: &mut dyn CalendarService,
) -> Result<(ScheduleReport, DeliveryReport)> {
    let report = parse_file(file, options)?;
    for cell in &report.rejected {
        warn!(file = %file.display(), %cell, "cell skipped");
    }

    let events = materialize::build_events(&report.intervals, &config.events.uid_suffix);
    let ics_path = config
        .workspace
        .ics_dir()
        .join(file_name(file)?)
        .with_extension("ics");
    ics::write_file(&ics_path, &events, &config.events.prodid)?;

    let archived = config.workspace.processed_dir().join(file_name(file)?);
    fs::rename(file, &archived)?;

    let routed = materialize::route_events(events, &config.calendars);
    let delivery = materialize::publish(service, &routed);
    Ok((report, delivery))
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| HoraireError::InvalidWorkbook(format!("no file name in {}", path.display())))
}

/// Lists `.xlsx` files of `dir`, sorted by name. Office lock files are skipped.
fn list_workbooks(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(HoraireError::MissingInput(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_workbook = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        let is_lock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("~$"));
        if path.is_file() && is_workbook && !is_lock_file {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
