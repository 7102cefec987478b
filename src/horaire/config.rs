//! Configuration loading.
//!
//! Settings come from an optional TOML file; every field has a default.
//! `HORAIRE_WORKSPACE` overrides the workspace root.

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::Deserialize;
use tracing::debug;

use crate::horaire::error::{HoraireError, Result};
use crate::horaire::parse::ParseOptions;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "HORAIRE_CONFIG";
/// Environment variable overriding the workspace root.
pub const WORKSPACE_ENV: &str = "HORAIRE_WORKSPACE";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace: WorkspaceConfig,
    pub timezones: TimezoneConfig,
    pub calendars: CalendarConfig,
    pub events: EventConfig,
    pub parser: ParserConfig,
}

/// Folder layout of the schedule workspace.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
    /// Workbooks waiting to be processed.
    pub prepared: String,
    /// Workbooks already processed.
    pub processed: String,
    /// iCalendar exports, one per workbook.
    pub ics: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            prepared: "2- Prepared".to_string(),
            processed: "3- Processed".to_string(),
            ics: "ics".to_string(),
        }
    }
}

impl WorkspaceConfig {
    pub fn prepared_dir(&self) -> PathBuf {
        self.root.join(&self.prepared)
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join(&self.processed)
    }

    pub fn ics_dir(&self) -> PathBuf {
        self.root.join(&self.ics)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// IANA name of the zone the schedule is written in.
    pub source: String,
    /// IANA name of the zone emitted instants are expressed in.
    pub output: String,
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            source: "America/Vancouver".to_string(),
            output: "UTC".to_string(),
        }
    }
}

/// Destination calendars.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Directory holding one sub directory per calendar.
    pub store: PathBuf,
    /// Calendar receiving everybody without a personal calendar.
    pub shared: String,
    /// Employee name → personal calendar.
    pub personal: BTreeMap<String, String>,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from("calendars"),
            shared: "gs-collegues".to_string(),
            personal: BTreeMap::new(),
        }
    }
}

impl CalendarConfig {
    /// Every calendar name the configuration refers to, shared first.
    pub fn names(&self) -> Vec<String> {
        let mut names = vec![self.shared.clone()];
        for name in self.personal.values() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Appended to every generated UID.
    pub uid_suffix: String,
    pub prodid: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            uid_suffix: "horaire".to_string(),
            prodid: "-//horaire//schedule//EN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Reject lunches that do not start inside the work block.
    pub strict_lunch: bool,
}

impl Config {
    /// Loads the configuration from `path`, from `HORAIRE_CONFIG` when no
    /// path is given, or falls back to defaults. The workspace override is
    /// applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(root) = env::var_os(WORKSPACE_ENV) {
            config.workspace.root = PathBuf::from(root);
        }
        debug!(workspace = %config.workspace.root.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(HoraireError::MissingInput(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolves the timezone names and parser switches.
    pub fn parse_options(&self) -> Result<ParseOptions> {
        Ok(ParseOptions {
            source_timezone: parse_timezone(&self.timezones.source)?,
            output_timezone: parse_timezone(&self.timezones.output)?,
            strict_lunch: self.parser.strict_lunch,
        })
    }
}

fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|err| HoraireError::Config(format!("unknown timezone '{name}': {err}")))
}
