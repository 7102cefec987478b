use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use horaire::config::Config;
use horaire::io::calendar_dir::DirectoryCalendar;
use horaire::sync::{self, ExportFormat};
use horaire::{HoraireError, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| HoraireError::Logging(err.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    match cli.command {
        Command::Convert(args) => execute_convert(args, &config),
        Command::Sync(args) => {
            if let Some(workspace) = &args.workspace {
                config.workspace.root = workspace.clone();
            }
            if let Some(store) = &args.store {
                config.calendars.store = store.clone();
            }
            execute_sync(args, &config)
        }
    }
}

fn execute_convert(args: ConvertArgs, config: &Config) -> Result<()> {
    if !args.input.exists() {
        return Err(HoraireError::MissingInput(args.input));
    }
    let format = args.resolve_format();
    let report = sync::convert(&args.input, &args.output, format.into(), config)?;
    info!(
        intervals = report.intervals.len(),
        output = %args.output.display(),
        "schedule written"
    );
    for cell in &report.rejected {
        error!(%cell, "rejected cell");
    }
    if report.is_clean() {
        Ok(())
    } else {
        Err(HoraireError::RejectedCells {
            count: report.rejected.len(),
        })
    }
}

fn execute_sync(args: SyncArgs, config: &Config) -> Result<()> {
    let store_root = config.workspace.root.join(&config.calendars.store);
    let mut calendars = DirectoryCalendar::new(store_root, config.events.prodid.clone());
    let summary = sync::run(config, &mut calendars, !args.keep_existing)?;

    for failure in &summary.failed {
        error!(file = %failure.file.display(), reason = %failure.reason, "file not processed");
    }
    for rejected in &summary.rejected {
        error!(file = %rejected.file.display(), cell = %rejected.cell, "rejected cell");
    }
    for failure in &summary.delivery.failures {
        error!(
            calendar = %failure.calendar,
            summary = %failure.summary,
            reason = %failure.reason,
            "event not delivered"
        );
    }

    summary.outcome()
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Turn weekly schedule spreadsheets into calendar events."
)]
struct Cli {
    /// TOML configuration file. Defaults to $HORAIRE_CONFIG when set.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one schedule workbook into an iCalendar or JSON file.
    Convert(ConvertArgs),
    /// Process every workbook of the workspace and publish the events.
    Sync(SyncArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Schedule workbook (.xlsx).
    #[arg(long)]
    input: PathBuf,

    /// Output file path.
    #[arg(long)]
    output: PathBuf,

    /// Output format. Guessed from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(clap::Args)]
struct SyncArgs {
    /// Workspace root, overriding the configuration and $HORAIRE_WORKSPACE.
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Calendar store directory, relative to the workspace.
    #[arg(long)]
    store: Option<PathBuf>,

    /// Do not clear the calendars before publishing.
    #[arg(long)]
    keep_existing: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Ics,
    Json,
}

impl From<OutputFormat> for ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Ics => ExportFormat::Ics,
            OutputFormat::Json => ExportFormat::Json,
        }
    }
}

impl ConvertArgs {
    fn resolve_format(&self) -> OutputFormat {
        self.format.unwrap_or_else(|| {
            match self.output.extension().and_then(|ext| ext.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("json") => OutputFormat::Json,
                _ => OutputFormat::Ics,
            }
        })
    }
}
