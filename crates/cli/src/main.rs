// collecteur CLI - check submitted medical acts against the act database

mod check;
mod exit_codes;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use collecteur_config::{ConfigError, Settings};
use collecteur_io::{ActeRepository, IoError};
use collecteur_recon::ReconError;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use exit_codes::{
    EXIT_DB_UNAVAILABLE, EXIT_ERROR, EXIT_INPUT_REJECTED, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "collecteur")]
#[command(about = "Reconcile submitted NGAP/CCAM acts against the act database")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/collecteur/settings.toml)
    #[arg(long, global = true, env = "COLLECTEUR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a submitted CSV against the database
    #[command(after_help = "\
Examples:
  collecteur check actes.csv
  collecteur check actes.csv --json | jq .result.total_missing
  collecteur check actes.csv --db /srv/actes.db --tolerance 5
  collecteur check actes.csv --export-missing ./exports/")]
    Check {
        /// Submitted file (';'-separated, 7 columns)
        file: PathBuf,

        /// Output JSON to stdout instead of only the human summary
        #[arg(long)]
        json: bool,

        /// Write the JSON response to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write missing acts as CSV (file path, or directory for a dated name)
        #[arg(long, value_name = "PATH")]
        export_missing: Option<PathBuf>,

        /// SQLite database (overrides database.path)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Date tolerance in minutes (overrides matching.date_tolerance_minutes)
        #[arg(long, value_name = "MINUTES")]
        tolerance: Option<u32>,

        /// Field separator (overrides csv.delimiter)
        #[arg(long)]
        delimiter: Option<char>,
    },

    /// Check a submitted CSV without touching the database
    #[command(after_help = "\
Examples:
  collecteur validate actes.csv
  collecteur validate actes.csv --json")]
    Validate {
        file: PathBuf,

        #[arg(long)]
        json: bool,

        /// Field separator (overrides csv.delimiter)
        #[arg(long)]
        delimiter: Option<char>,
    },

    /// Create the act tables in a SQLite file
    InitDb {
        path: PathBuf,
    },
}

impl Commands {
    fn wants_json(&self) -> bool {
        match self {
            Commands::Check { json, .. } | Commands::Validate { json, .. } => *json,
            Commands::InitDb { .. } => false,
        }
    }
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  collecteur-recon ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("TARGET"),
        "\ncontract_version(check): 1",
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let json = cli.command.wants_json();

    let result = load_settings(cli.config.as_deref()).and_then(|settings| {
        init_logging(&settings.logging.level);
        run(cli.command, settings)
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            if json {
                println!("{}", err.to_json());
            }
            if !err.message.is_empty() {
                eprintln!("error: {}", err.message);
            }
            if let Some(hint) = &err.hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(err.code)
        }
    }
}

fn run(command: Commands, settings: Settings) -> Result<u8, CliError> {
    match command {
        Commands::Check { file, json, output, export_missing, db, tolerance, delimiter } => {
            let args = check::CheckArgs { file, json, output, export_missing, db, tolerance, delimiter };
            check::cmd_check(args, settings)
        }
        Commands::Validate { file, json, delimiter } => check::cmd_validate(file, json, delimiter, settings),
        Commands::InitDb { path } => cmd_init_db(&path),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .map_err(CliError::from)
}

/// Logs go to stderr; stdout is reserved for `--json`. `RUST_LOG` wins over settings.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn cmd_init_db(path: &Path) -> Result<u8, CliError> {
    ActeRepository::create(path)?;
    eprintln!("schema ready in {}", path.display());
    Ok(EXIT_SUCCESS)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    /// Machine code echoed in the JSON error body.
    pub error_code: &'static str,
    pub message: String,
    pub hint: Option<String>,
    /// Extra numeric field for the JSON error body (`limit`, `max`).
    pub detail: Option<(&'static str, u64)>,
}

impl CliError {
    pub fn new(code: u8, error_code: &'static str, msg: impl Into<String>) -> Self {
        Self { code, error_code, message: msg.into(), hint: None, detail: None }
    }

    pub fn rejected(error_code: &'static str, msg: impl Into<String>) -> Self {
        Self::new(EXIT_INPUT_REJECTED, error_code, msg)
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, "CONFIG_INVALID", msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, "IO_ERROR", msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, "INTERNAL_ERROR", msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_detail(mut self, key: &'static str, value: u64) -> Self {
        self.detail = Some((key, value));
        self
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut error = json!({ "code": self.error_code, "message": self.message });
        if let Some((key, value)) = self.detail {
            error[key] = json!(value);
        }
        json!({ "error": error })
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        let message = err.to_string();
        match err {
            IoError::NotFound { .. } => CliError::rejected("NO_FILE", message),
            IoError::Empty { .. } => CliError::rejected("EMPTY_FILE", message),
            IoError::TooLarge { max, .. } => CliError::rejected("FILE_TOO_LARGE", message)
                .with_detail("max", max)
                .with_hint("raise limits.upload_max_size in the settings file"),
            IoError::InvalidExtension { .. } => CliError::rejected("INVALID_EXTENSION", message),
            IoError::InvalidContent { .. } => CliError::rejected("INVALID_CONTENT", message),
            IoError::Read { .. } | IoError::Write { .. } | IoError::Export { .. } => CliError::io(message),
            IoError::Database { .. } => CliError::new(EXIT_DB_UNAVAILABLE, "DB_UNAVAILABLE", message)
                .with_hint("check --db or database.path; `collecteur init-db` creates an empty database"),
        }
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let message = err.to_string();
        match err {
            ReconError::InvalidHeaders { .. } => CliError::rejected("INVALID_HEADERS", message)
                .with_hint("is the file ';'-separated? see --delimiter"),
            ReconError::Csv { .. } => CliError::rejected("INVALID_CONTENT", message),
            ReconError::ConfigParse(_) => CliError::usage(message),
            ReconError::SpecialStatus { .. } => CliError::new(EXIT_DB_UNAVAILABLE, "DB_UNAVAILABLE", message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::usage(err.to_string())
            .with_hint(format!("default settings path: {}", Settings::config_path().display()))
    }
}
