//! Tracing setup for the `dissim` binary.
//!
//! The console shows run progress at the chosen level. Every run also leaves
//! a complete trace in `<logs_dir>/dissim-last-run.log`, including one line
//! per delivery, so a surprising report can be replayed event by event.

use std::fs::{File, create_dir_all};
use std::path::Path;

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Environment variable that replaces the console filter entirely.
pub const LOG_FILTER_ENV: &str = "DISSIM_LOG";

/// Name of the per-run trace file inside the logs directory.
pub const TRACE_FILE_NAME: &str = "dissim-last-run.log";

/// Crates whose events belong to a run.
const RUN_TARGETS: [&str; 3] = ["dissim", "dissim_core", "dissim_sim"];

/// Builds filter directives that show our crates at `level` and everything
/// else only from warnings up.
///
/// Deliveries log at `TRACE`, so any console level other than `Trace`
/// keeps them out of the terminal.
pub fn run_directives(level: Level) -> String {
    let level = level.as_str().to_lowercase();
    let mut directives = String::from("warn");
    for target in RUN_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Initializes console logging and the per-run trace file.
///
/// The console filter comes from `DISSIM_LOG` when set, otherwise from
/// `console_level`. The file always records our crates at `TRACE`. An
/// existing trace file is overwritten. `logs_dir` defaults to `./logs`.
///
/// # Errors
///
/// - `Box<dyn std::error::Error>` - Logs directory or trace file cannot be created
pub fn init_tracing(
    console_level: Level,
    logs_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let logs_path = logs_dir.unwrap_or_else(|| Path::new("logs"));
    create_dir_all(logs_path)?;
    let trace_path = logs_path.join(TRACE_FILE_NAME);
    let trace_file = File::create(&trace_path)?;

    let console_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(run_directives(console_level)));
    let console_layer = fmt::layer()
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(trace_file)
        .with_filter(EnvFilter::new(run_directives(Level::TRACE)));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::debug!(trace_file = %trace_path.display(), "Tracing initialized");
    Ok(())
}

/// Console verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliLogLevel {
    /// Fatal run errors only
    Error,
    /// Also unserved backlog and uncovered quotas
    Warn,
    /// Also run setup and summaries
    Info,
    /// Also every leader activation
    Debug,
    /// Also every delivery
    Trace,
}

impl CliLogLevel {
    /// Converts to the matching tracing level.
    pub fn as_tracing_level(self) -> Level {
        match self {
            CliLogLevel::Error => Level::ERROR,
            CliLogLevel::Warn => Level::WARN,
            CliLogLevel::Info => Level::INFO,
            CliLogLevel::Debug => Level::DEBUG,
            CliLogLevel::Trace => Level::TRACE,
        }
    }
}
