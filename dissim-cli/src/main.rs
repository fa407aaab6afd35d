//! Dissim CLI - Command-line interface
//!
//! Runs dissemination simulations and writes their reports.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use dissim_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "dissim")]
#[command(about = "Recursive channel-constrained content dissemination simulator")]
struct Cli {
    /// Console log level
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: CliLogLevel,

    /// Directory for the per-run trace file
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    commands::handle_command(cli.command)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dissim",
            "run",
            "--clients",
            "20",
            "--log-level",
            "debug",
            "--logs-dir",
            "/tmp/dissim-logs",
        ])
        .unwrap();

        assert!(matches!(cli.log_level, CliLogLevel::Debug));
        assert_eq!(cli.logs_dir, Some(PathBuf::from("/tmp/dissim-logs")));
        assert!(matches!(cli.command, commands::Commands::Run(_)));
    }
}
