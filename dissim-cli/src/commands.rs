//! CLI command implementations

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Subcommand};
use dissim_core::{
    ConfigError, DisseminationConfig, DisseminationStrategy, FollowerDivisionStrategy,
    LocalSplitStrategy, RunMode,
};
use dissim_sim::{EventLog, SimulationReport, reports, scenario_for};
use tracing::info;

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run a dissemination simulation and write the requested reports
    Run(RunArgs),
    /// Print the effective configuration as JSON
    Config(ConfigArgs),
}

/// Simulation parameters; unset flags fall back to the environment, the
/// configuration file, then the defaults.
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of clients
    #[arg(long)]
    clients: Option<usize>,
    /// Size of the content
    #[arg(long)]
    content_size: Option<f64>,
    /// Local split strategy (naive, switch_delay_corrected)
    #[arg(long)]
    local_split: Option<LocalSplitStrategy>,
    /// Run mode (normal, optimizing)
    #[arg(long)]
    mode: Option<RunMode>,
    /// Follower division strategy (naive, count_weighted, capacity_weighted)
    #[arg(long)]
    follower_division: Option<FollowerDivisionStrategy>,
    /// Number of channels including the source channel
    #[arg(long)]
    channels: Option<usize>,
    /// Capacity of every channel
    #[arg(long)]
    channel_capacity: Option<f64>,
    /// Time a new leader needs before it transmits
    #[arg(long)]
    activation_delay: Option<f64>,
    /// Desired branching factor
    #[arg(long)]
    branching_factor: Option<usize>,
    /// Dissemination strategy (sequential, concurrent)
    #[arg(long)]
    diss_strategy: Option<DisseminationStrategy>,
}

/// Arguments of `dissim run`
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Write receptions per channel to this file
    #[arg(long)]
    channel_report: Option<PathBuf>,
    /// Write backlog client receptions per channel to this file
    #[arg(long)]
    client_channel_report: Option<PathBuf>,
    /// Write leader count over time to this file
    #[arg(long)]
    leader_count_report: Option<PathBuf>,
    /// Write the bucketed reception CDF to this file
    #[arg(long)]
    bucketed_report: Option<PathBuf>,
    /// Bucket width of the reception CDF
    #[arg(long, default_value_t = 10.0)]
    bucket_width: f64,
    /// Write the full report as JSON to this file
    #[arg(long)]
    json_report: Option<PathBuf>,
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub fn handle_command(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run(args) => run_simulation(args),
        Commands::Config(args) => show_config(&args),
    }
}

impl ConfigArgs {
    /// Resolves the effective configuration from the process environment.
    ///
    /// # Errors
    /// - `ConfigError::Io` / `ConfigError::Parse` - Configuration file is unreadable
    /// - `ConfigError::InvalidParameter` / `ConfigError::UnknownStrategy` - A value is rejected
    pub fn resolve(&self) -> Result<DisseminationConfig, ConfigError> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    fn resolve_with<F>(&self, lookup: F) -> Result<DisseminationConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match &self.config {
            Some(path) => DisseminationConfig::from_json_file(path)?,
            None => DisseminationConfig::default(),
        };
        let mut config = base.with_overrides(lookup)?;

        if let Some(clients) = self.clients {
            config.client_count = clients;
        }
        if let Some(content_size) = self.content_size {
            config.content_size = content_size;
        }
        if let Some(local_split) = self.local_split {
            config.local_split = local_split;
        }
        if let Some(mode) = self.mode {
            config.run_mode = mode;
        }
        if let Some(follower_division) = self.follower_division {
            config.follower_division = follower_division;
        }
        if let Some(channels) = self.channels {
            config.channel_count = channels;
        }
        if let Some(channel_capacity) = self.channel_capacity {
            config.channel_capacity = channel_capacity;
        }
        if let Some(activation_delay) = self.activation_delay {
            config.activation_delay = activation_delay;
        }
        if let Some(branching_factor) = self.branching_factor {
            config.branching_factor = branching_factor;
        }
        if let Some(diss_strategy) = self.diss_strategy {
            config.dissemination = diss_strategy;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Print the effective configuration
///
/// # Errors
/// - `ConfigError` - Configuration cannot be resolved
pub fn show_config(args: &ConfigArgs) -> anyhow::Result<()> {
    let config = args.resolve()?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Run one simulation and write the requested reports
///
/// # Errors
/// - `ConfigError` - Configuration cannot be resolved
/// - `io::Error` - `--bucket-width` is not finite and positive
/// - `SimulationError` - The run failed
/// - `io::Error` - A report could not be written
pub fn run_simulation(args: RunArgs) -> anyhow::Result<()> {
    let config = args.config.resolve()?;
    reports::check_bucket_width(args.bucket_width).context("Invalid --bucket-width")?;
    info!(clients = config.client_count, "Starting {} run", config.run_mode);

    let started = std::time::Instant::now();
    let report = scenario_for(config)?.execute()?;
    info!(
        events = report.event_count,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Processed events"
    );

    print!("{}", report.summary());

    write_log_report(args.channel_report.as_deref(), &report.log, |log, out| {
        reports::write_receptions_per_channel(log, out)
    })?;
    write_log_report(
        args.client_channel_report.as_deref(),
        &report.log,
        |log, out| reports::write_client_receptions_per_channel(log, out),
    )?;
    write_log_report(args.leader_count_report.as_deref(), &report.log, |log, out| {
        reports::write_leader_count_over_time(log, out)
    })?;
    let bucket_width = args.bucket_width;
    write_log_report(args.bucketed_report.as_deref(), &report.log, |log, out| {
        reports::write_receptions_bucketed(log, bucket_width, out)
    })?;
    if let Some(path) = args.json_report.as_deref() {
        write_json(path, &report)?;
    }

    Ok(())
}

fn write_log_report<F>(path: Option<&Path>, log: &EventLog, render: F) -> anyhow::Result<()>
where
    F: FnOnce(&EventLog, &mut BufWriter<File>) -> io::Result<()>,
{
    let Some(path) = path else {
        return Ok(());
    };

    let mut out = create_report_file(path)?;
    render(log, &mut out).with_context(|| format!("Failed to write {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

fn write_json(path: &Path, report: &SimulationReport) -> anyhow::Result<()> {
    let mut out = create_report_file(path)?;
    reports::write_json_report(report, &mut out)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "JSON report written");
    Ok(())
}

fn create_report_file(path: &Path) -> anyhow::Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_flags_override_defaults() {
        let args = ConfigArgs {
            clients: Some(20),
            channel_capacity: Some(5.0),
            diss_strategy: Some(DisseminationStrategy::Concurrent),
            ..Default::default()
        };

        let config = args.resolve_with(no_env).unwrap();
        assert_eq!(config.client_count, 20);
        assert_eq!(config.channel_capacity, 5.0);
        assert_eq!(config.dissemination, DisseminationStrategy::Concurrent);
        assert_eq!(config.channel_count, 3);
    }

    #[test]
    fn test_flags_win_over_environment() {
        let env: HashMap<&str, &str> =
            HashMap::from([("DISSIM_CLIENTS", "40"), ("DISSIM_CHANNELS", "5")]);
        let args = ConfigArgs {
            clients: Some(20),
            ..Default::default()
        };

        let config = args
            .resolve_with(|key: &str| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.client_count, 20);
        assert_eq!(config.channel_count, 5);
    }

    #[test]
    fn test_config_file_is_base() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"client_count": 64, "branching_factor": 3}}"#).unwrap();

        let args = ConfigArgs {
            config: Some(file.path().to_path_buf()),
            branching_factor: Some(4),
            ..Default::default()
        };

        let config = args.resolve_with(no_env).unwrap();
        assert_eq!(config.client_count, 64);
        assert_eq!(config.branching_factor, 4);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let args = ConfigArgs {
            content_size: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            args.resolve_with(no_env),
            Err(ConfigError::InvalidParameter { name: "content_size", .. })
        ));
    }

    #[test]
    fn test_bad_bucket_width_fails_before_running() {
        let dir = tempfile::tempdir().unwrap();
        let channel_report = dir.path().join("channels.txt");

        for bucket_width in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let args = RunArgs {
                config: ConfigArgs::default(),
                channel_report: Some(channel_report.clone()),
                client_channel_report: None,
                leader_count_report: None,
                bucketed_report: None,
                bucket_width,
                json_report: None,
            };
            let error = run_simulation(args).unwrap_err();
            assert!(error.to_string().contains("--bucket-width"));
            assert!(!channel_report.exists());
        }
    }

    #[test]
    fn test_run_writes_reports() {
        let dir = tempfile::tempdir().unwrap();
        let channel_report = dir.path().join("channels.txt");
        let json_report = dir.path().join("report.json");

        let args = RunArgs {
            config: ConfigArgs {
                clients: Some(20),
                ..Default::default()
            },
            channel_report: Some(channel_report.clone()),
            client_channel_report: None,
            leader_count_report: None,
            bucketed_report: None,
            bucket_width: 10.0,
            json_report: Some(json_report.clone()),
        };
        run_simulation(args).unwrap();

        let text = std::fs::read_to_string(channel_report).unwrap();
        assert!(text.starts_with("# Total receptions per channel\n"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(json_report).unwrap()).unwrap();
        assert_eq!(json["log"]["receptions"].as_array().unwrap().len(), 20);
    }
}
