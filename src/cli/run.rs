//! Top-level CLI and the `run` command

use crate::clock::SystemClock;
use crate::config::defaults::DEFAULT_CONFIG_FILE;
use crate::config::{AppConfig, ConfigOverrides, RunMode};
use crate::fetcher::ComplianceHttpClient;
use crate::metrics;
use crate::output::OutputStore;
use crate::poller::{FetchCycle, RunSummary, Scheduler};
use crate::resume::CheckpointStore;
use crate::shutdown::SharedShutdown;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{CheckArgs, CliError};

/// Compliance endpoint poller CLI
#[derive(Parser, Debug)]
#[command(name = "compliance-poller")]
#[command(about = "Poll the compliance endpoint over sliding UTC windows", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(short, long, global = true, env = "COMPLIANCE_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output format (json or human)
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

impl Cli {
    /// Load and validate the configuration file with this invocation's overrides
    pub fn load_config(&self) -> Result<AppConfig, CliError> {
        let overrides = self.command.overrides().to_overrides();
        Ok(AppConfig::load(&self.config, &overrides)?)
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the endpoint
    Run(RunArgs),

    /// Show the first window without requesting anything
    Check(CheckArgs),
}

impl Commands {
    /// Configuration overrides carried by the command
    pub fn overrides(&self) -> &OverrideArgs {
        match self {
            Commands::Run(args) => &args.overrides,
            Commands::Check(args) => &args.overrides,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Values that replace the configuration file's
#[derive(Args, Debug, Clone, Default)]
pub struct OverrideArgs {
    /// First window start: YYYYMMDDHHmm, "YYYY-MM-DD HH:MM", ISO 8601, an
    /// offset such as 90m, 24h or 2d, or "file" to resume from the checkpoint
    #[arg(short, long)]
    pub start_time: Option<String>,

    /// Explicit end; fetches a single window
    #[arg(short, long)]
    pub end_time: Option<String>,

    /// Output root directory
    #[arg(short, long = "outbox")]
    pub out_box: Option<PathBuf>,

    /// one_time or real-time
    #[arg(long)]
    pub run_mode: Option<RunMode>,
}

impl OverrideArgs {
    /// As configuration overrides
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            start_time: self.start_time.clone(),
            end_time: self.end_time.clone(),
            out_box: self.out_box.clone(),
            run_mode: self.run_mode,
        }
    }
}

/// `run` arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Configuration overrides
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Delete the checkpoint file before starting
    #[arg(long, default_value_t = false)]
    pub reset_checkpoint: bool,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl RunArgs {
    /// Run the poller until its windows are done or shutdown is requested
    pub async fn execute(
        &self,
        config: &AppConfig,
        format: OutputFormat,
        shutdown: SharedShutdown,
    ) -> Result<RunSummary, CliError> {
        if let Some(addr) = self.metrics_addr {
            metrics::init_metrics(addr).map_err(CliError::MetricsError)?;
        }

        let checkpoints = CheckpointStore::new(&config.checkpoint_file);
        if self.reset_checkpoint {
            checkpoints.clear()?;
        }

        let client = ComplianceHttpClient::new(&config.endpoint, config.credentials.clone())?;
        info!(
            url = client.url(),
            account = %config.credentials.account_name,
            out_box = %config.out_box.display(),
            "Compliance poller starting"
        );

        let cycle = FetchCycle::new(
            Arc::new(client),
            OutputStore::new(&config.out_box),
            config.filters.clone(),
        );
        let mut scheduler = Scheduler::new(
            config.run.clone(),
            cycle,
            checkpoints,
            SystemClock::shared(),
        )
        .with_shutdown(shutdown);

        let summary = scheduler.run().await?;
        print_summary(&summary, format)?;
        Ok(summary)
    }
}

fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "windows_attempted": summary.windows_attempted,
                "windows_succeeded": summary.windows_succeeded,
                "last_window": summary.last_window.map(|w| serde_json::json!({
                    "from_date": w.from_date(),
                    "to_date": w.to_date(),
                })),
            });
            let rendered = serde_json::to_string(&output)
                .map_err(|e| CliError::SerializationError(e.to_string()))?;
            println!("{rendered}");
        }
        OutputFormat::Human => {
            println!("Windows attempted: {}", summary.windows_attempted);
            println!("Windows succeeded: {}", summary.windows_succeeded);
            if let Some(window) = summary.last_window {
                println!("Last window: {window}");
            }
        }
    }
    Ok(())
}
