//! `check` command: resolve the configuration and show what `run` would do

use crate::config::AppConfig;
use crate::output::OutputStore;
use crate::poller::{bootstrap, ready_at};
use crate::resume::CheckpointStore;
use crate::timestamp::format_canonical;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use super::run::{OutputFormat, OverrideArgs};
use super::CliError;

/// `check` arguments
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Configuration overrides
    #[command(flatten)]
    pub overrides: OverrideArgs,
}

/// Resolved view of the first window
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CheckReport {
    /// Request URL
    pub url: String,
    /// `one_time` or `real-time`
    pub run_mode: String,
    /// How the first window was chosen
    pub origin: String,
    /// First window start, canonical
    pub from_date: String,
    /// First window end, canonical
    pub to_date: String,
    /// Earliest request time, canonical
    pub ready_at: String,
    /// Seconds until the first request, zero when ready
    pub wait_seconds: i64,
    /// Stops after the first window
    pub single_window: bool,
    /// Whether successes are recorded in the checkpoint file
    pub checkpoint_enabled: bool,
    /// Checkpoint file location
    pub checkpoint_file: String,
    /// Current checkpoint value
    pub checkpoint: Option<String>,
    /// Output file for the first window
    pub output_file: String,
}

impl CheckReport {
    /// Build the report as of `now`
    pub fn build(config: &AppConfig, now: DateTime<Utc>) -> Result<Self, CliError> {
        let store = CheckpointStore::new(&config.checkpoint_file);
        let checkpoint = store.load();
        let resume_from = if config.run.checkpoint_enabled() {
            checkpoint.as_deref()
        } else {
            None
        };

        let boot = bootstrap(&config.run, now, resume_from)?;
        let ready = ready_at(&boot.window, &config.run);
        let output = OutputStore::new(&config.out_box);

        Ok(Self {
            url: config.endpoint.compliance_url(&config.credentials.account_name),
            run_mode: config.run.run_mode.to_string(),
            origin: boot.origin.to_string(),
            from_date: boot.window.from_date(),
            to_date: boot.window.to_date(),
            ready_at: format_canonical(ready),
            wait_seconds: (ready - now).num_seconds().max(0),
            single_window: boot.single_window,
            checkpoint_enabled: config.run.checkpoint_enabled(),
            checkpoint_file: config.checkpoint_file.display().to_string(),
            checkpoint,
            output_file: output.path_for(boot.window.start()).display().to_string(),
        })
    }
}

impl CheckArgs {
    /// Print the report
    pub fn execute(&self, config: &AppConfig, format: OutputFormat) -> Result<(), CliError> {
        let report = CheckReport::build(config, Utc::now())?;

        match format {
            OutputFormat::Json => {
                let rendered = serde_json::to_string_pretty(&report)
                    .map_err(|e| CliError::SerializationError(e.to_string()))?;
                println!("{rendered}");
            }
            OutputFormat::Human => {
                println!("Endpoint: {}", report.url);
                println!("Run mode: {}", report.run_mode);
                println!(
                    "First window: [{}, {}) ({})",
                    report.from_date, report.to_date, report.origin
                );
                if report.wait_seconds > 0 {
                    println!(
                        "Ready at: {} (in {}s)",
                        report.ready_at, report.wait_seconds
                    );
                } else {
                    println!("Ready at: {} (now)", report.ready_at);
                }
                match (&report.checkpoint, report.checkpoint_enabled) {
                    (Some(value), true) => {
                        println!("Checkpoint: {} ({})", value, report.checkpoint_file)
                    }
                    (None, true) => println!("Checkpoint: none yet ({})", report.checkpoint_file),
                    (_, false) => println!("Checkpoint: disabled"),
                }
                println!("Output file: {}", report.output_file);
            }
        }

        Ok(())
    }
}
