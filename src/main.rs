//! Main entry point for the compliance-poller CLI

use clap::Parser;
use compliance_poller::cli::{Cli, Commands};
use compliance_poller::logging::init_tracing;
use compliance_poller::shutdown::{self, ShutdownCoordinator};
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            init_tracing(None);
            error!(config = %cli.config.display(), "Command failed: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(config.log_file_path.as_deref());

    let shutdown = ShutdownCoordinator::shared();
    shutdown::set_global_shutdown(shutdown.clone());
    shutdown::spawn_signal_listener(shutdown.clone());

    let result = match &cli.command {
        Commands::Run(args) => args
            .execute(&config, cli.output_format, shutdown)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!(e)),
        Commands::Check(args) => args
            .execute(&config, cli.output_format)
            .map_err(|e| anyhow::anyhow!(e)),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }
}
