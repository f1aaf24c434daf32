mod config;
mod observability;

use clap::{Args, Parser};
use config::{Config, ConfigError};
use observability::MetricsInitError;
use relay::config::{Credentials, CredentialsError};
use relay::errors::RelayError;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(version, about = "Relays form-encoded webhooks to a Gotify server")]
enum CliCommand {
    /// Receive webhooks and forward them to Gotify
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Optional YAML file with listener, route and observability settings
    #[arg(long)]
    config_file_path: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Credentials(#[from] CredentialsError),
    #[error(transparent)]
    Metrics(#[from] MetricsInitError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

fn main() {
    let cli = CliCommand::parse();

    let result = match cli {
        CliCommand::Run(args) => run(args),
    };

    if let Err(e) = result {
        eprintln!("gotify-relay: {e}");
        process::exit(1);
    }
}

fn run(args: RunArgs) -> Result<(), CliError> {
    let config = match &args.config_file_path {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let _sentry_guard = observability::init_logging(config.common.logging.as_ref());
    observability::init_metrics(config.common.metrics.as_ref())?;

    let credentials = Credentials::from_env()?;
    tracing::debug!(?credentials, "loaded credentials");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(relay::run(config.relay, credentials))?;

    Ok(())
}
