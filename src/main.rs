//! Binary entry point for the `azdeploy` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use azdeploy::{
    AzureBackend, AzureBackendError, AzureConfig, ConfigError, DeploymentConfig, ProvisionError,
    ProvisionOrchestrator, ProvisionOutcome, StdoutReporter,
};

mod cli;

use cli::{Cli, Command, DeployCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("backend error: {0}")]
    Backend(#[from] AzureBackendError),
    #[error("deployment failed: {0}")]
    Provision(#[from] ProvisionError<AzureBackendError>),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match dispatch(cli.command).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

/// Routes diagnostics to standard error so progress output stays clean.
/// `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("azdeploy={}", log_level(verbose))));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

const fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

async fn dispatch(command: Command) -> Result<(), CliError> {
    match command {
        Command::Deploy(args) => deploy(args).await,
    }
}

async fn deploy(args: DeployCommand) -> Result<(), CliError> {
    let mut deployment = DeploymentConfig::load_without_cli_args()?;
    apply_overrides(&mut deployment, args);
    let request = deployment.as_request()?;

    let azure = AzureConfig::load_without_cli_args()?;
    let backend = AzureBackend::new(&azure)?;

    let orchestrator = ProvisionOrchestrator::new(backend, StdoutReporter);
    let outcome = orchestrator.execute(&request).await?;
    write_outcome(io::stdout(), &outcome);
    Ok(())
}

fn apply_overrides(config: &mut DeploymentConfig, args: DeployCommand) {
    let DeployCommand {
        resource_group,
        location,
        vm_name,
        vm_size,
        admin_username,
        ssh_public_key_file,
    } = args;

    if let Some(value) = resource_group {
        config.resource_group = value;
    }
    if let Some(value) = location {
        config.location = value;
    }
    if let Some(value) = vm_name {
        config.vm_name = value;
    }
    if let Some(value) = vm_size {
        config.vm_size = value;
    }
    if let Some(value) = admin_username {
        config.admin_username = value;
    }
    if let Some(path) = ssh_public_key_file {
        config.admin_ssh_public_key_file = Some(path);
        config.admin_ssh_public_key = None;
        config.admin_password = None;
    }
}

fn write_outcome(mut target: impl Write, outcome: &ProvisionOutcome) {
    writeln!(target, "Connect using: {}", outcome.endpoint).ok();
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
