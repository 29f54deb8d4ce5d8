//! Command-line interface definitions for the `azdeploy` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{ArgAction, Parser, Subcommand};

const CONFIGURATION_HELP: &str = "\
Configuration is read from azdeploy.toml (or the file named by \
AZDEPLOY_CONFIG_PATH) and from AZURE_* and AZDEPLOY_* environment variables. \
.env files are not loaded: move AZURE_SUBSCRIPTION_ID, AZURE_TENANT_ID, \
AZURE_CLIENT_ID and AZURE_CLIENT_SECRET into azdeploy.toml or export them.";

/// Top-level CLI for the `azdeploy` binary.
#[derive(Debug, Parser)]
#[command(
    name = "azdeploy",
    about = "Provision a resource group, network, and SSH-reachable Linux VM on Azure",
    after_help = CONFIGURATION_HELP,
    arg_required_else_help = true
)]
pub(crate) struct Cli {
    /// Increase log verbosity on standard error (repeat for more detail).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub(crate) verbose: u8,
    #[command(subcommand)]
    pub(crate) command: Command,
}

/// Subcommands understood by `azdeploy`.
#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Ensure every resource exists and print the SSH connection string.
    #[command(
        name = "deploy",
        about = "Ensure every resource exists and print the SSH connection string"
    )]
    Deploy(DeployCommand),
}

/// Arguments for the `azdeploy deploy` subcommand.
///
/// Each flag overrides the matching value loaded from `azdeploy.toml` or the
/// `AZDEPLOY_*` environment variables.
#[derive(Debug, Default, Parser)]
pub(crate) struct DeployCommand {
    /// Resource group that holds every resource.
    #[arg(long, value_name = "NAME")]
    pub(crate) resource_group: Option<String>,
    /// Azure region, for example `eastus`.
    #[arg(long, value_name = "REGION")]
    pub(crate) location: Option<String>,
    /// Virtual machine name, also used as its host name.
    #[arg(long, value_name = "NAME")]
    pub(crate) vm_name: Option<String>,
    /// VM size class, for example `Standard_B1s`.
    #[arg(long, value_name = "SIZE")]
    pub(crate) vm_size: Option<String>,
    /// Administrator user name on the VM.
    #[arg(long, value_name = "USER")]
    pub(crate) admin_username: Option<String>,
    /// OpenSSH public key file to authorise for the administrator.
    ///
    /// Replaces any key or password configured elsewhere.
    #[arg(long, value_name = "PATH")]
    pub(crate) ssh_public_key_file: Option<String>,
}
