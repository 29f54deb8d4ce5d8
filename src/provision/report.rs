//! Progress reporting and the final connection endpoint.

use std::fmt;
use std::io::{self, Write};
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use crate::resources::ResourceKind;

/// A user-facing progress milestone.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ProgressEvent {
    /// The workflow has started against a resource group.
    Started {
        /// Target resource group.
        resource_group: String,
        /// Target region.
        location: String,
    },
    /// A missing resource is about to be created.
    Creating {
        /// Kind of resource.
        kind: ResourceKind,
        /// Resource name.
        name: String,
    },
    /// A resource was found and left untouched.
    AlreadyExists {
        /// Kind of resource.
        kind: ResourceKind,
        /// Resource name.
        name: String,
    },
    /// The virtual machine is in place.
    Completed {
        /// Name of the virtual machine.
        vm_name: String,
    },
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started {
                resource_group,
                location,
            } => write!(
                formatter,
                "Deploying into resource group '{resource_group}' in {location}..."
            ),
            Self::Creating { kind, name } => write!(formatter, "Creating {kind} '{name}'..."),
            Self::AlreadyExists { kind, name } => write!(
                formatter,
                "{} '{name}' already exists, skipping creation.",
                capitalised(kind.label())
            ),
            Self::Completed { vm_name } => write!(formatter, "VM {vm_name} deployment complete!"),
        }
    }
}

fn capitalised(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Sink for progress events.
pub trait ProgressReporter {
    /// Records a single progress event.
    fn report(&self, event: &ProgressEvent);
}

/// Writes progress lines to standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutReporter;

impl ProgressReporter for StdoutReporter {
    fn report(&self, event: &ProgressEvent) {
        writeln!(io::stdout(), "{event}").ok();
    }
}

/// Collects rendered progress lines in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingReporter {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lines reported so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(event.to_string());
        }
    }
}

/// Where to connect once the deployment is complete.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SshEndpoint {
    /// Administrator user name.
    pub username: String,
    /// Public address of the VM.
    pub address: IpAddr,
}

impl fmt::Display for SshEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "ssh {}@{}", self.username, self.address)
    }
}

/// Summary of a successful deployment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProvisionOutcome {
    /// Name of the virtual machine.
    pub vm_name: String,
    /// Connection endpoint.
    pub endpoint: SshEndpoint,
    /// Kinds created during this run, in creation order. Empty when every
    /// resource already existed.
    pub created: Vec<ResourceKind>,
}
