//! Core library for the `azdeploy` provisioning tool.
//!
//! The crate models the resources of a single SSH-reachable Azure VM
//! environment, exposes a backend abstraction over the control plane, and
//! drives the deployment in dependency order (resource group → security group
//! and SSH rule → virtual network and subnet → public IP → network interface →
//! virtual machine) before reporting the `ssh` endpoint.

pub mod azure;
pub mod backend;
pub mod config;
pub mod credentials;
pub mod provision;
pub mod request;
pub mod resources;
pub mod test_support;

pub use azure::{AzureBackend, AzureBackendError};
pub use backend::{Backend, BackendFuture, Lookup};
pub use config::{AzureConfig, ConfigError, CredentialSource, DeploymentConfig};
pub use credentials::{CredentialError, resolve_admin_credential};
pub use provision::{
    ProgressEvent, ProgressReporter, ProvisionError, ProvisionOrchestrator, ProvisionOutcome,
    RecordingReporter, SshEndpoint, StdoutReporter,
};
pub use request::{DeploymentRequest, DeploymentRequestBuilder, RequestError};
pub use resources::{AdminCredential, Resource, ResourceKind, ResourceRef, ResourceSpec};
