//! Error types for the provisioning workflow.

use thiserror::Error;

use crate::resources::ResourceKind;

/// Errors surfaced while provisioning a deployment.
///
/// Any failure other than a not-found lookup aborts the remaining steps; no
/// rollback is attempted.
#[derive(Debug, Error)]
pub enum ProvisionError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Raised when the existence check for a resource fails.
    #[error("failed to look up {kind} '{name}': {source}")]
    Lookup {
        /// Kind of the resource being checked.
        kind: ResourceKind,
        /// Name of the resource being checked.
        name: String,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
    /// Raised when creating a resource fails.
    #[error("failed to create {kind} '{name}': {source}")]
    Create {
        /// Kind of the resource being created.
        kind: ResourceKind,
        /// Name of the resource being created.
        name: String,
        /// Provider-specific error.
        #[source]
        source: BackendError,
    },
    /// Raised when the public IP has no assigned address after the VM is up.
    #[error("public IP address '{name}' has no assigned address")]
    MissingPublicIp {
        /// Name of the public IP resource.
        name: String,
    },
}

impl<BackendError> ProvisionError<BackendError>
where
    BackendError: std::error::Error + 'static,
{
    /// Kind of resource the failure relates to.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Lookup { kind, .. } | Self::Create { kind, .. } => *kind,
            Self::MissingPublicIp { .. } => ResourceKind::PublicIpAddress,
        }
    }
}
