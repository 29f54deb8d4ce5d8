//! Shared fixtures for provisioning BDD scenarios.

use azdeploy::test_support::RecordingBackend;
use azdeploy::{
    AdminCredential, DeploymentRequest, ProvisionError, ProvisionOutcome, RecordingReporter,
    ResourceKind,
};
use rstest::fixture;

pub const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIExample dev@laptop";

#[derive(Clone, Debug)]
pub struct ProvisionContext {
    pub backend: RecordingBackend,
    pub reporter: RecordingReporter,
    pub request: Option<DeploymentRequest>,
    pub outcome: Option<DeployResult>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FailureKind {
    Lookup(ResourceKind),
    Create(ResourceKind),
    MissingPublicIp,
}

#[derive(Clone, Debug)]
pub enum DeployResult {
    Success(ProvisionOutcome),
    Failure { kind: FailureKind, message: String },
}

impl<E> From<Result<ProvisionOutcome, ProvisionError<E>>> for DeployResult
where
    E: std::error::Error + 'static,
{
    fn from(result: Result<ProvisionOutcome, ProvisionError<E>>) -> Self {
        match result {
            Ok(outcome) => Self::Success(outcome),
            Err(err) => {
                let kind = match &err {
                    ProvisionError::Lookup { kind, .. } => FailureKind::Lookup(*kind),
                    ProvisionError::Create { kind, .. } => FailureKind::Create(*kind),
                    ProvisionError::MissingPublicIp { .. } => FailureKind::MissingPublicIp,
                };
                Self::Failure {
                    kind,
                    message: err.to_string(),
                }
            }
        }
    }
}

#[fixture]
pub fn provision_context() -> ProvisionContext {
    ProvisionContext {
        backend: RecordingBackend::new(),
        reporter: RecordingReporter::new(),
        request: None,
        outcome: None,
    }
}

pub fn request_for(group: &str, location: &str) -> Result<DeploymentRequest, String> {
    DeploymentRequest::builder()
        .resource_group(group)
        .location(location)
        .credential(AdminCredential::SshPublicKey(String::from(PUBLIC_KEY)))
        .build()
        .map_err(|err| err.to_string())
}
