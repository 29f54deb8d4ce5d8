//! Long-running operation polling.
//!
//! A `PUT` either completes synchronously or returns an
//! `Azure-AsyncOperation` URL. The URL is polled until it reports a terminal
//! status, then the resource itself is polled until its `provisioningState`
//! is terminal.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::debug;

use crate::backend::Lookup;
use crate::resources::{Resource, ResourceRef};

use super::wire::OperationStatus;
use super::{AzureBackend, AzureBackendError, HTTP_CLIENT};

/// Coarse state shared by operation statuses and provisioning states.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(super) enum OperationState {
    InProgress,
    Succeeded,
    Failed,
    Canceled,
}

impl OperationState {
    pub(super) fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("Succeeded") {
            Self::Succeeded
        } else if raw.eq_ignore_ascii_case("Failed") {
            Self::Failed
        } else if raw.eq_ignore_ascii_case("Canceled") || raw.eq_ignore_ascii_case("Cancelled") {
            Self::Canceled
        } else {
            Self::InProgress
        }
    }

    /// State of a resource body; a missing `provisioningState` counts as
    /// complete, which is how resource groups created synchronously look.
    pub(super) fn of(resource: &Resource) -> Self {
        resource
            .provisioning_state()
            .map_or(Self::Succeeded, Self::parse)
    }
}

/// Polling deadline; a timeout too large to represent never expires.
#[derive(Clone, Copy, Debug)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn after(timeout: Duration) -> Self {
        Self(Instant::now().checked_add(timeout))
    }

    fn passed(self) -> bool {
        self.0.is_some_and(|at| Instant::now() > at)
    }
}

impl AzureBackend {
    pub(super) async fn await_operation(
        &self,
        status_url: &str,
        target: &ResourceRef,
    ) -> Result<(), AzureBackendError> {
        let deadline = Deadline::after(self.operation_timeout);
        while !deadline.passed() {
            let response = self.send(HTTP_CLIENT.get(status_url), target).await?;
            let status: OperationStatus = Self::decode(response).await?;
            debug!(resource = %target, status = %status.status, "operation status");

            match OperationState::parse(&status.status) {
                OperationState::Succeeded => return Ok(()),
                state @ (OperationState::Failed | OperationState::Canceled) => {
                    return Err(AzureBackendError::OperationFailed {
                        target: target.to_string(),
                        status: format!("{state:?}"),
                        message: status.error.map(|err| err.message).unwrap_or_default(),
                    });
                }
                OperationState::InProgress => sleep(self.poll_interval).await,
            }
        }

        Err(AzureBackendError::Timeout {
            operation: String::from("asynchronous operation"),
            target: target.to_string(),
        })
    }

    pub(super) async fn await_provisioned(
        &self,
        target: &ResourceRef,
    ) -> Result<Resource, AzureBackendError> {
        let deadline = Deadline::after(self.operation_timeout);
        while !deadline.passed() {
            // A freshly accepted resource may not be readable yet.
            let Lookup::Found(resource) = self.fetch(target).await? else {
                sleep(self.poll_interval).await;
                continue;
            };

            match OperationState::of(&resource) {
                OperationState::Succeeded => return Ok(resource),
                state @ (OperationState::Failed | OperationState::Canceled) => {
                    return Err(AzureBackendError::OperationFailed {
                        target: target.to_string(),
                        status: format!("{state:?}"),
                        message: String::from("resource provisioning did not succeed"),
                    });
                }
                OperationState::InProgress => sleep(self.poll_interval).await,
            }
        }

        Err(AzureBackendError::Timeout {
            operation: String::from("provisioning"),
            target: target.to_string(),
        })
    }
}
