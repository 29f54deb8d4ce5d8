//! BDD step definitions for the provisioning workflow.

use std::collections::HashSet;

use azdeploy::{ProvisionOrchestrator, ResourceKind};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{DeployResult, FailureKind, ProvisionContext, request_for};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("fixture error: {0}")]
    Setup(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("an empty Azure subscription")]
fn empty_subscription(provision_context: ProvisionContext) -> ProvisionContext {
    provision_context
}

#[given("resource group lookups fail")]
fn resource_group_lookups_fail(mut provision_context: ProvisionContext) -> ProvisionContext {
    provision_context.backend = provision_context
        .backend
        .fail_get(ResourceKind::ResourceGroup);
    provision_context
}

#[given("public IPs receive no address")]
fn public_ips_without_address(mut provision_context: ProvisionContext) -> ProvisionContext {
    provision_context.backend = provision_context.backend.without_public_ip_address();
    provision_context
}

fn run_deployment(mut context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    let runtime = Runtime::new().map_err(|err| StepError::Setup(err.to_string()))?;
    let request = context
        .request
        .clone()
        .ok_or_else(|| StepError::Setup(String::from("no deployment request prepared")))?;
    let orchestrator =
        ProvisionOrchestrator::new(context.backend.clone(), context.reporter.clone());

    let result = runtime.block_on(async move { orchestrator.execute(&request).await });
    context.outcome = Some(DeployResult::from(result));
    Ok(context)
}

#[when("I deploy to resource group \"{group}\" in \"{location}\"")]
fn deploy_to_group(
    mut provision_context: ProvisionContext,
    group: String,
    location: String,
) -> Result<ProvisionContext, StepError> {
    provision_context.request = Some(request_for(&group, &location).map_err(StepError::Setup)?);
    run_deployment(provision_context)
}

#[when("I deploy again")]
fn deploy_again(provision_context: ProvisionContext) -> Result<ProvisionContext, StepError> {
    run_deployment(provision_context)
}

#[then("the deployment succeeds")]
fn deployment_succeeds(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match provision_context.outcome {
        Some(DeployResult::Success(_)) => Ok(()),
        Some(DeployResult::Failure { ref message, .. }) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the created resources are \"{labels}\"")]
fn created_resources_are(
    provision_context: &ProvisionContext,
    labels: String,
) -> Result<(), StepError> {
    let actual = provision_context
        .backend
        .created_kinds()
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join(", ");
    if actual == labels {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected creation order `{labels}`, got `{actual}`"
        )))
    }
}

#[then("the connection line is \"{line}\"")]
fn connection_line_is(provision_context: &ProvisionContext, line: String) -> Result<(), StepError> {
    let Some(DeployResult::Success(ref outcome)) = provision_context.outcome else {
        return Err(StepError::Assertion(String::from(
            "expected a successful outcome",
        )));
    };
    let rendered = outcome.endpoint.to_string();
    if rendered == line {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected `{line}`, got `{rendered}`"
        )))
    }
}

#[then("each resource was created once")]
fn each_resource_created_once(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let kinds = provision_context.backend.created_kinds();
    let distinct = kinds.iter().copied().collect::<HashSet<_>>();
    if kinds.len() == 8 && distinct.len() == 8 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected eight distinct creations, got {kinds:?}"
        )))
    }
}

#[then("progress reports \"{line}\"")]
fn progress_reports(provision_context: &ProvisionContext, line: String) -> Result<(), StepError> {
    let lines = provision_context.reporter.lines();
    if lines.contains(&line) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected progress line `{line}` in {lines:?}"
        )))
    }
}

#[then("the deployment fails while looking up the \"{label}\"")]
fn fails_on_lookup(provision_context: &ProvisionContext, label: String) -> Result<(), StepError> {
    match provision_context.outcome {
        Some(DeployResult::Failure {
            kind: FailureKind::Lookup(kind),
            ..
        }) if kind.label() == label => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected lookup failure for {label}, got {other:?}"
        ))),
    }
}

#[then("no resources were created")]
fn no_resources_created(provision_context: &ProvisionContext) -> Result<(), StepError> {
    let kinds = provision_context.backend.created_kinds();
    if kinds.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no creations, got {kinds:?}"
        )))
    }
}

#[then("the deployment fails because the public IP has no address")]
fn fails_without_address(provision_context: &ProvisionContext) -> Result<(), StepError> {
    match provision_context.outcome {
        Some(DeployResult::Failure {
            kind: FailureKind::MissingPublicIp,
            ..
        }) => Ok(()),
        ref other => Err(StepError::Assertion(format!(
            "expected missing public IP failure, got {other:?}"
        ))),
    }
}
