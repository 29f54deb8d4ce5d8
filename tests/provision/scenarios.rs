//! BDD scenarios for the provisioning workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ProvisionContext, provision_context};

#[scenario(
    path = "tests/features/provision.feature",
    name = "Fresh deployment creates every resource in dependency order"
)]
fn scenario_fresh_deployment(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "Deploying twice creates each resource once"
)]
fn scenario_idempotent_deployment(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "A failing resource group lookup stops the deployment"
)]
fn scenario_lookup_failure(provision_context: ProvisionContext) {
    drop(provision_context);
}

#[scenario(
    path = "tests/features/provision.feature",
    name = "A public IP without an address is reported"
)]
fn scenario_missing_address(provision_context: ProvisionContext) {
    drop(provision_context);
}
