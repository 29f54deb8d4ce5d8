//! Unit tests for the provisioning workflow.

use rstest::{fixture, rstest};

use super::*;
use crate::resources::AdminCredential;
use crate::test_support::{Operation, RecordingBackend, TEST_PUBLIC_IP};

#[fixture]
fn request() -> DeploymentRequest {
    DeploymentRequest::builder()
        .credential(AdminCredential::SshPublicKey(String::from(
            "ssh-ed25519 AAAAC3Nza user@host",
        )))
        .build()
        .unwrap_or_else(|err| panic!("default request should be valid: {err}"))
}

#[rstest]
#[tokio::test]
async fn fresh_run_creates_every_kind(request: DeploymentRequest) {
    let orchestrator = ProvisionOrchestrator::new(RecordingBackend::new(), RecordingReporter::new());

    let outcome = orchestrator.execute(&request).await.expect("deploy");

    assert_eq!(
        outcome.created,
        vec![
            ResourceKind::ResourceGroup,
            ResourceKind::NetworkSecurityGroup,
            ResourceKind::SecurityRule,
            ResourceKind::VirtualNetwork,
            ResourceKind::Subnet,
            ResourceKind::PublicIpAddress,
            ResourceKind::NetworkInterface,
            ResourceKind::VirtualMachine,
        ]
    );
    assert_eq!(outcome.vm_name, "azdeploy-vm");
    assert_eq!(outcome.endpoint.address, TEST_PUBLIC_IP);
}

#[rstest]
#[tokio::test]
async fn existing_resources_are_reported_and_skipped(request: DeploymentRequest) {
    let backend = RecordingBackend::new();
    let first = ProvisionOrchestrator::new(backend.clone(), RecordingReporter::new());
    first.execute(&request).await.expect("first deploy");

    let reporter = RecordingReporter::new();
    let second = ProvisionOrchestrator::new(backend, reporter.clone());
    let outcome = second.execute(&request).await.expect("second deploy");

    assert!(outcome.created.is_empty());
    let lines = reporter.lines();
    assert!(lines.contains(&String::from(
        "Subnet 'azdeploy-subnet' already exists, skipping creation."
    )));
    assert!(!lines.iter().any(|line| line.starts_with("Creating")));
    assert_eq!(
        lines.last().map(String::as_str),
        Some("VM azdeploy-vm deployment complete!")
    );
}

#[rstest]
#[tokio::test]
async fn creating_lines_precede_completion(request: DeploymentRequest) {
    let reporter = RecordingReporter::new();
    let orchestrator = ProvisionOrchestrator::new(RecordingBackend::new(), reporter.clone());

    orchestrator.execute(&request).await.expect("deploy");

    let lines = reporter.lines();
    assert_eq!(
        lines.first().map(String::as_str),
        Some("Deploying into resource group 'azdeploy-rg' in eastus...")
    );
    assert!(lines.contains(&String::from(
        "Creating network security group 'azdeploy-nsg'..."
    )));
    assert!(lines.contains(&String::from("Creating security rule 'AllowSSH'...")));
}

#[rstest]
#[tokio::test]
async fn existing_security_group_id_binds_new_subnet(request: DeploymentRequest) {
    let backend = RecordingBackend::new();
    let nsg = backend.insert_existing(&ResourceRef::top_level(
        ResourceKind::NetworkSecurityGroup,
        "azdeploy-rg",
        "azdeploy-nsg",
    ));
    let orchestrator = ProvisionOrchestrator::new(backend.clone(), RecordingReporter::new());

    orchestrator.execute(&request).await.expect("deploy");

    let subnet = backend
        .created_specs()
        .into_iter()
        .find_map(|spec| match spec {
            ResourceSpec::Subnet(params) => Some(params),
            _ => None,
        })
        .expect("subnet should be created");
    assert_eq!(subnet.network_security_group_id, nsg.id);
    assert!(
        !backend
            .created_kinds()
            .contains(&ResourceKind::NetworkSecurityGroup)
    );
    assert!(backend.created_kinds().contains(&ResourceKind::SecurityRule));
}

#[rstest]
#[tokio::test]
async fn create_failure_stops_the_sequence(request: DeploymentRequest) {
    let backend = RecordingBackend::new().fail_create(ResourceKind::VirtualNetwork);
    let orchestrator = ProvisionOrchestrator::new(backend.clone(), RecordingReporter::new());

    let err = orchestrator
        .execute(&request)
        .await
        .expect_err("vnet failure should abort");

    assert!(
        matches!(err, ProvisionError::Create { kind: ResourceKind::VirtualNetwork, ref name, .. } if name == "azdeploy-vnet"),
        "unexpected error: {err}"
    );
    let last = backend.calls().pop().expect("calls recorded");
    assert_eq!(last.operation, Operation::CreateOrUpdate);
    assert_eq!(last.target.kind, ResourceKind::VirtualNetwork);
}

#[rstest]
#[tokio::test]
async fn unassigned_public_ip_is_an_error(request: DeploymentRequest) {
    let backend = RecordingBackend::new().without_public_ip_address();
    let orchestrator = ProvisionOrchestrator::new(backend, RecordingReporter::new());

    let err = orchestrator
        .execute(&request)
        .await
        .expect_err("missing address should fail");

    assert!(
        matches!(err, ProvisionError::MissingPublicIp { ref name } if name == "azdeploy-ip"),
        "unexpected error: {err}"
    );
    assert_eq!(err.kind(), ResourceKind::PublicIpAddress);
}

#[rstest]
#[tokio::test]
async fn vm_host_name_matches_vm_name(request: DeploymentRequest) {
    let backend = RecordingBackend::new();
    let orchestrator = ProvisionOrchestrator::new(backend.clone(), RecordingReporter::new());

    orchestrator.execute(&request).await.expect("deploy");

    let vm = backend
        .created_specs()
        .into_iter()
        .find_map(|spec| match spec {
            ResourceSpec::VirtualMachine(params) => Some(params),
            _ => None,
        })
        .expect("vm should be created");
    assert_eq!(vm.os_profile.computer_name, request.vm_name);
    assert_eq!(vm.image, request.image);
    assert_eq!(vm.vm_size, "Standard_B1s");
}

#[rstest]
#[tokio::test]
async fn create_parameters_match_their_targets(request: DeploymentRequest) {
    let backend = RecordingBackend::new();
    let orchestrator = ProvisionOrchestrator::new(backend.clone(), RecordingReporter::new());

    orchestrator.execute(&request).await.expect("deploy");

    let creates = backend
        .calls()
        .into_iter()
        .filter(|call| call.operation == Operation::CreateOrUpdate)
        .collect::<Vec<_>>();
    assert_eq!(creates.len(), 8);
    for call in creates {
        let spec = call.spec.expect("create calls carry parameters");
        assert_eq!(spec.kind(), call.target.kind, "mismatch for {}", call.target);
    }
}
