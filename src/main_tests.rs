//! Unit tests for the `azdeploy` CLI binary implementation.

use super::*;
use azdeploy::request::{
    DEFAULT_ADMIN_USERNAME, DEFAULT_IMAGE_OFFER, DEFAULT_IMAGE_PUBLISHER, DEFAULT_IMAGE_SKU,
    DEFAULT_IMAGE_VERSION, DEFAULT_IP_CONFIGURATION_NAME, DEFAULT_LOCATION, DEFAULT_NIC_NAME,
    DEFAULT_NSG_NAME, DEFAULT_OS_DISK_STORAGE_TYPE, DEFAULT_PUBLIC_IP_NAME,
    DEFAULT_RESOURCE_GROUP, DEFAULT_SSH_PORT, DEFAULT_SSH_RULE_NAME, DEFAULT_SSH_RULE_PRIORITY,
    DEFAULT_SSH_SOURCE_ADDRESS_PREFIX, DEFAULT_SUBNET_ADDRESS_PREFIX, DEFAULT_SUBNET_NAME,
    DEFAULT_VM_NAME, DEFAULT_VM_SIZE, DEFAULT_VNET_ADDRESS_PREFIX, DEFAULT_VNET_NAME,
};
use azdeploy::{ResourceKind, SshEndpoint};
use rstest::{fixture, rstest};

#[fixture]
fn config() -> DeploymentConfig {
    DeploymentConfig {
        resource_group: DEFAULT_RESOURCE_GROUP.to_owned(),
        location: DEFAULT_LOCATION.to_owned(),
        vm_name: DEFAULT_VM_NAME.to_owned(),
        vnet_name: DEFAULT_VNET_NAME.to_owned(),
        subnet_name: DEFAULT_SUBNET_NAME.to_owned(),
        nic_name: DEFAULT_NIC_NAME.to_owned(),
        public_ip_name: DEFAULT_PUBLIC_IP_NAME.to_owned(),
        nsg_name: DEFAULT_NSG_NAME.to_owned(),
        vm_size: DEFAULT_VM_SIZE.to_owned(),
        image_publisher: DEFAULT_IMAGE_PUBLISHER.to_owned(),
        image_offer: DEFAULT_IMAGE_OFFER.to_owned(),
        image_sku: DEFAULT_IMAGE_SKU.to_owned(),
        image_version: DEFAULT_IMAGE_VERSION.to_owned(),
        os_disk_storage_type: DEFAULT_OS_DISK_STORAGE_TYPE.to_owned(),
        admin_username: DEFAULT_ADMIN_USERNAME.to_owned(),
        admin_password: Some(String::from("configured-password")),
        admin_ssh_public_key: None,
        admin_ssh_public_key_file: None,
        vnet_address_prefix: DEFAULT_VNET_ADDRESS_PREFIX.to_owned(),
        subnet_address_prefix: DEFAULT_SUBNET_ADDRESS_PREFIX.to_owned(),
        ip_configuration_name: DEFAULT_IP_CONFIGURATION_NAME.to_owned(),
        ssh_rule_name: DEFAULT_SSH_RULE_NAME.to_owned(),
        ssh_port: DEFAULT_SSH_PORT,
        ssh_source_address_prefix: DEFAULT_SSH_SOURCE_ADDRESS_PREFIX.to_owned(),
        ssh_rule_priority: DEFAULT_SSH_RULE_PRIORITY,
    }
}

#[rstest]
fn overrides_replace_configured_values(mut config: DeploymentConfig) {
    apply_overrides(
        &mut config,
        DeployCommand {
            resource_group: Some(String::from("test-rg")),
            location: Some(String::from("westeurope")),
            vm_name: Some(String::from("builder")),
            vm_size: Some(String::from("Standard_B2s")),
            admin_username: Some(String::from("ops")),
            ssh_public_key_file: None,
        },
    );

    assert_eq!(config.resource_group, "test-rg");
    assert_eq!(config.location, "westeurope");
    assert_eq!(config.vm_name, "builder");
    assert_eq!(config.vm_size, "Standard_B2s");
    assert_eq!(config.admin_username, "ops");
    assert_eq!(config.admin_password.as_deref(), Some("configured-password"));
}

#[rstest]
fn absent_overrides_keep_configuration(mut config: DeploymentConfig) {
    let before = config.clone();
    apply_overrides(&mut config, DeployCommand::default());
    assert_eq!(config, before);
}

#[rstest]
fn key_file_flag_replaces_other_credentials(mut config: DeploymentConfig) {
    config.admin_ssh_public_key = Some(String::from("ssh-ed25519 AAAA old@host"));
    apply_overrides(
        &mut config,
        DeployCommand {
            ssh_public_key_file: Some(String::from("~/.ssh/id_ed25519.pub")),
            ..DeployCommand::default()
        },
    );

    assert_eq!(
        config.admin_ssh_public_key_file.as_deref(),
        Some("~/.ssh/id_ed25519.pub")
    );
    assert!(config.admin_ssh_public_key.is_none());
    assert!(config.admin_password.is_none());
}

#[rstest]
#[case(0, "warn")]
#[case(1, "info")]
#[case(2, "debug")]
#[case(7, "trace")]
fn verbosity_maps_to_log_level(#[case] verbose: u8, #[case] expected: &str) {
    assert_eq!(log_level(verbose), expected);
}

#[test]
fn write_outcome_prints_connection_line() {
    let outcome = ProvisionOutcome {
        vm_name: String::from("azdeploy-vm"),
        endpoint: SshEndpoint {
            username: String::from("azureuser"),
            address: "20.1.2.3".parse().expect("valid address"),
        },
        created: vec![ResourceKind::VirtualMachine],
    };
    let mut buf = Vec::new();
    write_outcome(&mut buf, &outcome);

    let rendered = String::from_utf8(buf).expect("utf8");
    assert_eq!(rendered, "Connect using: ssh azureuser@20.1.2.3\n");
}

#[test]
fn write_error_writes_cli_error() {
    let mut buf = Vec::new();
    let err = CliError::Config(ConfigError::MissingField(String::from(
        "missing Azure subscription ID",
    )));
    write_error(&mut buf, &err);

    let rendered = String::from_utf8(buf).expect("utf8");
    assert!(
        rendered.contains("configuration error: missing configuration field"),
        "rendered: {rendered}"
    );
}
