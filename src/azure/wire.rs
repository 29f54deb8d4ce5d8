//! Resource Manager request bodies.
//!
//! Each [`ResourceSpec`] is rendered into the JSON shape the corresponding
//! ARM resource provider expects. Field names follow ARM's casing, which is
//! camelCase apart from a few `IP` acronyms.

use serde::{Deserialize, Serialize};

use crate::resources::{
    NetworkInterfaceParameters, ResourceSpec, SecurityRule, VirtualMachineParameters,
};

/// Body of a `PUT` request for one resource.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum RequestBody<'a> {
    Located {
        location: &'a str,
    },
    LocatedWithProperties {
        location: &'a str,
        properties: Properties<'a>,
    },
    Child {
        properties: Properties<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum Properties<'a> {
    Empty(Empty),
    SecurityRule(SecurityRuleProperties<'a>),
    VirtualNetwork(VirtualNetworkProperties<'a>),
    Subnet(SubnetProperties<'a>),
    PublicIp(PublicIpProperties),
    NetworkInterface(NetworkInterfaceProperties<'a>),
    VirtualMachine(Box<VirtualMachineProperties<'a>>),
}

#[derive(Debug, Serialize)]
pub(super) struct Empty {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SecurityRuleProperties<'a> {
    protocol: &'static str,
    source_port_range: &'a str,
    destination_port_range: &'a str,
    source_address_prefix: &'a str,
    destination_address_prefix: &'a str,
    access: &'static str,
    priority: u16,
    direction: &'static str,
}

impl<'a> From<&'a SecurityRule> for SecurityRuleProperties<'a> {
    fn from(rule: &'a SecurityRule) -> Self {
        Self {
            protocol: rule.protocol.as_str(),
            source_port_range: &rule.source_port_range,
            destination_port_range: &rule.destination_port_range,
            source_address_prefix: &rule.source_address_prefix,
            destination_address_prefix: &rule.destination_address_prefix,
            access: rule.access.as_str(),
            priority: rule.priority,
            direction: rule.direction.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VirtualNetworkProperties<'a> {
    address_space: AddressSpace<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddressSpace<'a> {
    address_prefixes: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SubnetProperties<'a> {
    address_prefix: &'a str,
    network_security_group: SubResource<'a>,
}

#[derive(Debug, Serialize)]
struct SubResource<'a> {
    id: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct PublicIpProperties {
    #[serde(rename = "publicIPAllocationMethod")]
    allocation_method: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NetworkInterfaceProperties<'a> {
    ip_configurations: [IpConfiguration<'a>; 1],
}

#[derive(Debug, Serialize)]
struct IpConfiguration<'a> {
    name: &'a str,
    properties: IpConfigurationProperties<'a>,
}

#[derive(Debug, Serialize)]
struct IpConfigurationProperties<'a> {
    subnet: SubResource<'a>,
    #[serde(rename = "publicIPAddress")]
    public_ip_address: SubResource<'a>,
    #[serde(rename = "privateIPAllocationMethod")]
    private_ip_allocation_method: &'static str,
}

impl<'a> From<&'a NetworkInterfaceParameters> for NetworkInterfaceProperties<'a> {
    fn from(params: &'a NetworkInterfaceParameters) -> Self {
        Self {
            ip_configurations: [IpConfiguration {
                name: &params.ip_configuration_name,
                properties: IpConfigurationProperties {
                    subnet: SubResource {
                        id: &params.subnet_id,
                    },
                    public_ip_address: SubResource {
                        id: &params.public_ip_id,
                    },
                    private_ip_allocation_method: "Dynamic",
                },
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VirtualMachineProperties<'a> {
    hardware_profile: HardwareProfile<'a>,
    storage_profile: StorageProfile<'a>,
    os_profile: OsProfileBody<'a>,
    network_profile: NetworkProfile<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HardwareProfile<'a> {
    vm_size: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StorageProfile<'a> {
    image_reference: ImageReferenceBody<'a>,
    os_disk: OsDisk<'a>,
}

#[derive(Debug, Serialize)]
struct ImageReferenceBody<'a> {
    publisher: &'a str,
    offer: &'a str,
    sku: &'a str,
    version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OsDisk<'a> {
    create_option: &'static str,
    managed_disk: ManagedDisk<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ManagedDisk<'a> {
    storage_account_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OsProfileBody<'a> {
    computer_name: &'a str,
    admin_username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    admin_password: Option<&'a str>,
    linux_configuration: LinuxConfigurationBody<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LinuxConfigurationBody<'a> {
    disable_password_authentication: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    ssh: Option<SshConfiguration<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SshConfiguration<'a> {
    public_keys: Vec<PublicKeyBody<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicKeyBody<'a> {
    path: &'a str,
    key_data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NetworkProfile<'a> {
    network_interfaces: [SubResource<'a>; 1],
}

impl<'a> From<&'a VirtualMachineParameters> for VirtualMachineProperties<'a> {
    fn from(params: &'a VirtualMachineParameters) -> Self {
        let profile = &params.os_profile;
        let keys = &profile.linux.ssh_public_keys;
        let ssh = (!keys.is_empty()).then(|| SshConfiguration {
            public_keys: keys
                .iter()
                .map(|key| PublicKeyBody {
                    path: &key.path,
                    key_data: &key.key_data,
                })
                .collect(),
        });
        Self {
            hardware_profile: HardwareProfile {
                vm_size: &params.vm_size,
            },
            storage_profile: StorageProfile {
                image_reference: ImageReferenceBody {
                    publisher: &params.image.publisher,
                    offer: &params.image.offer,
                    sku: &params.image.sku,
                    version: &params.image.version,
                },
                os_disk: OsDisk {
                    create_option: "FromImage",
                    managed_disk: ManagedDisk {
                        storage_account_type: &params.os_disk_storage_type,
                    },
                },
            },
            os_profile: OsProfileBody {
                computer_name: &profile.computer_name,
                admin_username: &profile.admin_username,
                admin_password: profile.admin_password.as_deref(),
                linux_configuration: LinuxConfigurationBody {
                    disable_password_authentication: profile.linux.disable_password_authentication,
                    ssh,
                },
            },
            network_profile: NetworkProfile {
                network_interfaces: [SubResource {
                    id: &params.network_interface_id,
                }],
            },
        }
    }
}

impl<'a> From<&'a ResourceSpec> for RequestBody<'a> {
    fn from(spec: &'a ResourceSpec) -> Self {
        match spec {
            ResourceSpec::ResourceGroup(params) => Self::Located {
                location: &params.location,
            },
            ResourceSpec::NetworkSecurityGroup(params) => Self::LocatedWithProperties {
                location: &params.location,
                properties: Properties::Empty(Empty {}),
            },
            ResourceSpec::SecurityRule(rule) => Self::Child {
                properties: Properties::SecurityRule(rule.into()),
            },
            ResourceSpec::VirtualNetwork(params) => Self::LocatedWithProperties {
                location: &params.location,
                properties: Properties::VirtualNetwork(VirtualNetworkProperties {
                    address_space: AddressSpace {
                        address_prefixes: &params.address_prefixes,
                    },
                }),
            },
            ResourceSpec::Subnet(params) => Self::Child {
                properties: Properties::Subnet(SubnetProperties {
                    address_prefix: &params.address_prefix,
                    network_security_group: SubResource {
                        id: &params.network_security_group_id,
                    },
                }),
            },
            ResourceSpec::PublicIpAddress(params) => Self::LocatedWithProperties {
                location: &params.location,
                properties: Properties::PublicIp(PublicIpProperties {
                    allocation_method: params.allocation.to_string(),
                }),
            },
            ResourceSpec::NetworkInterface(params) => Self::LocatedWithProperties {
                location: &params.location,
                properties: Properties::NetworkInterface(params.into()),
            },
            ResourceSpec::VirtualMachine(params) => Self::LocatedWithProperties {
                location: &params.location,
                properties: Properties::VirtualMachine(Box::new(VirtualMachineProperties::from(
                    &**params,
                ))),
            },
        }
    }
}

/// ARM error envelope: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub(super) error: ErrorDetail,
}

/// Code and message of an ARM error.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorDetail {
    #[serde(default)]
    pub(super) code: String,
    #[serde(default)]
    pub(super) message: String,
}

/// Body returned by an `Azure-AsyncOperation` status URL.
#[derive(Debug, Deserialize)]
pub(super) struct OperationStatus {
    pub(super) status: String,
    #[serde(default)]
    pub(super) error: Option<ErrorDetail>,
}
