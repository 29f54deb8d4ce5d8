//! Deployment parameters and their validating builder.

use std::net::IpAddr;
use std::str::FromStr;

use thiserror::Error;

use crate::resources::{AdminCredential, ImageReference, SecurityRule};

/// Default resource group name.
pub const DEFAULT_RESOURCE_GROUP: &str = "azdeploy-rg";
/// Default Azure region.
pub const DEFAULT_LOCATION: &str = "eastus";
/// Default virtual machine name.
pub const DEFAULT_VM_NAME: &str = "azdeploy-vm";
/// Default virtual network name.
pub const DEFAULT_VNET_NAME: &str = "azdeploy-vnet";
/// Default subnet name.
pub const DEFAULT_SUBNET_NAME: &str = "azdeploy-subnet";
/// Default network interface name.
pub const DEFAULT_NIC_NAME: &str = "azdeploy-nic";
/// Default public IP name.
pub const DEFAULT_PUBLIC_IP_NAME: &str = "azdeploy-ip";
/// Default network security group name.
pub const DEFAULT_NSG_NAME: &str = "azdeploy-nsg";
/// Default VM size class.
pub const DEFAULT_VM_SIZE: &str = "Standard_B1s";
/// Default image publisher.
pub const DEFAULT_IMAGE_PUBLISHER: &str = "Canonical";
/// Default image offer.
pub const DEFAULT_IMAGE_OFFER: &str = "UbuntuServer";
/// Default image SKU.
pub const DEFAULT_IMAGE_SKU: &str = "18.04-LTS";
/// Default image version.
pub const DEFAULT_IMAGE_VERSION: &str = "latest";
/// Default managed disk storage type for the OS disk.
pub const DEFAULT_OS_DISK_STORAGE_TYPE: &str = "Standard_LRS";
/// Default administrator user name.
pub const DEFAULT_ADMIN_USERNAME: &str = "azureuser";
/// Default virtual network address space.
pub const DEFAULT_VNET_ADDRESS_PREFIX: &str = "10.0.0.0/16";
/// Default subnet address range.
pub const DEFAULT_SUBNET_ADDRESS_PREFIX: &str = "10.0.0.0/24";
/// Default name of the NIC's IP configuration.
pub const DEFAULT_IP_CONFIGURATION_NAME: &str = "myIpConfig";
/// Default SSH rule name.
pub const DEFAULT_SSH_RULE_NAME: &str = "AllowSSH";
/// Default SSH port opened by the rule.
pub const DEFAULT_SSH_PORT: u16 = 22;
/// Default SSH source prefix. `*` admits every address and should be
/// narrowed for anything beyond a throwaway environment.
pub const DEFAULT_SSH_SOURCE_ADDRESS_PREFIX: &str = "*";
/// Default SSH rule priority.
pub const DEFAULT_SSH_RULE_PRIORITY: u16 = 100;

const MIN_RULE_PRIORITY: u16 = 100;
const MAX_RULE_PRIORITY: u16 = 4096;

/// Errors raised while building a [`DeploymentRequest`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a required field is empty.
    #[error("missing or empty field: {0}")]
    Validation(String),
    /// Raised when no administrator credential was supplied.
    #[error("an administrator password or SSH public key is required")]
    MissingCredential,
    /// Raised when an address prefix is not valid CIDR notation or has host
    /// bits set.
    #[error("{field} is not a valid CIDR prefix: {value}")]
    InvalidCidr {
        /// Field holding the prefix.
        field: String,
        /// Rejected value.
        value: String,
    },
    /// Raised when the subnet range falls outside the virtual network.
    #[error("subnet prefix {subnet} is not inside virtual network prefix {network}")]
    SubnetOutsideNetwork {
        /// Subnet prefix.
        subnet: String,
        /// Virtual network prefix.
        network: String,
    },
    /// Raised when the SSH rule priority is outside Azure's accepted range.
    #[error("security rule priority {0} must be between 100 and 4096")]
    InvalidPriority(u16),
    /// Raised when the SSH port is zero.
    #[error("ssh port must be non-zero")]
    InvalidPort,
}

/// Everything the workflow needs to provision one environment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentRequest {
    /// Resource group holding every resource.
    pub resource_group: String,
    /// Azure region.
    pub location: String,
    /// Virtual machine name, also used as host name.
    pub vm_name: String,
    /// Virtual network name.
    pub vnet_name: String,
    /// Subnet name.
    pub subnet_name: String,
    /// Network interface name.
    pub nic_name: String,
    /// Public IP name.
    pub public_ip_name: String,
    /// Network security group name.
    pub nsg_name: String,
    /// VM size class.
    pub vm_size: String,
    /// Boot image.
    pub image: ImageReference,
    /// Managed disk storage type for the OS disk.
    pub os_disk_storage_type: String,
    /// Administrator user name.
    pub admin_username: String,
    /// Administrator authentication material.
    pub credential: AdminCredential,
    /// Virtual network address space.
    pub vnet_address_prefix: String,
    /// Subnet address range.
    pub subnet_address_prefix: String,
    /// Name of the NIC's IP configuration.
    pub ip_configuration_name: String,
    /// Inbound SSH rule added to the security group.
    pub ssh_rule: SecurityRule,
}

impl DeploymentRequest {
    /// Starts a builder pre-populated with defaults.
    #[must_use]
    pub fn builder() -> DeploymentRequestBuilder {
        DeploymentRequestBuilder::new()
    }
}

/// Builder for [`DeploymentRequest`] that trims and validates on build.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentRequestBuilder {
    resource_group: String,
    location: String,
    vm_name: String,
    vnet_name: String,
    subnet_name: String,
    nic_name: String,
    public_ip_name: String,
    nsg_name: String,
    vm_size: String,
    image: ImageReference,
    os_disk_storage_type: String,
    admin_username: String,
    credential: Option<AdminCredential>,
    vnet_address_prefix: String,
    subnet_address_prefix: String,
    ip_configuration_name: String,
    ssh_rule_name: String,
    ssh_port: u16,
    ssh_source_address_prefix: String,
    ssh_rule_priority: u16,
}

impl Default for DeploymentRequestBuilder {
    fn default() -> Self {
        Self {
            resource_group: DEFAULT_RESOURCE_GROUP.to_owned(),
            location: DEFAULT_LOCATION.to_owned(),
            vm_name: DEFAULT_VM_NAME.to_owned(),
            vnet_name: DEFAULT_VNET_NAME.to_owned(),
            subnet_name: DEFAULT_SUBNET_NAME.to_owned(),
            nic_name: DEFAULT_NIC_NAME.to_owned(),
            public_ip_name: DEFAULT_PUBLIC_IP_NAME.to_owned(),
            nsg_name: DEFAULT_NSG_NAME.to_owned(),
            vm_size: DEFAULT_VM_SIZE.to_owned(),
            image: ImageReference {
                publisher: DEFAULT_IMAGE_PUBLISHER.to_owned(),
                offer: DEFAULT_IMAGE_OFFER.to_owned(),
                sku: DEFAULT_IMAGE_SKU.to_owned(),
                version: DEFAULT_IMAGE_VERSION.to_owned(),
            },
            os_disk_storage_type: DEFAULT_OS_DISK_STORAGE_TYPE.to_owned(),
            admin_username: DEFAULT_ADMIN_USERNAME.to_owned(),
            credential: None,
            vnet_address_prefix: DEFAULT_VNET_ADDRESS_PREFIX.to_owned(),
            subnet_address_prefix: DEFAULT_SUBNET_ADDRESS_PREFIX.to_owned(),
            ip_configuration_name: DEFAULT_IP_CONFIGURATION_NAME.to_owned(),
            ssh_rule_name: DEFAULT_SSH_RULE_NAME.to_owned(),
            ssh_port: DEFAULT_SSH_PORT,
            ssh_source_address_prefix: DEFAULT_SSH_SOURCE_ADDRESS_PREFIX.to_owned(),
            ssh_rule_priority: DEFAULT_SSH_RULE_PRIORITY,
        }
    }
}

macro_rules! string_setters {
    ($($(#[$meta:meta])* $field:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[must_use]
            pub fn $field(mut self, value: impl Into<String>) -> Self {
                self.$field = value.into();
                self
            }
        )+
    };
}

impl DeploymentRequestBuilder {
    /// Creates a builder holding the default deployment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    string_setters!(
        /// Sets the resource group name.
        resource_group,
        /// Sets the Azure region.
        location,
        /// Sets the virtual machine name.
        vm_name,
        /// Sets the virtual network name.
        vnet_name,
        /// Sets the subnet name.
        subnet_name,
        /// Sets the network interface name.
        nic_name,
        /// Sets the public IP name.
        public_ip_name,
        /// Sets the network security group name.
        nsg_name,
        /// Sets the VM size class.
        vm_size,
        /// Sets the OS disk storage type.
        os_disk_storage_type,
        /// Sets the administrator user name.
        admin_username,
        /// Sets the virtual network address space.
        vnet_address_prefix,
        /// Sets the subnet address range.
        subnet_address_prefix,
        /// Sets the NIC IP configuration name.
        ip_configuration_name,
        /// Sets the SSH rule name.
        ssh_rule_name,
        /// Sets the SSH rule source prefix.
        ssh_source_address_prefix,
    );

    /// Sets the boot image.
    #[must_use]
    pub fn image(mut self, value: ImageReference) -> Self {
        self.image = value;
        self
    }

    /// Sets the administrator credential.
    #[must_use]
    pub fn credential(mut self, value: AdminCredential) -> Self {
        self.credential = Some(value);
        self
    }

    /// Sets the SSH port opened by the security rule.
    #[must_use]
    pub const fn ssh_port(mut self, value: u16) -> Self {
        self.ssh_port = value;
        self
    }

    /// Sets the SSH rule priority.
    #[must_use]
    pub const fn ssh_rule_priority(mut self, value: u16) -> Self {
        self.ssh_rule_priority = value;
        self
    }

    /// Builds and validates the [`DeploymentRequest`], trimming string inputs.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] when a required field is empty, no
    /// credential was supplied, an address prefix is malformed or the subnet
    /// lies outside the network, or the SSH rule settings are out of range.
    pub fn build(self) -> Result<DeploymentRequest, RequestError> {
        let credential = self.credential.ok_or(RequestError::MissingCredential)?;
        let image = ImageReference {
            publisher: required(&self.image.publisher, "image_publisher")?,
            offer: required(&self.image.offer, "image_offer")?,
            sku: required(&self.image.sku, "image_sku")?,
            version: required(&self.image.version, "image_version")?,
        };

        let vnet_address_prefix = required(&self.vnet_address_prefix, "vnet_address_prefix")?;
        let subnet_address_prefix =
            required(&self.subnet_address_prefix, "subnet_address_prefix")?;
        let network = Cidr::parse("vnet_address_prefix", &vnet_address_prefix)?;
        let subnet = Cidr::parse("subnet_address_prefix", &subnet_address_prefix)?;
        if !network.contains(&subnet) {
            return Err(RequestError::SubnetOutsideNetwork {
                subnet: subnet_address_prefix,
                network: vnet_address_prefix,
            });
        }

        if self.ssh_port == 0 {
            return Err(RequestError::InvalidPort);
        }
        if !(MIN_RULE_PRIORITY..=MAX_RULE_PRIORITY).contains(&self.ssh_rule_priority) {
            return Err(RequestError::InvalidPriority(self.ssh_rule_priority));
        }
        let ssh_rule = SecurityRule::inbound_ssh(
            required(&self.ssh_rule_name, "ssh_rule_name")?,
            self.ssh_port,
            required(&self.ssh_source_address_prefix, "ssh_source_address_prefix")?,
            self.ssh_rule_priority,
        );

        Ok(DeploymentRequest {
            resource_group: required(&self.resource_group, "resource_group")?,
            location: required(&self.location, "location")?,
            vm_name: required(&self.vm_name, "vm_name")?,
            vnet_name: required(&self.vnet_name, "vnet_name")?,
            subnet_name: required(&self.subnet_name, "subnet_name")?,
            nic_name: required(&self.nic_name, "nic_name")?,
            public_ip_name: required(&self.public_ip_name, "public_ip_name")?,
            nsg_name: required(&self.nsg_name, "nsg_name")?,
            vm_size: required(&self.vm_size, "vm_size")?,
            image,
            os_disk_storage_type: required(&self.os_disk_storage_type, "os_disk_storage_type")?,
            admin_username: required(&self.admin_username, "admin_username")?,
            credential,
            vnet_address_prefix,
            subnet_address_prefix,
            ip_configuration_name: required(&self.ip_configuration_name, "ip_configuration_name")?,
            ssh_rule,
        })
    }
}

fn required(value: &str, field: &str) -> Result<String, RequestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RequestError::Validation(field.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Parsed `address/length` prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Cidr {
    address: IpAddr,
    prefix_len: u8,
}

impl Cidr {
    fn parse(field: &str, value: &str) -> Result<Self, RequestError> {
        let invalid = || RequestError::InvalidCidr {
            field: field.to_owned(),
            value: value.to_owned(),
        };
        let (address_part, len_part) = value.split_once('/').ok_or_else(invalid)?;
        let address = IpAddr::from_str(address_part).map_err(|_| invalid())?;
        let prefix_len = u8::from_str(len_part).map_err(|_| invalid())?;
        let max_len = if address.is_ipv4() { 32 } else { 128 };
        if prefix_len > max_len {
            return Err(invalid());
        }
        let cidr = Self {
            address,
            prefix_len,
        };
        // Azure rejects prefixes whose host bits are set.
        if cidr.network_bits() != address_bits(address) {
            return Err(invalid());
        }
        Ok(cidr)
    }

    fn mask(&self) -> u128 {
        let width = if self.address.is_ipv4() { 32 } else { 128 };
        let ones = u128::MAX
            .checked_shl(128 - u32::from(self.prefix_len))
            .unwrap_or(0);
        ones.checked_shr(128 - width).unwrap_or(0)
    }

    fn network_bits(&self) -> u128 {
        address_bits(self.address) & self.mask()
    }

    fn contains_address(&self, address: IpAddr) -> bool {
        self.address.is_ipv4() == address.is_ipv4()
            && address_bits(address) & self.mask() == self.network_bits()
    }

    fn contains(&self, other: &Self) -> bool {
        other.prefix_len >= self.prefix_len && self.contains_address(other.address)
    }
}

fn address_bits(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(v4) => u128::from(u32::from(v4)),
        IpAddr::V6(v6) => u128::from(v6),
    }
}
