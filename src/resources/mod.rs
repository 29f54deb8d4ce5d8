//! Typed model of the Azure resources managed by a deployment.
//!
//! Resources are addressed by a [`ResourceRef`] (kind, resource group,
//! optional parent, name) and described for creation by a [`ResourceSpec`].
//! The control plane reports them back as a [`Resource`].

mod compute;
mod network;

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::Deserialize;

pub use compute::{
    AdminCredential, ImageReference, LinuxConfiguration, OsProfile, SshPublicKey,
    VirtualMachineParameters,
};
pub use network::{
    IpAllocation, NetworkInterfaceParameters, PublicIpParameters, ResourceGroupParameters,
    RuleAccess, RuleDirection, RuleProtocol, SecurityGroupParameters, SecurityRule,
    SubnetParameters, VirtualNetworkParameters,
};

/// Resource kinds provisioned by the workflow, in dependency order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceKind {
    /// Container scoping every other resource.
    ResourceGroup,
    /// Firewall policy bound to the subnet.
    NetworkSecurityGroup,
    /// Single rule inside a network security group.
    SecurityRule,
    /// Virtual network holding the subnet.
    VirtualNetwork,
    /// Address range inside the virtual network.
    Subnet,
    /// Internet-facing address attached to the network interface.
    PublicIpAddress,
    /// Interface joining the VM to the subnet and public IP.
    NetworkInterface,
    /// The compute instance itself.
    VirtualMachine,
}

impl ResourceKind {
    /// Human-readable label used in progress output and errors.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ResourceGroup => "resource group",
            Self::NetworkSecurityGroup => "network security group",
            Self::SecurityRule => "security rule",
            Self::VirtualNetwork => "virtual network",
            Self::Subnet => "subnet",
            Self::PublicIpAddress => "public IP address",
            Self::NetworkInterface => "network interface",
            Self::VirtualMachine => "virtual machine",
        }
    }

    const fn provider_path(self) -> Option<&'static str> {
        match self {
            Self::ResourceGroup => None,
            Self::NetworkSecurityGroup | Self::SecurityRule => {
                Some("Microsoft.Network/networkSecurityGroups")
            }
            Self::VirtualNetwork | Self::Subnet => Some("Microsoft.Network/virtualNetworks"),
            Self::PublicIpAddress => Some("Microsoft.Network/publicIPAddresses"),
            Self::NetworkInterface => Some("Microsoft.Network/networkInterfaces"),
            Self::VirtualMachine => Some("Microsoft.Compute/virtualMachines"),
        }
    }

    const fn child_segment(self) -> Option<&'static str> {
        match self {
            Self::SecurityRule => Some("securityRules"),
            Self::Subnet => Some("subnets"),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// Address of a resource inside a resource group.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ResourceRef {
    /// Kind of resource addressed.
    pub kind: ResourceKind,
    /// Owning resource group.
    pub resource_group: String,
    /// Parent resource name for child kinds (security rules, subnets).
    pub parent: Option<String>,
    /// Resource name.
    pub name: String,
}

impl ResourceRef {
    /// Addresses a resource group.
    #[must_use]
    pub fn resource_group(name: impl Into<String>) -> Self {
        let group = name.into();
        Self {
            kind: ResourceKind::ResourceGroup,
            resource_group: group.clone(),
            parent: None,
            name: group,
        }
    }

    /// Addresses a top-level resource inside a resource group.
    #[must_use]
    pub fn top_level(
        kind: ResourceKind,
        resource_group: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            resource_group: resource_group.into(),
            parent: None,
            name: name.into(),
        }
    }

    /// Addresses a child resource such as a subnet or security rule.
    #[must_use]
    pub fn child(
        kind: ResourceKind,
        resource_group: impl Into<String>,
        parent: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            resource_group: resource_group.into(),
            parent: Some(parent.into()),
            name: name.into(),
        }
    }

    /// Renders the Azure resource ID for this address.
    ///
    /// The ID doubles as the request path on the Resource Manager endpoint.
    #[must_use]
    pub fn resource_id(&self, subscription_id: &str) -> String {
        let group_path = format!(
            "/subscriptions/{subscription_id}/resourceGroups/{}",
            self.resource_group
        );
        let Some(provider) = self.kind.provider_path() else {
            return group_path;
        };
        match (&self.parent, self.kind.child_segment()) {
            (Some(parent), Some(segment)) => format!(
                "{group_path}/providers/{provider}/{parent}/{segment}/{}",
                self.name
            ),
            _ => format!("{group_path}/providers/{provider}/{}", self.name),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(formatter, "{} '{parent}/{}'", self.kind, self.name),
            None => write!(formatter, "{} '{}'", self.kind, self.name),
        }
    }
}

/// Resource as reported by the control plane.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Resource {
    /// Provider-assigned resource ID.
    pub id: String,
    /// Resource name.
    pub name: String,
    /// Kind-specific properties, kept untyped.
    #[serde(default)]
    pub properties: serde_json::Value,
}

impl Resource {
    /// Returns the assigned IP address of a public IP resource, if any.
    #[must_use]
    pub fn ip_address(&self) -> Option<IpAddr> {
        self.properties
            .get("ipAddress")
            .and_then(serde_json::Value::as_str)
            .and_then(|raw| IpAddr::from_str(raw).ok())
    }

    /// Returns the reported provisioning state, if any.
    #[must_use]
    pub fn provisioning_state(&self) -> Option<&str> {
        self.properties
            .get("provisioningState")
            .and_then(serde_json::Value::as_str)
    }
}

/// Create parameters for each resource kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceSpec {
    /// Resource group parameters.
    ResourceGroup(ResourceGroupParameters),
    /// Network security group parameters.
    NetworkSecurityGroup(SecurityGroupParameters),
    /// Security rule parameters.
    SecurityRule(SecurityRule),
    /// Virtual network parameters.
    VirtualNetwork(VirtualNetworkParameters),
    /// Subnet parameters.
    Subnet(SubnetParameters),
    /// Public IP parameters.
    PublicIpAddress(PublicIpParameters),
    /// Network interface parameters.
    NetworkInterface(NetworkInterfaceParameters),
    /// Virtual machine parameters.
    VirtualMachine(Box<VirtualMachineParameters>),
}

impl ResourceSpec {
    /// Kind of resource these parameters create.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::ResourceGroup(_) => ResourceKind::ResourceGroup,
            Self::NetworkSecurityGroup(_) => ResourceKind::NetworkSecurityGroup,
            Self::SecurityRule(_) => ResourceKind::SecurityRule,
            Self::VirtualNetwork(_) => ResourceKind::VirtualNetwork,
            Self::Subnet(_) => ResourceKind::Subnet,
            Self::PublicIpAddress(_) => ResourceKind::PublicIpAddress,
            Self::NetworkInterface(_) => ResourceKind::NetworkInterface,
            Self::VirtualMachine(_) => ResourceKind::VirtualMachine,
        }
    }
}
