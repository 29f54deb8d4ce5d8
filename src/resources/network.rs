//! Parameters for resource groups and networking resources.

use std::fmt;

/// Parameters for creating a resource group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResourceGroupParameters {
    /// Azure region, for example `eastus`.
    pub location: String,
}

/// Parameters for creating a network security group.
///
/// Rules are created separately so they can be checked individually.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecurityGroupParameters {
    /// Azure region.
    pub location: String,
}

/// Transport protocol matched by a security rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RuleProtocol {
    /// TCP only.
    Tcp,
    /// UDP only.
    Udp,
    /// Any protocol.
    Any,
}

impl RuleProtocol {
    /// Wire value understood by the network API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "Tcp",
            Self::Udp => "Udp",
            Self::Any => "*",
        }
    }
}

/// Whether matching traffic is allowed or denied.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RuleAccess {
    /// Permit matching traffic.
    Allow,
    /// Drop matching traffic.
    Deny,
}

impl RuleAccess {
    /// Wire value understood by the network API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "Allow",
            Self::Deny => "Deny",
        }
    }
}

/// Traffic direction evaluated by a security rule.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RuleDirection {
    /// Traffic entering the subnet.
    Inbound,
    /// Traffic leaving the subnet.
    Outbound,
}

impl RuleDirection {
    /// Wire value understood by the network API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inbound => "Inbound",
            Self::Outbound => "Outbound",
        }
    }
}

/// A single security rule inside a network security group.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecurityRule {
    /// Rule name, unique within its security group.
    pub name: String,
    /// Protocol to match.
    pub protocol: RuleProtocol,
    /// Source port or range (`*` for any).
    pub source_port_range: String,
    /// Destination port or range.
    pub destination_port_range: String,
    /// Source CIDR or tag (`*` for any).
    pub source_address_prefix: String,
    /// Destination CIDR or tag.
    pub destination_address_prefix: String,
    /// Allow or deny.
    pub access: RuleAccess,
    /// Evaluation priority; lower numbers win.
    pub priority: u16,
    /// Direction of matched traffic.
    pub direction: RuleDirection,
}

impl SecurityRule {
    /// Builds an inbound TCP allow rule for SSH on `port`.
    ///
    /// The source prefix is caller-supplied; `*` opens the port to the whole
    /// internet.
    #[must_use]
    pub fn inbound_ssh(
        name: impl Into<String>,
        port: u16,
        source_address_prefix: impl Into<String>,
        priority: u16,
    ) -> Self {
        Self {
            name: name.into(),
            protocol: RuleProtocol::Tcp,
            source_port_range: String::from("*"),
            destination_port_range: port.to_string(),
            source_address_prefix: source_address_prefix.into(),
            destination_address_prefix: String::from("*"),
            access: RuleAccess::Allow,
            priority,
            direction: RuleDirection::Inbound,
        }
    }
}

/// Parameters for creating a virtual network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VirtualNetworkParameters {
    /// Azure region.
    pub location: String,
    /// Address space in CIDR notation.
    pub address_prefixes: Vec<String>,
}

/// Parameters for creating a subnet.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubnetParameters {
    /// Subnet range in CIDR notation.
    pub address_prefix: String,
    /// Resource ID of the security group bound to the subnet.
    pub network_security_group_id: String,
}

/// Public IP allocation method.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IpAllocation {
    /// Address assigned when the IP is attached to a running resource.
    Dynamic,
    /// Address reserved at creation.
    Static,
}

impl fmt::Display for IpAllocation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Dynamic => "Dynamic",
            Self::Static => "Static",
        })
    }
}

/// Parameters for creating a public IP address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PublicIpParameters {
    /// Azure region.
    pub location: String,
    /// Allocation method.
    pub allocation: IpAllocation,
}

/// Parameters for creating a network interface with one IP configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkInterfaceParameters {
    /// Azure region.
    pub location: String,
    /// Name of the single IP configuration.
    pub ip_configuration_name: String,
    /// Resource ID of the subnet to join.
    pub subnet_id: String,
    /// Resource ID of the public IP to attach.
    pub public_ip_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_ssh_rule_allows_tcp_on_port() {
        let rule = SecurityRule::inbound_ssh("AllowSSH", 22, "*", 100);

        assert_eq!(rule.protocol, RuleProtocol::Tcp);
        assert_eq!(rule.destination_port_range, "22");
        assert_eq!(rule.direction, RuleDirection::Inbound);
        assert_eq!(rule.access, RuleAccess::Allow);
        assert_eq!(rule.destination_address_prefix, "*");
    }
}
