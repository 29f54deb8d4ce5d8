//! Orchestrates the single-VM deployment.
//!
//! The workflow ensures, in order, the resource group, the network security
//! group and its SSH rule, the virtual network and subnet, the public IP, the
//! network interface, and the virtual machine. Every step checks for the
//! resource first and only creates it when the control plane reports it
//! missing. Identifiers flow forward: the security group ID binds the subnet,
//! and the subnet and public IP IDs wire the network interface. Finally the
//! public IP is fetched again to read the assigned address.

mod error;
mod report;

use tracing::{debug, info};

use crate::backend::{Backend, Lookup};
use crate::request::DeploymentRequest;
use crate::resources::{
    IpAllocation, NetworkInterfaceParameters, OsProfile, PublicIpParameters, Resource,
    ResourceGroupParameters, ResourceKind, ResourceRef, ResourceSpec, SecurityGroupParameters,
    SubnetParameters, VirtualMachineParameters, VirtualNetworkParameters,
};

pub use error::ProvisionError;
pub use report::{
    ProgressEvent, ProgressReporter, ProvisionOutcome, RecordingReporter, SshEndpoint,
    StdoutReporter,
};

/// Drives the deployment against a backend, reporting progress as it goes.
#[derive(Debug)]
pub struct ProvisionOrchestrator<B, R> {
    backend: B,
    reporter: R,
}

impl<B, R> ProvisionOrchestrator<B, R>
where
    B: Backend,
    R: ProgressReporter,
{
    /// Creates a new orchestrator.
    #[must_use]
    pub const fn new(backend: B, reporter: R) -> Self {
        Self { backend, reporter }
    }

    /// Runs the deployment and returns the SSH endpoint of the VM.
    ///
    /// Steps run strictly in sequence; each awaits its remote operation
    /// before the next begins.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] as soon as any lookup or creation fails, or
    /// when the public IP has no address once the VM is in place.
    pub async fn execute(
        &self,
        request: &DeploymentRequest,
    ) -> Result<ProvisionOutcome, ProvisionError<B::Error>> {
        let group = request.resource_group.as_str();
        self.reporter.report(&ProgressEvent::Started {
            resource_group: group.to_owned(),
            location: request.location.clone(),
        });
        let mut created = Vec::new();

        self.ensure(
            &ResourceRef::resource_group(group),
            &ResourceSpec::ResourceGroup(ResourceGroupParameters {
                location: request.location.clone(),
            }),
            &mut created,
        )
        .await?;

        let security_group = self
            .ensure(
                &ResourceRef::top_level(
                    ResourceKind::NetworkSecurityGroup,
                    group,
                    &request.nsg_name,
                ),
                &ResourceSpec::NetworkSecurityGroup(SecurityGroupParameters {
                    location: request.location.clone(),
                }),
                &mut created,
            )
            .await?;

        self.ensure(
            &ResourceRef::child(
                ResourceKind::SecurityRule,
                group,
                &request.nsg_name,
                &request.ssh_rule.name,
            ),
            &ResourceSpec::SecurityRule(request.ssh_rule.clone()),
            &mut created,
        )
        .await?;

        self.ensure(
            &ResourceRef::top_level(ResourceKind::VirtualNetwork, group, &request.vnet_name),
            &ResourceSpec::VirtualNetwork(VirtualNetworkParameters {
                location: request.location.clone(),
                address_prefixes: vec![request.vnet_address_prefix.clone()],
            }),
            &mut created,
        )
        .await?;

        let subnet = self
            .ensure(
                &ResourceRef::child(
                    ResourceKind::Subnet,
                    group,
                    &request.vnet_name,
                    &request.subnet_name,
                ),
                &ResourceSpec::Subnet(SubnetParameters {
                    address_prefix: request.subnet_address_prefix.clone(),
                    network_security_group_id: security_group.id,
                }),
                &mut created,
            )
            .await?;

        let public_ip_ref =
            ResourceRef::top_level(ResourceKind::PublicIpAddress, group, &request.public_ip_name);
        let public_ip = self
            .ensure(
                &public_ip_ref,
                &ResourceSpec::PublicIpAddress(PublicIpParameters {
                    location: request.location.clone(),
                    allocation: IpAllocation::Dynamic,
                }),
                &mut created,
            )
            .await?;

        let interface = self
            .ensure(
                &ResourceRef::top_level(ResourceKind::NetworkInterface, group, &request.nic_name),
                &ResourceSpec::NetworkInterface(NetworkInterfaceParameters {
                    location: request.location.clone(),
                    ip_configuration_name: request.ip_configuration_name.clone(),
                    subnet_id: subnet.id,
                    public_ip_id: public_ip.id,
                }),
                &mut created,
            )
            .await?;

        let vm = self
            .ensure(
                &ResourceRef::top_level(ResourceKind::VirtualMachine, group, &request.vm_name),
                &ResourceSpec::VirtualMachine(Box::new(VirtualMachineParameters {
                    location: request.location.clone(),
                    vm_size: request.vm_size.clone(),
                    image: request.image.clone(),
                    os_disk_storage_type: request.os_disk_storage_type.clone(),
                    os_profile: OsProfile::for_credential(
                        &request.vm_name,
                        &request.admin_username,
                        &request.credential,
                    ),
                    network_interface_id: interface.id,
                })),
                &mut created,
            )
            .await?;
        self.reporter.report(&ProgressEvent::Completed {
            vm_name: vm.name.clone(),
        });

        let endpoint = self
            .resolve_endpoint(&public_ip_ref, &request.admin_username)
            .await?;
        info!(vm = %vm.name, %endpoint, "deployment complete");

        Ok(ProvisionOutcome {
            vm_name: vm.name,
            endpoint,
            created,
        })
    }

    async fn ensure(
        &self,
        target: &ResourceRef,
        spec: &ResourceSpec,
        created: &mut Vec<ResourceKind>,
    ) -> Result<Resource, ProvisionError<B::Error>> {
        debug_assert_eq!(spec.kind(), target.kind, "parameters address another kind");
        let lookup = self
            .backend
            .get(target)
            .await
            .map_err(|source| ProvisionError::Lookup {
                kind: target.kind,
                name: target.name.clone(),
                source,
            })?;

        match lookup {
            Lookup::Found(resource) => {
                info!(resource = %target, id = %resource.id, "resource already exists");
                self.reporter.report(&ProgressEvent::AlreadyExists {
                    kind: target.kind,
                    name: target.name.clone(),
                });
                Ok(resource)
            }
            Lookup::NotFound => {
                info!(resource = %target, "creating resource");
                self.reporter.report(&ProgressEvent::Creating {
                    kind: target.kind,
                    name: target.name.clone(),
                });
                let resource = self
                    .backend
                    .create_or_update(target, spec)
                    .await
                    .map_err(|source| ProvisionError::Create {
                        kind: target.kind,
                        name: target.name.clone(),
                        source,
                    })?;
                debug!(resource = %target, id = %resource.id, "resource created");
                created.push(target.kind);
                Ok(resource)
            }
        }
    }

    async fn resolve_endpoint(
        &self,
        public_ip: &ResourceRef,
        username: &str,
    ) -> Result<SshEndpoint, ProvisionError<B::Error>> {
        let missing = || ProvisionError::MissingPublicIp {
            name: public_ip.name.clone(),
        };
        let resource = self
            .backend
            .get(public_ip)
            .await
            .map_err(|source| ProvisionError::Lookup {
                kind: public_ip.kind,
                name: public_ip.name.clone(),
                source,
            })?
            .found()
            .ok_or_else(missing)?;
        let address = resource.ip_address().ok_or_else(missing)?;
        Ok(SshEndpoint {
            username: username.to_owned(),
            address,
        })
    }
}

#[cfg(test)]
mod tests;
