//! Configuration loading via `ortho-config`.
//!
//! Two layered structures are loaded from defaults, `azdeploy.toml`, and
//! environment variables: [`AzureConfig`] for the control-plane account and
//! [`DeploymentConfig`] for the environment being provisioned.

use std::ffi::OsString;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::{CredentialError, resolve_admin_credential};
use crate::request::{
    DEFAULT_ADMIN_USERNAME, DEFAULT_IMAGE_OFFER, DEFAULT_IMAGE_PUBLISHER, DEFAULT_IMAGE_SKU,
    DEFAULT_IMAGE_VERSION, DEFAULT_IP_CONFIGURATION_NAME, DEFAULT_LOCATION, DEFAULT_NIC_NAME,
    DEFAULT_NSG_NAME, DEFAULT_OS_DISK_STORAGE_TYPE, DEFAULT_PUBLIC_IP_NAME,
    DEFAULT_RESOURCE_GROUP, DEFAULT_SSH_PORT, DEFAULT_SSH_RULE_NAME, DEFAULT_SSH_RULE_PRIORITY,
    DEFAULT_SSH_SOURCE_ADDRESS_PREFIX, DEFAULT_SUBNET_ADDRESS_PREFIX, DEFAULT_SUBNET_NAME,
    DEFAULT_VM_NAME, DEFAULT_VM_SIZE, DEFAULT_VNET_ADDRESS_PREFIX, DEFAULT_VNET_NAME,
    DeploymentRequest, RequestError,
};
use crate::resources::ImageReference;

/// Public Azure Resource Manager endpoint.
pub const DEFAULT_RESOURCE_MANAGER_ENDPOINT: &str = "https://management.azure.com";
/// Public Microsoft Entra authority.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

const CONFIG_FILE: &str = "azdeploy.toml";

/// Azure account settings derived from environment variables and
/// configuration files.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "AZURE",
    discovery(
        app_name = "azdeploy",
        env_var = "AZDEPLOY_CONFIG_PATH",
        config_file_name = "azdeploy.toml",
        dotfile_name = ".azdeploy.toml",
        project_file_name = "azdeploy.toml"
    )
)]
pub struct AzureConfig {
    /// Subscription that owns the deployed resources. Required; the empty
    /// default lets [`AzureConfig::validate`] name the missing setting.
    #[ortho_config(default = String::new())]
    pub subscription_id: String,
    /// Directory (tenant) of the service principal.
    pub tenant_id: Option<String>,
    /// Application (client) ID of the service principal.
    pub client_id: Option<String>,
    /// Client secret of the service principal.
    pub client_secret: Option<String>,
    /// Pre-issued bearer token, for example from
    /// `az account get-access-token`. Takes precedence over the service
    /// principal when set.
    pub access_token: Option<String>,
    /// Resource Manager endpoint. Defaults to the public cloud.
    #[ortho_config(default = DEFAULT_RESOURCE_MANAGER_ENDPOINT.to_owned())]
    pub resource_manager_endpoint: String,
    /// Token authority host. Defaults to the public cloud.
    #[ortho_config(default = DEFAULT_AUTHORITY_HOST.to_owned())]
    pub authority_host: String,
}

/// How the backend obtains bearer tokens.
#[derive(Clone, Eq, PartialEq)]
pub enum CredentialSource {
    /// Use the configured token as-is.
    AccessToken(String),
    /// Exchange service principal credentials for tokens.
    ServicePrincipal {
        /// Directory (tenant) ID.
        tenant_id: String,
        /// Application (client) ID.
        client_id: String,
        /// Client secret.
        client_secret: String,
    },
}

impl std::fmt::Debug for CredentialSource {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessToken(_) => formatter.write_str("AccessToken(<redacted>)"),
            Self::ServicePrincipal {
                tenant_id,
                client_id,
                ..
            } => formatter
                .debug_struct("ServicePrincipal")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }

    fn missing(&self) -> ConfigError {
        ConfigError::MissingField(format!(
            "missing {}: set {} or add {} to {CONFIG_FILE}",
            self.description, self.env_var, self.toml_key
        ))
    }
}

fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(metadata.missing());
    }
    Ok(())
}

fn present(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| raw.trim())
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

impl AzureConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("azdeploy")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Performs semantic validation. Error messages name the environment
    /// variable and configuration key that supply a missing value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when a required field is empty
    /// or no usable credential is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_field(
            &self.subscription_id,
            &FieldMetadata::new(
                "Azure subscription ID",
                "AZURE_SUBSCRIPTION_ID",
                "subscription_id",
            ),
        )?;
        require_field(
            &self.resource_manager_endpoint,
            &FieldMetadata::new(
                "Resource Manager endpoint",
                "AZURE_RESOURCE_MANAGER_ENDPOINT",
                "resource_manager_endpoint",
            ),
        )?;
        require_field(
            &self.authority_host,
            &FieldMetadata::new(
                "token authority host",
                "AZURE_AUTHORITY_HOST",
                "authority_host",
            ),
        )?;
        self.credential_source().map(|_| ())
    }

    /// Selects the credential the backend should use.
    ///
    /// A configured access token wins; otherwise the complete service
    /// principal triple is required.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the first missing part of
    /// the service principal when no access token is configured.
    pub fn credential_source(&self) -> Result<CredentialSource, ConfigError> {
        if let Some(token) = present(self.access_token.as_ref()) {
            return Ok(CredentialSource::AccessToken(token));
        }
        let tenant_id = present(self.tenant_id.as_ref()).ok_or_else(|| {
            FieldMetadata::new("Azure tenant ID", "AZURE_TENANT_ID", "tenant_id").missing()
        })?;
        let client_id = present(self.client_id.as_ref()).ok_or_else(|| {
            FieldMetadata::new("Azure client ID", "AZURE_CLIENT_ID", "client_id").missing()
        })?;
        let client_secret = present(self.client_secret.as_ref()).ok_or_else(|| {
            FieldMetadata::new(
                "Azure client secret",
                "AZURE_CLIENT_SECRET",
                "client_secret",
            )
            .missing()
        })?;
        Ok(CredentialSource::ServicePrincipal {
            tenant_id,
            client_id,
            client_secret,
        })
    }
}

/// Settings for the environment being provisioned. Every field has a
/// default except the administrator credential.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "AZDEPLOY",
    discovery(
        app_name = "azdeploy",
        env_var = "AZDEPLOY_CONFIG_PATH",
        config_file_name = "azdeploy.toml",
        dotfile_name = ".azdeploy.toml",
        project_file_name = "azdeploy.toml"
    )
)]
pub struct DeploymentConfig {
    /// Resource group holding every resource.
    #[ortho_config(default = DEFAULT_RESOURCE_GROUP.to_owned())]
    pub resource_group: String,
    /// Azure region.
    #[ortho_config(default = DEFAULT_LOCATION.to_owned())]
    pub location: String,
    /// Virtual machine name.
    #[ortho_config(default = DEFAULT_VM_NAME.to_owned())]
    pub vm_name: String,
    /// Virtual network name.
    #[ortho_config(default = DEFAULT_VNET_NAME.to_owned())]
    pub vnet_name: String,
    /// Subnet name.
    #[ortho_config(default = DEFAULT_SUBNET_NAME.to_owned())]
    pub subnet_name: String,
    /// Network interface name.
    #[ortho_config(default = DEFAULT_NIC_NAME.to_owned())]
    pub nic_name: String,
    /// Public IP name.
    #[ortho_config(default = DEFAULT_PUBLIC_IP_NAME.to_owned())]
    pub public_ip_name: String,
    /// Network security group name.
    #[ortho_config(default = DEFAULT_NSG_NAME.to_owned())]
    pub nsg_name: String,
    /// VM size class. Defaults to `Standard_B1s`.
    #[ortho_config(default = DEFAULT_VM_SIZE.to_owned())]
    pub vm_size: String,
    /// Image publisher.
    #[ortho_config(default = DEFAULT_IMAGE_PUBLISHER.to_owned())]
    pub image_publisher: String,
    /// Image offer.
    #[ortho_config(default = DEFAULT_IMAGE_OFFER.to_owned())]
    pub image_offer: String,
    /// Image SKU.
    #[ortho_config(default = DEFAULT_IMAGE_SKU.to_owned())]
    pub image_sku: String,
    /// Image version.
    #[ortho_config(default = DEFAULT_IMAGE_VERSION.to_owned())]
    pub image_version: String,
    /// Managed disk storage type for the OS disk.
    #[ortho_config(default = DEFAULT_OS_DISK_STORAGE_TYPE.to_owned())]
    pub os_disk_storage_type: String,
    /// Administrator user name.
    #[ortho_config(default = DEFAULT_ADMIN_USERNAME.to_owned())]
    pub admin_username: String,
    /// Administrator password. Mutually exclusive with the key settings.
    pub admin_password: Option<String>,
    /// Inline OpenSSH public key for the administrator.
    pub admin_ssh_public_key: Option<String>,
    /// Path to an OpenSSH public key file (`~/` is expanded).
    pub admin_ssh_public_key_file: Option<String>,
    /// Virtual network address space.
    #[ortho_config(default = DEFAULT_VNET_ADDRESS_PREFIX.to_owned())]
    pub vnet_address_prefix: String,
    /// Subnet address range; must lie inside the network.
    #[ortho_config(default = DEFAULT_SUBNET_ADDRESS_PREFIX.to_owned())]
    pub subnet_address_prefix: String,
    /// Name of the NIC's IP configuration.
    #[ortho_config(default = DEFAULT_IP_CONFIGURATION_NAME.to_owned())]
    pub ip_configuration_name: String,
    /// Name of the inbound SSH rule.
    #[ortho_config(default = DEFAULT_SSH_RULE_NAME.to_owned())]
    pub ssh_rule_name: String,
    /// Port opened by the SSH rule.
    #[ortho_config(default = DEFAULT_SSH_PORT)]
    pub ssh_port: u16,
    /// Source prefix admitted by the SSH rule. The default `*` admits every
    /// address.
    #[ortho_config(default = DEFAULT_SSH_SOURCE_ADDRESS_PREFIX.to_owned())]
    pub ssh_source_address_prefix: String,
    /// Priority of the SSH rule (100-4096).
    #[ortho_config(default = DEFAULT_SSH_RULE_PRIORITY)]
    pub ssh_rule_priority: u16,
}

impl DeploymentConfig {
    /// Loads configuration without attempting to parse CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("azdeploy")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Resolves the administrator credential and builds a validated
    /// [`DeploymentRequest`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Credential`] when the credential sources are
    /// missing, conflicting, or unreadable, and [`ConfigError::Request`]
    /// when request validation fails.
    pub fn as_request(&self) -> Result<DeploymentRequest, ConfigError> {
        let credential = resolve_admin_credential(
            self.admin_password.as_deref(),
            self.admin_ssh_public_key.as_deref(),
            self.admin_ssh_public_key_file.as_deref(),
        )?;

        let request = DeploymentRequest::builder()
            .resource_group(&self.resource_group)
            .location(&self.location)
            .vm_name(&self.vm_name)
            .vnet_name(&self.vnet_name)
            .subnet_name(&self.subnet_name)
            .nic_name(&self.nic_name)
            .public_ip_name(&self.public_ip_name)
            .nsg_name(&self.nsg_name)
            .vm_size(&self.vm_size)
            .image(ImageReference {
                publisher: self.image_publisher.clone(),
                offer: self.image_offer.clone(),
                sku: self.image_sku.clone(),
                version: self.image_version.clone(),
            })
            .os_disk_storage_type(&self.os_disk_storage_type)
            .admin_username(&self.admin_username)
            .credential(credential)
            .vnet_address_prefix(&self.vnet_address_prefix)
            .subnet_address_prefix(&self.subnet_address_prefix)
            .ip_configuration_name(&self.ip_configuration_name)
            .ssh_rule_name(&self.ssh_rule_name)
            .ssh_port(self.ssh_port)
            .ssh_source_address_prefix(&self.ssh_source_address_prefix)
            .ssh_rule_priority(self.ssh_rule_priority)
            .build()?;
        Ok(request)
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when the administrator credential cannot be resolved.
    #[error("administrator credential: {0}")]
    Credential(#[from] CredentialError),
    /// Raised when the deployment parameters fail validation.
    #[error("invalid deployment: {0}")]
    Request(#[from] RequestError),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
