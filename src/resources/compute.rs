//! Parameters for the virtual machine and its OS profile.

use std::fmt;

/// Authentication material for the VM administrator account.
#[derive(Clone, Eq, PartialEq)]
pub enum AdminCredential {
    /// Password login; SSH keys are not installed.
    Password(String),
    /// OpenSSH public key installed as the only authorised key.
    SshPublicKey(String),
}

impl fmt::Debug for AdminCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password(_) => formatter.write_str("Password(<redacted>)"),
            Self::SshPublicKey(key) => formatter.debug_tuple("SshPublicKey").field(key).finish(),
        }
    }
}

/// Marketplace image reference.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageReference {
    /// Image publisher, for example `Canonical`.
    pub publisher: String,
    /// Image offer, for example `UbuntuServer`.
    pub offer: String,
    /// Image SKU, for example `18.04-LTS`.
    pub sku: String,
    /// Image version or `latest`.
    pub version: String,
}

impl fmt::Display for ImageReference {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}:{}:{}",
            self.publisher, self.offer, self.sku, self.version
        )
    }
}

/// Authorised key entry for the administrator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SshPublicKey {
    /// Absolute path of the `authorized_keys` file on the VM.
    pub path: String,
    /// Key material in OpenSSH format.
    pub key_data: String,
}

/// Linux-specific OS settings.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LinuxConfiguration {
    /// Whether password login is disabled.
    pub disable_password_authentication: bool,
    /// Keys installed for the administrator.
    pub ssh_public_keys: Vec<SshPublicKey>,
}

/// OS profile: host name and administrator account.
#[derive(Clone, Eq, PartialEq)]
pub struct OsProfile {
    /// Host name of the VM.
    pub computer_name: String,
    /// Administrator user name.
    pub admin_username: String,
    /// Administrator password when password login is used.
    pub admin_password: Option<String>,
    /// Linux settings.
    pub linux: LinuxConfiguration,
}

impl OsProfile {
    /// Builds a profile for `admin_username` authenticated by `credential`.
    ///
    /// A public key disables password login and installs the key under the
    /// user's home directory. A password leaves password login enabled and
    /// installs no key.
    #[must_use]
    pub fn for_credential(
        computer_name: impl Into<String>,
        admin_username: impl Into<String>,
        credential: &AdminCredential,
    ) -> Self {
        let username = admin_username.into();
        let (admin_password, linux) = match credential {
            AdminCredential::Password(password) => (
                Some(password.clone()),
                LinuxConfiguration {
                    disable_password_authentication: false,
                    ssh_public_keys: Vec::new(),
                },
            ),
            AdminCredential::SshPublicKey(key) => (
                None,
                LinuxConfiguration {
                    disable_password_authentication: true,
                    ssh_public_keys: vec![SshPublicKey {
                        path: format!("/home/{username}/.ssh/authorized_keys"),
                        key_data: key.clone(),
                    }],
                },
            ),
        };
        Self {
            computer_name: computer_name.into(),
            admin_username: username,
            admin_password,
            linux,
        }
    }
}

impl fmt::Debug for OsProfile {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OsProfile")
            .field("computer_name", &self.computer_name)
            .field("admin_username", &self.admin_username)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .field("linux", &self.linux)
            .finish()
    }
}

/// Parameters for creating the virtual machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VirtualMachineParameters {
    /// Azure region.
    pub location: String,
    /// Size class, for example `Standard_B1s`.
    pub vm_size: String,
    /// Boot image.
    pub image: ImageReference,
    /// Managed disk storage type for the OS disk.
    pub os_disk_storage_type: String,
    /// Host name and administrator account.
    pub os_profile: OsProfile,
    /// Resource ID of the network interface to attach.
    pub network_interface_id: String,
}
