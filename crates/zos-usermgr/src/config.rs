//! Provider configuration and the paths derived from it.

use serde::{Deserialize, Serialize};

use crate::core::path::join_path;
use crate::core::{Result, UserManagerError};

/// Default mount point of the user manager namespace.
pub const DEFAULT_PROVIDER_ROOT: &str = "/system/userManager";

/// Name of the user collection below the provider root.
pub const USERS_SEGMENT: &str = "user";

/// Name of the group collection below the provider root.
pub const GROUPS_SEGMENT: &str = "group";

/// User manager provider configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Root of the virtual namespace
    #[serde(rename = "provider.root", alias = "provider_root")]
    pub provider_root: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider_root: String::from(DEFAULT_PROVIDER_ROOT),
        }
    }
}

impl ProviderConfig {
    /// Configuration with a custom root.
    pub fn with_root(root: impl Into<String>) -> Self {
        Self {
            provider_root: root.into(),
        }
    }

    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.paths()?;
        Ok(config)
    }

    /// Derive the namespace paths.
    pub fn paths(&self) -> Result<UserManagerPaths> {
        UserManagerPaths::new(&self.provider_root)
    }
}

/// The fixed paths of the namespace, all derived from the provider root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserManagerPaths {
    root: String,
    users: String,
    user_prefix: String,
    groups: String,
    group_prefix: String,
}

impl UserManagerPaths {
    /// Derive the paths for a provider root.
    pub fn new(root: &str) -> Result<Self> {
        if root.is_empty() {
            return Err(UserManagerError::invalid_config("provider root is empty"));
        }
        if !root.starts_with('/') {
            return Err(UserManagerError::invalid_config(format!(
                "provider root '{}' must be absolute",
                root
            )));
        }
        if root.contains("//") {
            return Err(UserManagerError::invalid_config(format!(
                "provider root '{}' contains consecutive slashes",
                root
            )));
        }

        let trimmed = root.trim_end_matches('/');
        let root = if trimmed.is_empty() { "/" } else { trimmed };
        let users = join_path(root, USERS_SEGMENT);
        let groups = join_path(root, GROUPS_SEGMENT);

        Ok(Self {
            root: String::from(root),
            user_prefix: format!("{}/", users),
            group_prefix: format!("{}/", groups),
            users,
            groups,
        })
    }

    /// Provider root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// User collection path.
    pub fn users_path(&self) -> &str {
        &self.users
    }

    /// Prefix of every user path (`<users>/`).
    pub fn user_prefix(&self) -> &str {
        &self.user_prefix
    }

    /// Group collection path.
    pub fn groups_path(&self) -> &str {
        &self.groups
    }

    /// Prefix of every group path (`<groups>/`).
    pub fn group_prefix(&self) -> &str {
        &self.group_prefix
    }

    /// Prefix for an authorizable of the given kind.
    pub fn prefix_for(&self, is_group: bool) -> &str {
        if is_group {
            &self.group_prefix
        } else {
            &self.user_prefix
        }
    }
}

impl Default for UserManagerPaths {
    fn default() -> Self {
        match Self::new(DEFAULT_PROVIDER_ROOT) {
            Ok(paths) => paths,
            Err(e) => unreachable!("default provider root is valid: {}", e),
        }
    }
}
