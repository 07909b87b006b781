//! Error types for the user manager.

use zos_principal::StoreError;

/// Errors from user manager operations.
///
/// Unknown or malformed paths are not errors: resolution answers `Ok(None)`
/// for them. Unconvertible values are not errors either.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UserManagerError {
    /// The principal store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A write was attempted on a read-only property view.
    #[error("property view is read-only: {operation} not supported")]
    ReadOnly {
        /// The rejected operation
        operation: &'static str,
    },

    /// A lazy sequence was advanced after it had already reported its end.
    #[error("sequence advanced after it was exhausted")]
    Exhausted,

    /// Configuration is well-formed but not acceptable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("configuration parse error: {0}")]
    Config(String),
}

impl UserManagerError {
    /// Create a read-only violation error.
    pub fn read_only(operation: &'static str) -> Self {
        Self::ReadOnly { operation }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Check if this is a read-only violation.
    pub fn is_read_only(&self) -> bool {
        matches!(self, UserManagerError::ReadOnly { .. })
    }

    /// Check if this error came from the principal store.
    pub fn is_store(&self) -> bool {
        matches!(self, UserManagerError::Store(_))
    }
}

impl From<serde_json::Error> for UserManagerError {
    fn from(e: serde_json::Error) -> Self {
        UserManagerError::Config(e.to_string())
    }
}

/// Result alias for user manager operations.
pub type Result<T> = std::result::Result<T, UserManagerError>;
