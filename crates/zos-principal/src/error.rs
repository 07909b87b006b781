//! Error types for the principal store.

use serde::{Deserialize, Serialize};

/// Errors reported by a principal store or one of its value cells.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum StoreError {
    /// The authorizable does not support the requested concept (e.g. it has no path).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A value cell cannot be read as the requested type.
    #[error("cannot read {from} value as {to}")]
    ValueFormat {
        /// Native type of the cell
        from: String,
        /// Requested type
        to: String,
    },

    /// A group-only operation was invoked on a non-group authorizable.
    #[error("authorizable '{0}' is not a group")]
    NotAGroup(String),

    /// Backend failure while accessing the repository.
    #[error("repository error: {0}")]
    Repository(String),
}

impl StoreError {
    /// Create an unsupported error with message.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Create a repository error with message.
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a value format error.
    pub fn value_format(from: &str, to: &str) -> Self {
        Self::ValueFormat {
            from: String::from(from),
            to: String::from(to),
        }
    }

    /// Check if this error only means the concept is not available.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, StoreError::Unsupported(_))
    }

    /// Check if this is a value conversion error.
    pub fn is_value_format(&self) -> bool {
        matches!(self, StoreError::ValueFormat { .. })
    }
}
