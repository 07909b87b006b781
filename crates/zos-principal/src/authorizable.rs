//! Authorizable and principal store interface.
//!
//! These traits are the whole surface the user manager needs from an
//! identity backend: lookup by id, principal search, per-entity property
//! access, and group membership walks in both directions.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::value::Value;

/// Shared handle to an authorizable held by the store.
pub type AuthorizableRef = Rc<dyn Authorizable>;

/// Lazy cursor over authorizables (membership walks).
pub type AuthorizableIter = Box<dyn Iterator<Item = Result<AuthorizableRef, StoreError>>>;

/// Lazy cursor over principals (principal search).
pub type PrincipalIter = Box<dyn Iterator<Item = Result<Principal, StoreError>>>;

/// A named security principal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Principal name
    pub name: String,
    /// Whether the principal represents a group
    pub group: bool,
}

impl Principal {
    /// Create a non-group principal.
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: false,
        }
    }

    /// Create a group principal.
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: true,
        }
    }
}

/// Principal search filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrincipalKind {
    /// Only non-group principals
    NotGroup,
    /// Only group principals
    Group,
    /// Every principal
    All,
}

impl PrincipalKind {
    /// Check if a principal passes this filter.
    pub fn accepts(&self, principal: &Principal) -> bool {
        match self {
            PrincipalKind::NotGroup => !principal.group,
            PrincipalKind::Group => principal.group,
            PrincipalKind::All => true,
        }
    }
}

/// A user or group record in the backing store.
pub trait Authorizable: fmt::Debug {
    /// Unique identifier.
    fn id(&self) -> &str;

    /// True if this authorizable is a group.
    fn is_group(&self) -> bool;

    /// The principal this authorizable is bound to.
    fn principal(&self) -> Principal;

    /// Canonical repository path. Fails with [`StoreError::Unsupported`]
    /// when the authorizable has no path concept.
    fn path(&self) -> Result<String, StoreError>;

    /// Check whether a property exists at the relative path.
    fn has_property(&self, rel_path: &str) -> Result<bool, StoreError>;

    /// Values of the property at the relative path, `None` if absent.
    fn property(&self, rel_path: &str) -> Result<Option<Vec<Value>>, StoreError>;

    /// Names of the properties directly below the relative path
    /// (empty string for the authorizable itself).
    fn property_names(&self, rel_path: &str) -> Result<Vec<String>, StoreError>;

    /// Members of this group, declared only or transitive.
    fn members(&self, transitive: bool) -> Result<AuthorizableIter, StoreError>;

    /// Groups this authorizable belongs to, declared only or transitive.
    fn member_of(&self, transitive: bool) -> Result<AuthorizableIter, StoreError>;
}

/// Principal/authorizable lookup service.
pub trait PrincipalStore {
    /// Look up an authorizable by id.
    fn authorizable(&self, id: &str) -> Result<Option<AuthorizableRef>, StoreError>;

    /// Look up the authorizable bound to a principal.
    fn authorizable_for(&self, principal: &Principal) -> Result<Option<AuthorizableRef>, StoreError>;

    /// Search principals of the given kind.
    fn search_principals(&self, kind: PrincipalKind) -> Result<PrincipalIter, StoreError>;
}

impl<S: PrincipalStore + ?Sized> PrincipalStore for Rc<S> {
    fn authorizable(&self, id: &str) -> Result<Option<AuthorizableRef>, StoreError> {
        (**self).authorizable(id)
    }

    fn authorizable_for(&self, principal: &Principal) -> Result<Option<AuthorizableRef>, StoreError> {
        (**self).authorizable_for(principal)
    }

    fn search_principals(&self, kind: PrincipalKind) -> Result<PrincipalIter, StoreError> {
        (**self).search_principals(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_kind_filter() {
        let alice = Principal::user("alice");
        let admins = Principal::group("admins");

        assert!(PrincipalKind::NotGroup.accepts(&alice));
        assert!(!PrincipalKind::NotGroup.accepts(&admins));
        assert!(PrincipalKind::Group.accepts(&admins));
        assert!(PrincipalKind::All.accepts(&alice));
        assert!(PrincipalKind::All.accepts(&admins));
    }
}
