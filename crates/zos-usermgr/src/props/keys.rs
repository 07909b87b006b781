//! Key sources of a property view.
//!
//! A view answers a key by consulting its sources in a fixed order. The
//! same table drives single-key reads and full materialization, so a
//! synthetic key always wins over a stored property of the same name.

use zos_principal::{Authorizable, AuthorizableIter, StoreError};

use crate::coerce::PropertyValue;
use crate::config::UserManagerPaths;
use crate::core::format_authorizable_path;

/// Keys computed by the view rather than read from property storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyntheticKey {
    /// Transitive members of a group
    Members,
    /// Declared members of a group
    DeclaredMembers,
    /// Transitive group memberships
    MemberOf,
    /// Declared group memberships
    DeclaredMemberOf,
    /// Canonical repository path
    Path,
}

impl SyntheticKey {
    /// Property name of this key.
    pub const fn name(&self) -> &'static str {
        match self {
            SyntheticKey::Members => "members",
            SyntheticKey::DeclaredMembers => "declaredMembers",
            SyntheticKey::MemberOf => "memberOf",
            SyntheticKey::DeclaredMemberOf => "declaredMemberOf",
            SyntheticKey::Path => "path",
        }
    }

    /// Whether the key exists for this authorizable. Member lists only
    /// exist on groups.
    pub fn applies_to(&self, entity: &dyn Authorizable) -> bool {
        match self {
            SyntheticKey::Members | SyntheticKey::DeclaredMembers => entity.is_group(),
            SyntheticKey::MemberOf | SyntheticKey::DeclaredMemberOf | SyntheticKey::Path => true,
        }
    }

    /// Compute the value. `Ok(None)` means the key is absent for this
    /// authorizable (no path concept).
    pub fn compute(
        &self,
        entity: &dyn Authorizable,
        paths: &UserManagerPaths,
    ) -> Result<Option<PropertyValue>, StoreError> {
        match self {
            SyntheticKey::Members => membership_paths(entity.members(true)?, paths).map(Some),
            SyntheticKey::DeclaredMembers => {
                membership_paths(entity.members(false)?, paths).map(Some)
            }
            SyntheticKey::MemberOf => membership_paths(entity.member_of(true)?, paths).map(Some),
            SyntheticKey::DeclaredMemberOf => {
                membership_paths(entity.member_of(false)?, paths).map(Some)
            }
            SyntheticKey::Path => match entity.path() {
                Ok(path) => Ok(Some(PropertyValue::String(path))),
                Err(e) if e.is_unsupported() => Ok(None),
                Err(e) => Err(e),
            },
        }
    }
}

/// Format every related authorizable as a virtual path, in store order.
fn membership_paths(
    related: AuthorizableIter,
    paths: &UserManagerPaths,
) -> Result<PropertyValue, StoreError> {
    let mut formatted = Vec::new();
    for entity in related {
        let entity = entity?;
        formatted.push(format_authorizable_path(paths, entity.id(), entity.is_group()));
    }
    Ok(PropertyValue::strings(formatted))
}

/// One step of key resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeySource {
    /// A computed key
    Synthetic(SyntheticKey),
    /// Direct lookup in property storage
    Stored,
}

/// Sources of an authorizable's root view, in resolution order.
pub const ROOT_SOURCES: &[KeySource] = &[
    KeySource::Synthetic(SyntheticKey::Members),
    KeySource::Synthetic(SyntheticKey::DeclaredMembers),
    KeySource::Synthetic(SyntheticKey::MemberOf),
    KeySource::Synthetic(SyntheticKey::DeclaredMemberOf),
    KeySource::Synthetic(SyntheticKey::Path),
    KeySource::Stored,
];

/// Sources of a nested property group view.
pub const NESTED_SOURCES: &[KeySource] = &[KeySource::Stored];

/// The synthetic key claiming `name` for this authorizable, if any.
pub fn claimed_by(
    sources: &[KeySource],
    name: &str,
    entity: &dyn Authorizable,
) -> Option<SyntheticKey> {
    sources.iter().find_map(|source| match source {
        KeySource::Synthetic(key) if key.name() == name && key.applies_to(entity) => Some(*key),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use zos_principal::{MemoryPrincipalStore, PrincipalStore};

    fn store() -> MemoryPrincipalStore {
        let store = MemoryPrincipalStore::new();
        store.add_user("alice");
        store.add_group("staff");
        store.add_member("staff", "alice").unwrap();
        store
    }

    #[test]
    fn test_member_keys_only_apply_to_groups() {
        let store = store();
        let alice = store.authorizable("alice").unwrap().unwrap();
        let staff = store.authorizable("staff").unwrap().unwrap();
        assert!(!SyntheticKey::Members.applies_to(alice.as_ref()));
        assert!(SyntheticKey::Members.applies_to(staff.as_ref()));
        assert!(SyntheticKey::MemberOf.applies_to(alice.as_ref()));

        assert_eq!(claimed_by(ROOT_SOURCES, "members", alice.as_ref()), None);
        assert_eq!(
            claimed_by(ROOT_SOURCES, "members", staff.as_ref()),
            Some(SyntheticKey::Members)
        );
        assert_eq!(claimed_by(NESTED_SOURCES, "path", staff.as_ref()), None);
    }

    #[test]
    fn test_compute_membership() {
        let store = store();
        let paths = UserManagerPaths::default();
        let alice = store.authorizable("alice").unwrap().unwrap();
        let staff = store.authorizable("staff").unwrap().unwrap();

        let members = SyntheticKey::Members
            .compute(staff.as_ref(), &paths)
            .unwrap()
            .unwrap();
        assert_eq!(members.string_items(), vec!["/system/userManager/user/alice"]);

        let groups = SyntheticKey::DeclaredMemberOf
            .compute(alice.as_ref(), &paths)
            .unwrap()
            .unwrap();
        assert_eq!(groups.string_items(), vec!["/system/userManager/group/staff"]);
    }

    #[test]
    fn test_compute_path() {
        let store = store();
        let paths = UserManagerPaths::default();
        let alice = store.authorizable("alice").unwrap().unwrap();
        assert_eq!(
            SyntheticKey::Path.compute(alice.as_ref(), &paths).unwrap(),
            Some(PropertyValue::from("/home/users/alice"))
        );

        store.set_path_supported("alice", false).unwrap();
        assert_eq!(SyntheticKey::Path.compute(alice.as_ref(), &paths).unwrap(), None);

        store.fail_after(0);
        assert!(SyntheticKey::Path.compute(alice.as_ref(), &paths).is_err());
    }
}
