//! In-memory principal store for testing.
//!
//! Keeps users, groups and their properties in a `BTreeMap`. Handles read
//! the live state, so mutations made through the store after a handle was
//! obtained are visible through it. Every backend read is counted, and a
//! failure can be injected after a given number of further reads.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::rc::Rc;

use crate::authorizable::{
    Authorizable, AuthorizableIter, AuthorizableRef, Principal, PrincipalIter, PrincipalKind,
    PrincipalStore,
};
use crate::error::StoreError;
use crate::value::Value;

#[derive(Debug)]
struct Record {
    id: String,
    group: bool,
    /// Relative property path -> values
    properties: BTreeMap<String, Vec<Value>>,
    /// Declared member ids (groups only)
    members: Vec<String>,
    path_supported: bool,
}

#[derive(Debug, Default)]
struct State {
    records: BTreeMap<String, Record>,
    /// Principals in registration order
    principals: Vec<Principal>,
}

#[derive(Debug, Default)]
struct Inner {
    state: RefCell<State>,
    accesses: Cell<u64>,
    /// Remaining successful accesses before injected failures start
    budget: Cell<Option<u64>>,
}

impl Inner {
    fn touch(&self, op: &str) -> Result<(), StoreError> {
        self.accesses.set(self.accesses.get() + 1);
        if let Some(left) = self.budget.get() {
            if left == 0 {
                return Err(StoreError::repository(format!(
                    "injected failure during {}",
                    op
                )));
            }
            self.budget.set(Some(left - 1));
        }
        Ok(())
    }

    fn handle(self: &Rc<Self>, id: &str) -> Option<AuthorizableRef> {
        let state = self.state.borrow();
        let record = state.records.get(id)?;
        Some(Rc::new(MemoryAuthorizable {
            inner: Rc::clone(self),
            id: record.id.clone(),
            group: record.group,
        }))
    }

    fn with_record<T>(&self, id: &str, f: impl FnOnce(&Record) -> T) -> Result<T, StoreError> {
        let state = self.state.borrow();
        let record = state
            .records
            .get(id)
            .ok_or_else(|| StoreError::repository(format!("authorizable '{}' was removed", id)))?;
        Ok(f(record))
    }

    /// Breadth-first walk from `start`, without duplicates and safe on cycles.
    fn walk(&self, start: &str, transitive: bool, step: fn(&State, &str) -> Vec<String>) -> Vec<String> {
        let state = self.state.borrow();
        let mut seen = BTreeSet::new();
        seen.insert(String::from(start));

        let mut out = Vec::new();
        let mut queue: VecDeque<String> = step(&state, start).into();
        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.clone()) {
                continue;
            }
            if transitive {
                queue.extend(step(&state, &id));
            }
            out.push(id);
        }
        out
    }

    fn iter_ids(self: &Rc<Self>, ids: Vec<String>) -> AuthorizableIter {
        let inner = Rc::clone(self);
        Box::new(ids.into_iter().map(move |id| {
            inner.touch("membership iteration")?;
            inner
                .handle(&id)
                .ok_or_else(|| StoreError::repository(format!("authorizable '{}' was removed", id)))
        }))
    }
}

fn declared_members(state: &State, id: &str) -> Vec<String> {
    state
        .records
        .get(id)
        .map(|r| r.members.clone())
        .unwrap_or_default()
}

fn declared_groups(state: &State, id: &str) -> Vec<String> {
    state
        .records
        .values()
        .filter(|r| r.group && r.members.iter().any(|m| m == id))
        .map(|r| r.id.clone())
        .collect()
}

/// In-memory principal store for testing.
#[derive(Clone, Debug, Default)]
pub struct MemoryPrincipalStore {
    inner: Rc<Inner>,
}

impl MemoryPrincipalStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, id: &str, group: bool) {
        let mut state = self.inner.state.borrow_mut();
        state.records.insert(
            String::from(id),
            Record {
                id: String::from(id),
                group,
                properties: BTreeMap::new(),
                members: Vec::new(),
                path_supported: true,
            },
        );
        state.principals.retain(|p| p.name != id);
        state.principals.push(Principal {
            name: String::from(id),
            group,
        });
    }

    /// Add a user.
    pub fn add_user(&self, id: &str) {
        self.insert(id, false);
    }

    /// Add a group.
    pub fn add_group(&self, id: &str) {
        self.insert(id, true);
    }

    /// Register a principal that has no authorizable behind it.
    pub fn register_principal(&self, principal: Principal) {
        let mut state = self.inner.state.borrow_mut();
        state.principals.retain(|p| p.name != principal.name);
        state.principals.push(principal);
    }

    /// Remove an authorizable and its principal.
    pub fn remove(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.inner.state.borrow_mut();
        state
            .records
            .remove(id)
            .ok_or_else(|| StoreError::repository(format!("no authorizable '{}'", id)))?;
        state.principals.retain(|p| p.name != id);
        for record in state.records.values_mut() {
            record.members.retain(|m| m != id);
        }
        Ok(())
    }

    /// Set a (possibly multi-value) property at a relative path.
    pub fn set_property(&self, id: &str, rel_path: &str, values: Vec<Value>) -> Result<(), StoreError> {
        let mut state = self.inner.state.borrow_mut();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::repository(format!("no authorizable '{}'", id)))?;
        record.properties.insert(String::from(rel_path), values);
        Ok(())
    }

    /// Remove a property.
    pub fn remove_property(&self, id: &str, rel_path: &str) -> Result<bool, StoreError> {
        let mut state = self.inner.state.borrow_mut();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::repository(format!("no authorizable '{}'", id)))?;
        Ok(record.properties.remove(rel_path).is_some())
    }

    /// Add a declared member to a group.
    pub fn add_member(&self, group: &str, member: &str) -> Result<(), StoreError> {
        let mut state = self.inner.state.borrow_mut();
        if !state.records.contains_key(member) {
            return Err(StoreError::repository(format!("no authorizable '{}'", member)));
        }
        let record = state
            .records
            .get_mut(group)
            .ok_or_else(|| StoreError::repository(format!("no authorizable '{}'", group)))?;
        if !record.group {
            return Err(StoreError::NotAGroup(String::from(group)));
        }
        if !record.members.iter().any(|m| m == member) {
            record.members.push(String::from(member));
        }
        Ok(())
    }

    /// Toggle whether an authorizable exposes a repository path.
    pub fn set_path_supported(&self, id: &str, supported: bool) -> Result<(), StoreError> {
        let mut state = self.inner.state.borrow_mut();
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::repository(format!("no authorizable '{}'", id)))?;
        record.path_supported = supported;
        Ok(())
    }

    /// Number of backend reads performed so far.
    pub fn access_count(&self) -> u64 {
        self.inner.accesses.get()
    }

    /// Let the next `n` backend reads succeed and fail every read after that.
    pub fn fail_after(&self, n: u64) {
        self.inner.budget.set(Some(n));
    }

    /// Stop injecting failures.
    pub fn clear_failure(&self) {
        self.inner.budget.set(None);
    }
}

impl PrincipalStore for MemoryPrincipalStore {
    fn authorizable(&self, id: &str) -> Result<Option<AuthorizableRef>, StoreError> {
        self.inner.touch("lookup")?;
        Ok(self.inner.handle(id))
    }

    fn authorizable_for(&self, principal: &Principal) -> Result<Option<AuthorizableRef>, StoreError> {
        self.inner.touch("principal lookup")?;
        Ok(self.inner.handle(&principal.name))
    }

    fn search_principals(&self, kind: PrincipalKind) -> Result<PrincipalIter, StoreError> {
        self.inner.touch("principal search")?;
        let principals: Vec<Principal> = self
            .inner
            .state
            .borrow()
            .principals
            .iter()
            .filter(|p| kind.accepts(p))
            .cloned()
            .collect();
        let inner = Rc::clone(&self.inner);
        Ok(Box::new(principals.into_iter().map(move |p| {
            inner.touch("principal iteration")?;
            Ok(p)
        })))
    }
}

/// Handle to an authorizable in a [`MemoryPrincipalStore`].
#[derive(Debug)]
pub struct MemoryAuthorizable {
    inner: Rc<Inner>,
    id: String,
    group: bool,
}

impl Authorizable for MemoryAuthorizable {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_group(&self) -> bool {
        self.group
    }

    fn principal(&self) -> Principal {
        Principal {
            name: self.id.clone(),
            group: self.group,
        }
    }

    fn path(&self) -> Result<String, StoreError> {
        self.inner.touch("path")?;
        let supported = self.inner.with_record(&self.id, |r| r.path_supported)?;
        if !supported {
            return Err(StoreError::unsupported(format!(
                "authorizable '{}' has no path",
                self.id
            )));
        }
        let parent = if self.group { "groups" } else { "users" };
        Ok(format!("/home/{}/{}", parent, self.id))
    }

    fn has_property(&self, rel_path: &str) -> Result<bool, StoreError> {
        self.inner.touch("has_property")?;
        self.inner
            .with_record(&self.id, |r| r.properties.contains_key(rel_path))
    }

    fn property(&self, rel_path: &str) -> Result<Option<Vec<Value>>, StoreError> {
        self.inner.touch("property")?;
        self.inner
            .with_record(&self.id, |r| r.properties.get(rel_path).cloned())
    }

    fn property_names(&self, rel_path: &str) -> Result<Vec<String>, StoreError> {
        self.inner.touch("property_names")?;
        let prefix = if rel_path.is_empty() {
            String::new()
        } else {
            format!("{}/", rel_path.trim_end_matches('/'))
        };
        self.inner.with_record(&self.id, |r| {
            r.properties
                .keys()
                .filter_map(|k| k.strip_prefix(prefix.as_str()))
                .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                .map(String::from)
                .collect()
        })
    }

    fn members(&self, transitive: bool) -> Result<AuthorizableIter, StoreError> {
        self.inner.touch("members")?;
        if !self.group {
            return Err(StoreError::NotAGroup(self.id.clone()));
        }
        let ids = self.inner.walk(&self.id, transitive, declared_members);
        Ok(self.inner.iter_ids(ids))
    }

    fn member_of(&self, transitive: bool) -> Result<AuthorizableIter, StoreError> {
        self.inner.touch("member_of")?;
        let ids = self.inner.walk(&self.id, transitive, declared_groups);
        Ok(self.inner.iter_ids(ids))
    }
}
