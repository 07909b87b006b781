//! Cached, read-only property view over one authorizable.
//!
//! # Safety Invariants
//!
//! ## Success Conditions
//! - A point lookup never materializes the whole view
//! - Once the view is fully read, no lookup touches the store again and
//!   absent keys are authoritatively absent
//!
//! ## Acceptable Partial Failure
//! - A store failure during full materialization leaves the fully-read flag
//!   unset; entries cached before the failure stay cached
//! - Point lookups that hit a store failure answer absent (logged)
//!
//! ## Forbidden States
//! - A stored property shadowing a synthetic key
//! - Any mutation through the view

use std::cell::{Cell, RefCell};
use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};
use zos_principal::{Authorizable, AuthorizableRef, StoreError};

use super::keys::{claimed_by, KeySource, NESTED_SOURCES, ROOT_SOURCES};
use crate::coerce::{self, FromProperty, PropertyValue, Requested};
use crate::config::UserManagerPaths;
use crate::core::path::rebase;
use crate::core::{Result, UserManagerError};

enum Backing {
    /// Live authorizable, optionally scoped to a nested property group
    Authorizable {
        entity: AuthorizableRef,
        scope: Option<String>,
    },
    /// Fixed entries with no store behind them
    Detached,
}

/// Read-only key/value view over an authorizable's properties.
pub struct PropertyView {
    backing: Backing,
    paths: UserManagerPaths,
    cache: RefCell<IndexMap<String, PropertyValue>>,
    fully_read: Cell<bool>,
}

impl PropertyView {
    /// View over an authorizable's own properties and synthetic keys.
    pub fn new(entity: AuthorizableRef, paths: UserManagerPaths) -> Self {
        Self::with_backing(Backing::Authorizable { entity, scope: None }, paths)
    }

    /// View over the property group at `scope` inside an authorizable.
    pub fn nested(entity: AuthorizableRef, scope: impl Into<String>, paths: UserManagerPaths) -> Self {
        let scope = scope.into();
        Self::with_backing(
            Backing::Authorizable {
                entity,
                scope: Some(scope),
            },
            paths,
        )
    }

    /// Already fully read view over fixed entries.
    pub fn detached(entries: IndexMap<String, PropertyValue>) -> Self {
        let view = Self::with_backing(Backing::Detached, UserManagerPaths::default());
        *view.cache.borrow_mut() = entries;
        view.fully_read.set(true);
        view
    }

    fn with_backing(backing: Backing, paths: UserManagerPaths) -> Self {
        Self {
            backing,
            paths,
            cache: RefCell::new(IndexMap::new()),
            fully_read: Cell::new(false),
        }
    }

    /// Relative scope of a nested view.
    pub fn scope(&self) -> Option<&str> {
        match &self.backing {
            Backing::Authorizable { scope, .. } => scope.as_deref(),
            Backing::Detached => None,
        }
    }

    /// True once every key has been materialized.
    pub fn is_fully_read(&self) -> bool {
        self.fully_read.get()
    }

    fn sources(&self) -> &'static [KeySource] {
        match &self.backing {
            Backing::Authorizable { scope: None, .. } => ROOT_SOURCES,
            Backing::Authorizable { scope: Some(_), .. } => NESTED_SOURCES,
            Backing::Detached => &[],
        }
    }

    fn stored_path(&self, key: &str) -> String {
        rebase(self.scope().unwrap_or_default(), key)
    }

    // ========== Point Lookups ==========

    /// Value of a key, read on first access and cached.
    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        if let Some(value) = self.cache.borrow().get(key) {
            trace!(key, "property cache hit");
            return Some(value.clone());
        }
        if self.fully_read.get() {
            return None;
        }
        let Backing::Authorizable { entity, .. } = &self.backing else {
            return None;
        };

        match self.read(entity.as_ref(), key) {
            Ok(Some(value)) => {
                self.cache
                    .borrow_mut()
                    .insert(String::from(key), value.clone());
                Some(value)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(id = entity.id(), key, error = %e, "property read failed");
                None
            }
        }
    }

    /// Resolve one key through the source table in order.
    fn read(&self, entity: &dyn Authorizable, key: &str) -> std::result::Result<Option<PropertyValue>, StoreError> {
        let sources = self.sources();
        if let Some(synthetic) = claimed_by(sources, key, entity) {
            return synthetic.compute(entity, &self.paths);
        }
        if sources.contains(&KeySource::Stored) {
            let values = entity.property(&self.stored_path(key))?;
            return Ok(values.map(|v| coerce::natural(&v)));
        }
        Ok(None)
    }

    /// Value of a key converted to the requested shape.
    ///
    /// Reads from the store and converts each cell directly; the cached
    /// generic value is not consulted. A fully read view answers from its
    /// snapshot only.
    pub fn get_typed(&self, key: &str, requested: Requested) -> Option<PropertyValue> {
        if self.fully_read.get() {
            let cached = self.cache.borrow().get(key).cloned()?;
            return coerce::recoerce(&cached, requested);
        }
        let Backing::Authorizable { entity, .. } = &self.backing else {
            return None;
        };

        let sources = self.sources();
        let result = match claimed_by(sources, key, entity.as_ref()) {
            Some(synthetic) => synthetic
                .compute(entity.as_ref(), &self.paths)
                .map(|v| v.and_then(|v| coerce::recoerce(&v, requested))),
            None if sources.contains(&KeySource::Stored) => entity
                .property(&self.stored_path(key))
                .map(|cells| cells.and_then(|cells| coerce::coerce(&cells, requested))),
            None => Ok(None),
        };
        result.unwrap_or_else(|e| {
            warn!(id = entity.id(), key, error = %e, "typed property read failed");
            None
        })
    }

    /// Value of a key as a Rust type.
    pub fn get_as<T: FromProperty>(&self, key: &str) -> Option<T> {
        self.get_typed(key, T::REQUESTED)
            .and_then(T::from_property)
    }

    /// Value of a key converted to the default's category, or the default.
    pub fn get_or(&self, key: &str, default: PropertyValue) -> PropertyValue {
        self.get_typed(key, default.requested()).unwrap_or(default)
    }

    /// Value of a key as the default's type, or the default.
    pub fn get_or_else<T: FromProperty>(&self, key: &str, default: T) -> T {
        self.get_as(key).unwrap_or(default)
    }

    /// Point lookup; never materializes the whole view.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    // ========== Full Materialization ==========

    /// Read every key this view exposes. The fully-read flag is set only
    /// after everything succeeded.
    pub fn read_fully(&self) -> Result<()> {
        if self.fully_read.get() {
            return Ok(());
        }
        let Backing::Authorizable { entity, scope } = &self.backing else {
            self.fully_read.set(true);
            return Ok(());
        };
        debug!(id = entity.id(), scope = scope.as_deref(), "materializing property view");

        let sources = self.sources();
        for source in sources {
            match source {
                KeySource::Synthetic(key) => {
                    if !key.applies_to(entity.as_ref()) || self.cache.borrow().contains_key(key.name()) {
                        continue;
                    }
                    if let Some(value) = key.compute(entity.as_ref(), &self.paths)? {
                        self.cache.borrow_mut().insert(String::from(key.name()), value);
                    }
                }
                KeySource::Stored => {
                    let names = entity.property_names(scope.as_deref().unwrap_or_default())?;
                    for name in names {
                        if self.cache.borrow().contains_key(&name)
                            || claimed_by(sources, &name, entity.as_ref()).is_some()
                        {
                            continue;
                        }
                        if let Some(values) = entity.property(&self.stored_path(&name))? {
                            self.cache
                                .borrow_mut()
                                .insert(name, coerce::natural(&values));
                        }
                    }
                }
            }
        }

        self.fully_read.set(true);
        debug!(id = entity.id(), entries = self.cache.borrow().len(), "property view fully read");
        Ok(())
    }

    /// All keys, in materialization order.
    pub fn keys(&self) -> Result<Vec<String>> {
        self.read_fully()?;
        Ok(self.cache.borrow().keys().cloned().collect())
    }

    /// All values, in materialization order.
    pub fn values(&self) -> Result<Vec<PropertyValue>> {
        self.read_fully()?;
        Ok(self.cache.borrow().values().cloned().collect())
    }

    /// All entries, in materialization order.
    pub fn entries(&self) -> Result<Vec<(String, PropertyValue)>> {
        self.read_fully()?;
        Ok(self
            .cache
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Number of keys.
    pub fn len(&self) -> Result<usize> {
        self.read_fully()?;
        Ok(self.cache.borrow().len())
    }

    /// True if the view exposes no keys.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// True if any key maps to the value.
    pub fn contains_value(&self, value: &PropertyValue) -> Result<bool> {
        self.read_fully()?;
        Ok(self.cache.borrow().values().any(|v| v == value))
    }

    /// JSON object of every entry.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.read_fully()?;
        let object: serde_json::Map<String, serde_json::Value> = self
            .cache
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Ok(serde_json::Value::Object(object))
    }

    // ========== Mutations (always rejected) ==========

    /// Always fails: the view is read-only.
    pub fn put(&self, _key: &str, _value: PropertyValue) -> Result<Option<PropertyValue>> {
        Err(UserManagerError::read_only("put"))
    }

    /// Always fails: the view is read-only.
    pub fn put_all<I>(&self, _entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, PropertyValue)>,
    {
        Err(UserManagerError::read_only("put_all"))
    }

    /// Always fails: the view is read-only.
    pub fn remove(&self, _key: &str) -> Result<Option<PropertyValue>> {
        Err(UserManagerError::read_only("remove"))
    }

    /// Always fails: the view is read-only.
    pub fn clear(&self) -> Result<()> {
        Err(UserManagerError::read_only("clear"))
    }
}

impl fmt::Debug for PropertyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = match &self.backing {
            Backing::Authorizable { entity, .. } => Some(entity.id()),
            Backing::Detached => None,
        };
        f.debug_struct("PropertyView")
            .field("id", &id)
            .field("scope", &self.scope())
            .field("cached", &self.cache.borrow().len())
            .field("fully_read", &self.fully_read.get())
            .finish()
    }
}
