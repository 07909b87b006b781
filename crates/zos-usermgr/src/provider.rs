//! Virtual path resolution over a principal store.
//!
//! The provider mounts a read-only namespace at a configurable root:
//!
//! ```text
//! /system/userManager                      sling/userManager
//! /system/userManager/user                 sling/users
//! /system/userManager/user/alice           sling/user
//! /system/userManager/user/alice/profile   sling/user/properties
//! /system/userManager/group                sling/groups
//! /system/userManager/group/staff          sling/group
//! ```
//!
//! Both collection prefixes accept any identifier. The node type follows
//! the authorizable's real kind, not the prefix it was addressed through.

use std::fmt;

use tracing::{debug, trace};
use zos_principal::{Authorizable, PrincipalIter, PrincipalKind, PrincipalStore, StoreError};

use crate::config::{ProviderConfig, UserManagerPaths};
use crate::core::path::{is_multi_segment, parent_path};
use crate::core::{classify, PathClass, Result, UserManagerError};
use crate::node::{NodeKind, ResourceNode};

/// Resolves virtual paths to resource nodes.
pub struct UserManagerProvider<S> {
    store: S,
    config: ProviderConfig,
    paths: UserManagerPaths,
}

impl<S: PrincipalStore> UserManagerProvider<S> {
    /// Create a provider. Fails if the configured root is not usable.
    pub fn new(store: S, config: ProviderConfig) -> Result<Self> {
        let paths = config.paths()?;
        debug!(root = paths.root(), "user manager provider created");
        Ok(Self {
            store,
            config,
            paths,
        })
    }

    /// Create a provider mounted at the default root.
    pub fn with_default_root(store: S) -> Self {
        Self {
            store,
            config: ProviderConfig::default(),
            paths: UserManagerPaths::default(),
        }
    }

    /// Apply a new configuration. On error the previous one stays active.
    pub fn reconfigure(&mut self, config: ProviderConfig) -> Result<()> {
        let paths = config.paths()?;
        debug!(
            old_root = self.paths.root(),
            new_root = paths.root(),
            "user manager provider reconfigured"
        );
        self.config = config;
        self.paths = paths;
        Ok(())
    }

    /// The principal store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Paths derived from the active configuration.
    pub fn paths(&self) -> &UserManagerPaths {
        &self.paths
    }

    // ========== Resolution ==========

    /// Resolve a path to a node.
    ///
    /// Unknown and malformed paths, unknown identifiers, and nested paths
    /// with nothing stored behind them answer `Ok(None)`. Store failures are
    /// returned as errors.
    pub fn resolve(&self, path: &str) -> Result<Option<ResourceNode>> {
        let node = match classify(&self.paths, path) {
            PathClass::Root => Some(self.root_node()),
            PathClass::Users => Some(self.users_node()),
            PathClass::Groups => Some(self.groups_node()),
            PathClass::Authorizable { id, nested } => self.resolve_authorizable(path, id, nested)?,
            PathClass::Unknown => None,
        };
        match &node {
            Some(node) => debug!(path, resource_type = %node.resource_type(), "resolved"),
            None => debug!(path, "not resolved"),
        }
        Ok(node)
    }

    fn resolve_authorizable(
        &self,
        path: &str,
        id: &str,
        nested: Option<&str>,
    ) -> Result<Option<ResourceNode>> {
        let Some(entity) = self.store.authorizable(id)? else {
            trace!(id, "no authorizable with this id");
            return Ok(None);
        };
        let nested = match nested {
            None => None,
            Some(rel) => match nested_scope(entity.as_ref(), rel)? {
                Some(scope) => Some(scope),
                None => {
                    trace!(id, rel, "nothing stored at nested path");
                    return Ok(None);
                }
            },
        };
        Ok(Some(ResourceNode::authorizable(
            String::from(path),
            entity,
            nested,
            &self.paths,
        )))
    }

    fn root_node(&self) -> ResourceNode {
        ResourceNode::container(self.paths.root(), NodeKind::Root, &self.paths)
    }

    fn users_node(&self) -> ResourceNode {
        ResourceNode::container(self.paths.users_path(), NodeKind::Users, &self.paths)
    }

    fn groups_node(&self) -> ResourceNode {
        ResourceNode::container(self.paths.groups_path(), NodeKind::Groups, &self.paths)
    }

    // ========== Navigation ==========

    /// Children of a node, `Ok(None)` for nodes without children.
    ///
    /// Collection children are produced lazily from a principal search; a
    /// store failure opening the search is returned here, later failures
    /// are yielded by the sequence.
    pub fn list_children(&self, node: &ResourceNode) -> Result<Option<Children<'_>>> {
        let children = match node.kind() {
            NodeKind::Root => Children::fixed(vec![self.users_node(), self.groups_node()]),
            NodeKind::Users => self.principal_children(PrincipalKind::NotGroup, false)?,
            NodeKind::Groups => self.principal_children(PrincipalKind::Group, true)?,
            NodeKind::Authorizable { .. } | NodeKind::Principal(_) => return Ok(None),
        };
        debug!(path = node.path(), "listing children");
        Ok(Some(children))
    }

    fn principal_children(&self, kind: PrincipalKind, groups: bool) -> Result<Children<'_>> {
        let cursor = self.store.search_principals(kind)?;
        Ok(Children {
            source: ChildSource::Principals {
                store: &self.store,
                cursor,
                prefix: String::from(self.paths.prefix_for(groups)),
                paths: self.paths.clone(),
            },
            ended: false,
        })
    }

    /// Parent of a node, `Ok(None)` for the root.
    ///
    /// An authorizable's parent is the collection of its real kind. Nested
    /// nodes and principal nodes resolve their parent path.
    pub fn parent(&self, node: &ResourceNode) -> Result<Option<ResourceNode>> {
        match node.kind() {
            NodeKind::Root => Ok(None),
            NodeKind::Users | NodeKind::Groups => Ok(Some(self.root_node())),
            NodeKind::Authorizable {
                entity,
                nested: None,
            } => Ok(Some(if entity.is_group() {
                self.groups_node()
            } else {
                self.users_node()
            })),
            NodeKind::Authorizable { .. } | NodeKind::Principal(_) => {
                match parent_path(node.path()) {
                    Some(parent) => self.resolve(parent),
                    None => Ok(None),
                }
            }
        }
    }
}

impl<S> fmt::Debug for UserManagerProvider<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserManagerProvider")
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

/// Property scope of a nested node at `rel`, `None` if nothing is stored
/// there.
///
/// A single segment is always a scope. A deeper path is a scope when the
/// store has children under it, and names a single property of its parent
/// scope when a property is stored at exactly that path.
fn nested_scope(entity: &dyn Authorizable, rel: &str) -> std::result::Result<Option<String>, StoreError> {
    if !is_multi_segment(rel) {
        return Ok(Some(String::from(rel)));
    }
    if !entity.property_names(rel)?.is_empty() {
        return Ok(Some(String::from(rel)));
    }
    if entity.has_property(rel)? {
        return Ok(parent_path(rel).map(String::from));
    }
    Ok(None)
}

// ========== Children ==========

enum ChildSource<'a> {
    Fixed(std::vec::IntoIter<ResourceNode>),
    Principals {
        store: &'a dyn PrincipalStore,
        cursor: PrincipalIter,
        prefix: String,
        paths: UserManagerPaths,
    },
}

/// Lazy, single-pass sequence of child nodes.
///
/// Each store principal becomes a node only when the sequence is advanced.
/// The first `None` marks the end; advancing again yields
/// [`UserManagerError::Exhausted`].
pub struct Children<'a> {
    source: ChildSource<'a>,
    ended: bool,
}

impl<'a> Children<'a> {
    fn fixed(nodes: Vec<ResourceNode>) -> Self {
        Self {
            source: ChildSource::Fixed(nodes.into_iter()),
            ended: false,
        }
    }

    fn advance(&mut self) -> Option<Result<ResourceNode>> {
        match &mut self.source {
            ChildSource::Fixed(nodes) => nodes.next().map(Ok),
            ChildSource::Principals {
                store,
                cursor,
                prefix,
                paths,
            } => {
                let principal = match cursor.next()? {
                    Ok(principal) => principal,
                    Err(e) => return Some(Err(e.into())),
                };
                let node = match store.authorizable_for(&principal) {
                    Ok(Some(entity)) => {
                        let path = format!("{}{}", prefix, entity.id());
                        ResourceNode::authorizable(path, entity, None, paths)
                    }
                    Ok(None) => {
                        trace!(principal = %principal.name, "principal without authorizable");
                        let path = format!("{}{}", prefix, principal.name);
                        ResourceNode::principal(path, principal, paths)
                    }
                    Err(e) => return Some(Err(e.into())),
                };
                Some(Ok(node))
            }
        }
    }
}

impl Iterator for Children<'_> {
    type Item = Result<ResourceNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ended {
            return Some(Err(UserManagerError::Exhausted));
        }
        let next = self.advance();
        if next.is_none() {
            self.ended = true;
        }
        next
    }
}

impl fmt::Debug for Children<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.source {
            ChildSource::Fixed(_) => "fixed",
            ChildSource::Principals { .. } => "principals",
        };
        f.debug_struct("Children")
            .field("source", &source)
            .field("ended", &self.ended)
            .finish()
    }
}
