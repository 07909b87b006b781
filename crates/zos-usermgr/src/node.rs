//! Addressable nodes of the user manager namespace.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use zos_principal::{AuthorizableRef, Principal};

use crate::coerce::PropertyValue;
use crate::config::UserManagerPaths;
use crate::core::path::filename;
use crate::props::PropertyView;

/// Key exposed by the property view of an unresolved principal.
pub const PRINCIPAL_NAME_KEY: &str = "principalName";

/// Resource type tag of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    /// Provider root
    UserManager,
    /// User collection
    Users,
    /// Group collection
    Groups,
    /// A user
    User,
    /// A group
    Group,
    /// Nested property group of a user
    UserProperties,
    /// Nested property group of a group
    GroupProperties,
    /// Principal with no authorizable behind it
    Principal,
}

impl ResourceType {
    /// Canonical tag string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ResourceType::UserManager => "sling/userManager",
            ResourceType::Users => "sling/users",
            ResourceType::Groups => "sling/groups",
            ResourceType::User => "sling/user",
            ResourceType::Group => "sling/group",
            ResourceType::UserProperties => "sling/user/properties",
            ResourceType::GroupProperties => "sling/group/properties",
            ResourceType::Principal => "sling/principal",
        }
    }

    /// Tag of an authorizable node, or of a nested node inside it.
    pub fn for_authorizable(is_group: bool, nested: bool) -> Self {
        match (is_group, nested) {
            (false, false) => ResourceType::User,
            (true, false) => ResourceType::Group,
            (false, true) => ResourceType::UserProperties,
            (true, true) => ResourceType::GroupProperties,
        }
    }

    /// True for tags of user nodes (entity or nested).
    pub fn is_user(&self) -> bool {
        matches!(self, ResourceType::User | ResourceType::UserProperties)
    }

    /// True for tags of group nodes (entity or nested).
    pub fn is_group(&self) -> bool {
        matches!(self, ResourceType::Group | ResourceType::GroupProperties)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a node is backed by.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Provider root
    Root,
    /// User collection
    Users,
    /// Group collection
    Groups,
    /// An authorizable, or a nested property group inside it
    Authorizable {
        entity: AuthorizableRef,
        nested: Option<String>,
    },
    /// A principal the store has no authorizable for
    Principal(Principal),
}

/// Requested projection of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    /// Generic key/value property view
    Properties,
    /// Backing authorizable, any kind
    Authorizable,
    /// Backing authorizable, only if the node is a user
    User,
    /// Backing authorizable, only if the node is a group
    Group,
}

/// Result of projecting a node.
#[derive(Debug)]
pub enum Adapted {
    Properties(PropertyView),
    Authorizable(AuthorizableRef),
}

/// A node of the namespace.
///
/// The type tag is derived once when the node is built and never
/// recomputed.
#[derive(Clone, Debug)]
pub struct ResourceNode {
    path: String,
    resource_type: ResourceType,
    kind: NodeKind,
    paths: UserManagerPaths,
}

impl ResourceNode {
    pub(crate) fn container(path: &str, kind: NodeKind, paths: &UserManagerPaths) -> Self {
        let resource_type = match kind {
            NodeKind::Users => ResourceType::Users,
            NodeKind::Groups => ResourceType::Groups,
            _ => ResourceType::UserManager,
        };
        Self {
            path: String::from(path),
            resource_type,
            kind,
            paths: paths.clone(),
        }
    }

    pub(crate) fn authorizable(
        path: String,
        entity: AuthorizableRef,
        nested: Option<String>,
        paths: &UserManagerPaths,
    ) -> Self {
        Self {
            path,
            resource_type: ResourceType::for_authorizable(entity.is_group(), nested.is_some()),
            kind: NodeKind::Authorizable { entity, nested },
            paths: paths.clone(),
        }
    }

    pub(crate) fn principal(path: String, principal: Principal, paths: &UserManagerPaths) -> Self {
        Self {
            path,
            resource_type: ResourceType::Principal,
            kind: NodeKind::Principal(principal),
            paths: paths.clone(),
        }
    }

    /// Resolution path of this node.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last segment of the path.
    pub fn name(&self) -> &str {
        filename(&self.path)
    }

    /// Type tag.
    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// Backing kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Backing authorizable, if any.
    pub fn entity(&self) -> Option<&AuthorizableRef> {
        match &self.kind {
            NodeKind::Authorizable { entity, .. } => Some(entity),
            _ => None,
        }
    }

    /// Relative property path of a nested node.
    pub fn nested_path(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Authorizable { nested, .. } => nested.as_deref(),
            _ => None,
        }
    }

    /// Project the node. `None` when the projection is not available.
    pub fn adapt_to(&self, projection: Projection) -> Option<Adapted> {
        match (projection, &self.kind) {
            (Projection::Properties, NodeKind::Authorizable { entity, nested: None }) => Some(
                Adapted::Properties(PropertyView::new(entity.clone(), self.paths.clone())),
            ),
            (Projection::Properties, NodeKind::Authorizable { entity, nested: Some(scope) }) => {
                Some(Adapted::Properties(PropertyView::nested(
                    entity.clone(),
                    scope.clone(),
                    self.paths.clone(),
                )))
            }
            (Projection::Properties, NodeKind::Principal(principal)) => {
                let mut entries = IndexMap::new();
                entries.insert(
                    String::from(PRINCIPAL_NAME_KEY),
                    PropertyValue::String(principal.name.clone()),
                );
                Some(Adapted::Properties(PropertyView::detached(entries)))
            }
            (Projection::Authorizable, NodeKind::Authorizable { entity, .. }) => {
                Some(Adapted::Authorizable(entity.clone()))
            }
            (Projection::User, NodeKind::Authorizable { entity, .. }) if self.resource_type.is_user() => {
                Some(Adapted::Authorizable(entity.clone()))
            }
            (Projection::Group, NodeKind::Authorizable { entity, .. })
                if self.resource_type.is_group() =>
            {
                Some(Adapted::Authorizable(entity.clone()))
            }
            _ => None,
        }
    }

    /// Property view of this node.
    pub fn property_view(&self) -> Option<PropertyView> {
        match self.adapt_to(Projection::Properties)? {
            Adapted::Properties(view) => Some(view),
            Adapted::Authorizable(_) => None,
        }
    }

    /// Backing authorizable if the node is a user.
    pub fn as_user(&self) -> Option<AuthorizableRef> {
        match self.adapt_to(Projection::User)? {
            Adapted::Authorizable(entity) => Some(entity),
            Adapted::Properties(_) => None,
        }
    }

    /// Backing authorizable if the node is a group.
    pub fn as_group(&self) -> Option<AuthorizableRef> {
        match self.adapt_to(Projection::Group)? {
            Adapted::Authorizable(entity) => Some(entity),
            Adapted::Properties(_) => None,
        }
    }
}
