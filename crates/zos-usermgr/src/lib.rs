//! Zero OS User Manager Namespace
//!
//! Exposes the users and groups of a principal store as a read-only tree of
//! virtual resources:
//!
//! - **Config**: provider root and the collection paths derived from it
//! - **Path**: classification of virtual paths, authorizable path formatting
//! - **Provider**: path resolution, lazy child listing, parent navigation
//! - **Node**: resource nodes, type tags, projections
//! - **Props**: cached property views with synthetic membership keys
//! - **Coerce**: conversion of store cells into requested types
//! - **Stream**: lazily opened binary streams
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     UserManagerProvider                           │
//! │  • resolve(path)        • list_children(node)   • parent(node)    │
//! └──────────────────────────────┬───────────────────────────────────┘
//!                                │ ResourceNode
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        PropertyView                               │
//! │  • synthetic keys (members, memberOf, path)                       │
//! │  • stored properties        • cache, full materialization         │
//! └──────────────────────────────┬───────────────────────────────────┘
//!                                │ Value cells
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────────┐
//! │              PrincipalStore (zos-principal)                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Safety Invariants
//!
//! ## Success Conditions
//! - Unknown or malformed paths resolve to `Ok(None)`, never to an error
//! - A node's type tag follows the authorizable's real kind
//! - Once a view is fully read, point lookups never touch the store
//!
//! ## Acceptable Partial Failure
//! - A failed full read leaves already cached entries in place; the next
//!   full read fills in the rest
//! - Unconvertible values read as absent
//!
//! ## Forbidden States
//! - A write succeeding on a property view
//! - A stored property shadowing a synthetic key
//! - A child sequence silently restarting after it ended

pub mod coerce;
pub mod config;
pub mod core;
pub mod node;
pub mod props;
pub mod provider;
pub mod stream;

pub use coerce::{FromProperty, PropertyValue, Requested, TargetType};
pub use config::{ProviderConfig, UserManagerPaths, DEFAULT_PROVIDER_ROOT};
pub use core::{Result, UserManagerError};
pub use node::{Adapted, NodeKind, Projection, ResourceNode, ResourceType};
pub use props::{PropertyView, SyntheticKey};
pub use provider::{Children, UserManagerProvider};
pub use stream::LazyStream;
