//! Zero OS Principal Store Interface
//!
//! The principal store is the identity backend the user manager reads from:
//!
//! - **Authorizables**: users and groups, addressed by a unique id
//! - **Values**: store-native property cells with the store's own read rules
//! - **Principals**: named principals returned by principal search
//! - **Membership**: declared and transitive group membership, both directions
//! - **Testing**: an in-memory store with access accounting
//!
//! # Safety Invariants
//!
//! ## Success Conditions
//! - A lookup returns `Ok(None)` for unknown ids; only backend failures are errors
//! - Membership walks never yield the same authorizable twice
//!
//! ## Acceptable Partial Failure
//! - A principal may exist without an authorizable behind it
//! - An authorizable may have no repository path (`StoreError::Unsupported`)
//!
//! ## Forbidden States
//! - Group-only operations succeeding on a non-group authorizable

pub mod authorizable;
pub mod error;
pub mod testing;
pub mod value;

pub use authorizable::{
    Authorizable, AuthorizableIter, AuthorizableRef, Principal, PrincipalIter, PrincipalKind,
    PrincipalStore,
};
pub use error::StoreError;
pub use testing::MemoryPrincipalStore;
pub use value::{Binary, BinarySource, Value};
