//! Test doubles for the principal store.

mod memory_store;

pub use memory_store::{MemoryAuthorizable, MemoryPrincipalStore};
