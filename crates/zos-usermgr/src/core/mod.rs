//! Core user manager types and utilities

mod error;
pub mod path;

pub use error::{Result, UserManagerError};
pub use path::{classify, format_authorizable_path, PathClass};
