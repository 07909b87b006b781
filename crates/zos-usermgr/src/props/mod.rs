//! Property views over authorizables.

pub mod keys;
mod view;

pub use keys::{KeySource, SyntheticKey};
pub use view::PropertyView;
