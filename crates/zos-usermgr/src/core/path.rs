//! Path algebra for the user manager namespace.
//!
//! Classifies virtual paths against the derived provider paths and builds
//! the paths of authorizables and their nested property groups.

use crate::config::UserManagerPaths;

/// What a virtual path addresses, before any store lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathClass<'a> {
    /// The provider root
    Root,
    /// The user collection
    Users,
    /// The group collection
    Groups,
    /// An authorizable, optionally a relative location inside it
    Authorizable {
        /// Identifier (never contains `/`)
        id: &'a str,
        /// Relative property path after the identifier
        nested: Option<&'a str>,
    },
    /// Outside the namespace
    Unknown,
}

/// Classify a virtual path.
///
/// Exact matches on the root and the two collections win. Below a
/// collection prefix the first segment is the identifier and anything after
/// the next `/` is a nested relative path.
pub fn classify<'a>(paths: &UserManagerPaths, path: &'a str) -> PathClass<'a> {
    if path == paths.root() {
        return PathClass::Root;
    }
    if path == paths.users_path() {
        return PathClass::Users;
    }
    if path == paths.groups_path() {
        return PathClass::Groups;
    }

    let remainder = path
        .strip_prefix(paths.user_prefix())
        .or_else(|| path.strip_prefix(paths.group_prefix()));
    let Some(remainder) = remainder else {
        return PathClass::Unknown;
    };

    let (id, nested) = match remainder.split_once('/') {
        Some((id, rel)) => (id, Some(rel)),
        None => (remainder, None),
    };
    let malformed = |rel: &str| rel.is_empty() || rel.ends_with('/') || rel.contains("//");
    if id.is_empty() || nested.is_some_and(malformed) {
        return PathClass::Unknown;
    }
    PathClass::Authorizable { id, nested }
}

/// Virtual path of an authorizable. The prefix follows the authorizable's
/// own kind.
pub fn format_authorizable_path(paths: &UserManagerPaths, id: &str, is_group: bool) -> String {
    format!("{}{}", paths.prefix_for(is_group), id)
}

/// Join two path components.
pub fn join_path(base: &str, name: &str) -> String {
    if base == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", base, name)
    }
}

/// Rebase a property key under a relative scope (`<scope>/<key>`).
pub fn rebase(scope: &str, key: &str) -> String {
    if scope.is_empty() {
        String::from(key)
    } else {
        format!("{}/{}", scope, key)
    }
}

/// Parent of a path, `None` for the root.
pub fn parent_path(path: &str) -> Option<&str> {
    if path == "/" || path.is_empty() {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(pos) => Some(&path[..pos]),
        None => Some(""),
    }
}

/// Last segment of a path.
pub fn filename(path: &str) -> &str {
    if path == "/" {
        return "";
    }
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// True if the relative path has more than one segment.
pub fn is_multi_segment(rel: &str) -> bool {
    rel.contains('/')
}
