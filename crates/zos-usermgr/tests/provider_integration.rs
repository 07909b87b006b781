//! User Manager Provider Integration Tests
//!
//! Resolve paths against an in-memory principal store and read the
//! resulting nodes through their property views.

use zos_principal::{MemoryPrincipalStore, Principal, PrincipalStore, Value};
use zos_usermgr::{
    PropertyValue, ProviderConfig, ResourceType, UserManagerError, UserManagerProvider,
};

/// Store with users alice, bob, carol and groups staff, admins.
///
/// admins declares {alice, staff}; staff declares {carol}.
fn populated_store() -> MemoryPrincipalStore {
    let store = MemoryPrincipalStore::new();
    store.add_user("alice");
    store.add_user("bob");
    store.add_user("carol");
    store.add_group("staff");
    store.add_group("admins");
    store.add_member("admins", "alice").unwrap();
    store.add_member("admins", "staff").unwrap();
    store.add_member("staff", "carol").unwrap();
    store
}

fn provider(store: &MemoryPrincipalStore) -> UserManagerProvider<MemoryPrincipalStore> {
    UserManagerProvider::new(store.clone(), ProviderConfig::default()).unwrap()
}

/// The synthetic `path` key equals the store's own canonical path.
#[test]
fn test_path_key_matches_store_path() {
    let store = populated_store();
    let provider = provider(&store);

    for (path, id) in [
        ("/system/userManager/user/alice", "alice"),
        ("/system/userManager/group/staff", "staff"),
        ("/system/userManager/group/alice", "alice"),
    ] {
        let node = provider.resolve(path).unwrap().unwrap();
        let view = node.property_view().unwrap();
        let expected = store.authorizable(id).unwrap().unwrap().path().unwrap();
        assert_eq!(view.get("path"), Some(PropertyValue::String(expected)));
    }

    store.set_path_supported("bob", false).unwrap();
    let bob = provider.resolve("/system/userManager/user/bob").unwrap().unwrap();
    let view = bob.property_view().unwrap();
    assert_eq!(view.get("path"), None);
    assert!(!view.keys().unwrap().contains(&String::from("path")));
}

/// Declared and transitive members are formatted by each member's kind.
#[test]
fn test_member_paths() {
    let store = populated_store();
    let provider = provider(&store);
    let admins = provider
        .resolve("/system/userManager/group/admins")
        .unwrap()
        .unwrap();
    let view = admins.property_view().unwrap();

    let declared = view.get("declaredMembers").unwrap();
    assert_eq!(
        declared.string_items(),
        vec![
            "/system/userManager/user/alice",
            "/system/userManager/group/staff",
        ]
    );

    let members = view.get("members").unwrap();
    let members = members.string_items();
    assert_eq!(members.len(), 3);
    assert!(members.contains(&"/system/userManager/user/carol"));

    let carol = provider.resolve("/system/userManager/user/carol").unwrap().unwrap();
    let carol = carol.property_view().unwrap();
    assert_eq!(
        carol.get("memberOf").unwrap().string_items(),
        vec!["/system/userManager/group/staff", "/system/userManager/group/admins"]
    );
    assert_eq!(carol.get("members"), None);
}

/// A repeated point lookup is served from the cache.
#[test]
fn test_point_lookup_cached() {
    let store = populated_store();
    store
        .set_property("alice", "email", vec![Value::from("alice@example.com")])
        .unwrap();
    let provider = provider(&store);
    let alice = provider.resolve("/system/userManager/user/alice").unwrap().unwrap();
    let view = alice.property_view().unwrap();

    let first = view.get("email");
    let accesses = store.access_count();
    let second = view.get("email");
    assert_eq!(first, second);
    assert_eq!(first, Some(PropertyValue::from("alice@example.com")));
    assert_eq!(store.access_count(), accesses);
}

/// A fully read view is a snapshot.
#[test]
fn test_full_read_snapshot() {
    let store = populated_store();
    store.set_property("alice", "email", vec![Value::from("a@x")]).unwrap();
    let provider = provider(&store);
    let alice = provider.resolve("/system/userManager/user/alice").unwrap().unwrap();
    let view = alice.property_view().unwrap();

    let keys = view.keys().unwrap();
    store.set_property("alice", "phone", vec![Value::from("555")]).unwrap();
    assert_eq!(view.keys().unwrap(), keys);
    assert!(!view.contains_key("phone"));

    let accesses = store.access_count();
    assert_eq!(view.get("phone"), None);
    assert_eq!(store.access_count(), accesses);

    let fresh = alice.property_view().unwrap();
    assert!(fresh.contains_key("phone"));
}

/// `contains_key` probes one key and never materializes the view.
#[test]
fn test_contains_key_does_not_materialize() {
    let store = populated_store();
    let provider = provider(&store);
    let alice = provider.resolve("/system/userManager/user/alice").unwrap().unwrap();
    let view = alice.property_view().unwrap();

    assert!(!view.contains_key("missing"));
    assert!(!view.is_fully_read());
    let accesses = store.access_count();
    assert!(!view.contains_key("missing"));
    assert!(!view.is_fully_read());
    // Absent keys are not cached, so only the single probe hits the store.
    assert_eq!(store.access_count(), accesses + 1);
}

/// A nested path reads properties relative to its scope.
#[test]
fn test_nested_property_node() {
    let store = populated_store();
    store
        .set_property("alice", "profile/nick", vec![Value::from("ally")])
        .unwrap();
    let provider = provider(&store);

    let node = provider
        .resolve("/system/userManager/user/alice/profile/nick")
        .unwrap()
        .unwrap();
    assert_eq!(node.resource_type(), ResourceType::UserProperties);
    assert_eq!(node.resource_type().as_str(), "sling/user/properties");
    let view = node.property_view().unwrap();
    assert_eq!(view.get("nick"), Some(PropertyValue::from("ally")));

    let profile = provider
        .resolve("/system/userManager/user/alice/profile")
        .unwrap()
        .unwrap();
    let view = profile.property_view().unwrap();
    assert_eq!(view.keys().unwrap(), vec![String::from("nick")]);
    assert_eq!(view.get("path"), None);
}

/// Nested paths with nothing stored behind them, or with a trailing
/// slash, resolve to nothing.
#[test]
fn test_unknown_nested_path() {
    let store = populated_store();
    let provider = provider(&store);
    assert!(provider
        .resolve("/system/userManager/user/alice/x/y")
        .unwrap()
        .is_none());
    assert!(provider
        .resolve("/system/userManager/user/nobody/profile")
        .unwrap()
        .is_none());

    store
        .set_property("alice", "profile/nick", vec![Value::from("ally")])
        .unwrap();
    assert!(provider
        .resolve("/system/userManager/user/alice/profile/")
        .unwrap()
        .is_none());
    assert!(provider
        .resolve("/system/userManager/user/alice/profile")
        .unwrap()
        .is_some());
}

/// Integer array conversion drops cells that do not convert.
#[test]
fn test_partial_array_conversion() {
    let store = populated_store();
    store
        .set_property(
            "alice",
            "scores",
            vec![Value::from("1"), Value::from("x"), Value::from("3")],
        )
        .unwrap();
    let provider = provider(&store);
    let alice = provider.resolve("/system/userManager/user/alice").unwrap().unwrap();
    let view = alice.property_view().unwrap();
    assert_eq!(view.get_as::<Vec<i64>>("scores"), Some(vec![1, 3]));
    assert_eq!(view.get_as::<i64>("scores"), Some(1));
}

/// Collection children are built one principal at a time.
#[test]
fn test_lazy_collection_listing() {
    let store = populated_store();
    let provider = provider(&store);
    let users = provider.resolve("/system/userManager/user").unwrap().unwrap();

    let before = store.access_count();
    let mut children = provider.list_children(&users).unwrap().unwrap();
    assert_eq!(store.access_count(), before + 1);

    let first = children.next().unwrap().unwrap();
    assert_eq!(first.path(), "/system/userManager/user/alice");
    assert_eq!(first.resource_type(), ResourceType::User);
    // One cursor step plus one principal lookup.
    assert_eq!(store.access_count(), before + 3);

    let rest: Vec<_> = children.by_ref().map(|c| c.unwrap().name().to_string()).collect();
    assert_eq!(rest, vec!["bob", "carol"]);
    assert!(matches!(children.next(), Some(Err(UserManagerError::Exhausted))));
}

/// Group listing uses the group prefix; principals without an
/// authorizable still appear.
#[test]
fn test_group_listing_with_bare_principal() {
    let store = populated_store();
    store.register_principal(Principal::group("everyone"));
    let provider = provider(&store);
    let groups = provider.resolve("/system/userManager/group").unwrap().unwrap();

    let children: Vec<_> = provider
        .list_children(&groups)
        .unwrap()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let listed: Vec<_> = children
        .iter()
        .map(|c| (c.path().to_string(), c.resource_type()))
        .collect();
    assert_eq!(
        listed,
        vec![
            (String::from("/system/userManager/group/staff"), ResourceType::Group),
            (String::from("/system/userManager/group/admins"), ResourceType::Group),
            (String::from("/system/userManager/group/everyone"), ResourceType::Principal),
        ]
    );
    let everyone = children[2].property_view().unwrap();
    assert_eq!(everyone.get("principalName"), Some(PropertyValue::from("everyone")));
}

/// Store failures surface as errors from resolution and listing.
#[test]
fn test_store_failures_propagate() {
    let store = populated_store();
    let provider = provider(&store);
    let users = provider.resolve("/system/userManager/user").unwrap().unwrap();

    store.fail_after(0);
    let err = provider.resolve("/system/userManager/user/alice").unwrap_err();
    assert!(err.is_store());
    assert!(provider.list_children(&users).unwrap_err().is_store());
    // Fixed paths need no store access.
    assert!(provider.resolve("/system/userManager").unwrap().is_some());

    store.clear_failure();
    // Search, one cursor step and one lookup succeed; the next step fails.
    store.fail_after(3);
    let mut children = provider.list_children(&users).unwrap().unwrap();
    assert!(children.next().unwrap().is_ok());
    assert!(children.next().unwrap().unwrap_err().is_store());
}

/// A group addressed through the user prefix keeps its group tag.
#[test]
fn test_cross_prefix_resolution() {
    let store = populated_store();
    let provider = provider(&store);
    let node = provider.resolve("/system/userManager/user/admins").unwrap().unwrap();
    assert_eq!(node.resource_type(), ResourceType::Group);
    assert!(node.as_group().is_some());
    assert!(node.as_user().is_none());

    let parent = provider.parent(&node).unwrap().unwrap();
    assert_eq!(parent.path(), "/system/userManager/group");
}

/// Configuration from JSON moves the whole namespace.
#[test]
fn test_custom_root_from_json() {
    let store = populated_store();
    let config = ProviderConfig::from_json(r#"{"provider.root": "/um/"}"#).unwrap();
    let provider = UserManagerProvider::new(store, config).unwrap();

    let node = provider.resolve("/um/group/staff").unwrap().unwrap();
    let view = node.property_view().unwrap();
    assert_eq!(
        view.get("declaredMembers").unwrap().string_items(),
        vec!["/um/user/carol"]
    );
    assert!(provider.resolve("/system/userManager").unwrap().is_none());
}
