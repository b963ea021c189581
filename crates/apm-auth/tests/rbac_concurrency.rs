//! RoleStore 동시 접근 및 권한 평가 속성 테스트

use std::sync::atomic::{AtomicBool, Ordering};

use apm_auth::config::RbacConfig;
use apm_auth::logging::init_test_logging;
use apm_auth::rbac::{actions, default_roles, resources, Permission, Role, RoleStore};
use apm_auth::AuthError;
use proptest::prelude::*;

fn narrow_role() -> Role {
    Role::new(
        "rotating",
        "narrow",
        vec![Permission::new(resources::LOGS, [actions::READ])],
    )
}

fn wide_role() -> Role {
    Role::new(
        "rotating",
        "wide",
        vec![
            Permission::new(resources::METRICS, [actions::READ, actions::LIST]),
            Permission::new(resources::DASHBOARDS, [actions::ALL]),
        ],
    )
}

#[test]
fn test_readers_never_observe_partial_update() {
    init_test_logging();
    let store = RoleStore::default();
    store.add_role(narrow_role()).unwrap();
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..2_000 {
                let next = if i % 2 == 0 { wide_role() } else { narrow_role() };
                store.update_role(next).unwrap();
            }
            done.store(true, Ordering::Release);
        });

        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    let role = store.get_role("rotating").unwrap();
                    let wide = match role.description.as_str() {
                        "narrow" => {
                            assert_eq!(role, narrow_role());
                            false
                        }
                        "wide" => {
                            assert_eq!(role, wide_role());
                            true
                        }
                        other => panic!("unexpected definition: {}", other),
                    };

                    // 같은 스냅샷에서 설명과 권한 평가가 일치해야 함
                    assert_eq!(role.grants(resources::METRICS, actions::LIST), wide);
                    assert_eq!(role.grants(resources::DASHBOARDS, actions::DELETE), wide);
                    assert_eq!(role.grants(resources::LOGS, actions::READ), !wide);

                    // 한 번의 평가는 두 정의 중 정확히 하나를 봄
                    let granted = store.check_any_permission(
                        &["rotating"],
                        &[(resources::METRICS, actions::LIST), (resources::LOGS, actions::READ)],
                    );
                    assert!(granted);
                    assert!(!store.check_permission(&["rotating"], resources::USERS, actions::DELETE));
                }
            });
        }
    });

    assert_eq!(store.get_role("rotating").unwrap(), narrow_role());
}

#[test]
fn test_concurrent_add_is_exclusive() {
    init_test_logging();
    let store = RoleStore::default();
    let successes = std::sync::atomic::AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| match store.add_role(narrow_role()) {
                Ok(()) => {
                    successes.fetch_add(1, Ordering::SeqCst);
                }
                Err(AuthError::RoleAlreadyExists(name)) => assert_eq!(name, "rotating"),
                Err(other) => panic!("unexpected error: {}", other),
            });
        }
    });

    assert_eq!(successes.load(Ordering::SeqCst), 1);
    assert_eq!(store.len(), 4);
}

#[test]
fn test_list_roles_is_a_snapshot() {
    let store = RoleStore::default();
    let snapshot = store.list_roles();

    store.delete_role("viewer").unwrap();
    store.add_role(narrow_role()).unwrap();

    let names: Vec<&str> = snapshot.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["admin", "operator", "viewer"]);
    assert_eq!(store.list_roles().len(), 3);
}

#[test]
fn test_configured_roles_replace_defaults() {
    let config = RbacConfig {
        roles: vec![narrow_role()],
        ..Default::default()
    };
    let store = RoleStore::new(&config);

    assert_eq!(store.len(), 1);
    assert!(!store.check_permission(&["admin"], resources::USERS, actions::DELETE));
    assert!(store.check_permission(&["rotating"], resources::LOGS, actions::READ));
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,12}"
}

proptest! {
    #[test]
    fn prop_admin_allows_everything(resource in name_strategy(), action in name_strategy()) {
        let store = RoleStore::default();
        prop_assert!(store.check_permission(&["admin"], &resource, &action));
    }

    #[test]
    fn prop_no_roles_denies(resource in name_strategy(), action in name_strategy()) {
        let store = RoleStore::default();
        let empty: [&str; 0] = [];
        prop_assert!(!store.check_permission(&empty, &resource, &action));
    }

    #[test]
    fn prop_unknown_roles_deny(
        roles in prop::collection::vec("[A-Z]{1,8}", 1..4),
        resource in name_strategy(),
        action in name_strategy(),
    ) {
        let store = RoleStore::default();
        prop_assert!(!store.check_permission(roles.as_slice(), &resource, &action));
    }

    #[test]
    fn prop_viewer_never_writes(resource in name_strategy()) {
        let store = RoleStore::default();
        for action in [actions::CREATE, actions::UPDATE, actions::DELETE, actions::DEPLOY] {
            prop_assert!(!store.check_permission(&["viewer"], &resource, action));
        }
    }

    #[test]
    fn prop_role_order_does_not_change_result(resource in name_strategy(), action in name_strategy()) {
        let store = RoleStore::default();
        let forward = store.check_permission(&["viewer", "operator"], &resource, &action);
        let backward = store.check_permission(&["operator", "viewer"], &resource, &action);
        prop_assert_eq!(forward, backward);
    }
}

#[test]
fn test_default_roles_are_known() {
    let names: Vec<String> = default_roles().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["admin", "operator", "viewer"]);
}
