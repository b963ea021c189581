//! 역할 저장소와 권한 평가.
//!
//! 역할 이름 → 역할 정의 맵을 하나의 읽기/쓰기 잠금으로 보호합니다.
//! 권한 검사와 조회는 공유 잠금, 변경은 배타 잠금을 사용하며
//! 잠금을 쥔 상태에서는 메모리 내 맵 연산만 수행합니다.

use parking_lot::RwLock;
use std::collections::HashMap;

use super::mapping::RoleMapper;
use super::role::{default_roles, Role};
use crate::config::RbacConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::User;

/// 역할 저장소.
#[derive(Debug)]
pub struct RoleStore {
    roles: RwLock<HashMap<String, Role>>,
    mapper: RoleMapper,
}

impl Default for RoleStore {
    fn default() -> Self {
        Self::new(&RbacConfig::default())
    }
}

impl RoleStore {
    /// 설정에서 저장소를 생성합니다.
    ///
    /// 설정된 역할이 없으면 기본 역할(admin, operator, viewer)을 적재합니다.
    /// 같은 이름이 여러 번 정의되면 마지막 정의가 남습니다.
    pub fn new(config: &RbacConfig) -> Self {
        let source = if config.roles.is_empty() {
            default_roles()
        } else {
            config.roles.clone()
        };

        let mut roles = HashMap::with_capacity(source.len());
        for role in source {
            tracing::info!(
                role = %role.name,
                permissions = role.permissions.len(),
                "역할 적재"
            );
            if let Some(previous) = roles.insert(role.name.clone(), role) {
                tracing::warn!(role = %previous.name, "중복 역할 정의, 이전 정의를 덮어씀");
            }
        }

        Self {
            roles: RwLock::new(roles),
            mapper: RoleMapper::from_config(config),
        }
    }

    /// 역할 집합이 리소스에 대해 액션을 수행할 수 있는지 확인합니다.
    ///
    /// 역할은 주어진 순서대로, 권한은 선언 순서대로 평가하며 첫 번째 일치에서
    /// 허용합니다. 알 수 없는 역할은 건너뛰고, 일치가 없으면 거부합니다.
    pub fn check_permission<S: AsRef<str>>(&self, roles: &[S], resource: &str, action: &str) -> bool {
        let guard = self.roles.read();
        let granted = evaluate(&guard, roles, resource, action);

        if !granted {
            tracing::debug!(
                roles = ?roles.iter().map(|r| r.as_ref()).collect::<Vec<&str>>(),
                resource = resource,
                action = action,
                "권한 거부"
            );
        }
        granted
    }

    /// (resource, action) 쌍 중 하나라도 허용되면 true.
    ///
    /// 모든 쌍을 하나의 읽기 잠금 안에서 평가합니다.
    pub fn check_any_permission<S: AsRef<str>>(&self, roles: &[S], requested: &[(&str, &str)]) -> bool {
        let guard = self.roles.read();
        let granted = requested
            .iter()
            .any(|(resource, action)| evaluate(&guard, roles, resource, action));

        if !granted {
            tracing::debug!(
                roles = ?roles.iter().map(|r| r.as_ref()).collect::<Vec<&str>>(),
                requested = ?requested,
                "권한 거부"
            );
        }
        granted
    }

    /// 역할 정의를 조회합니다.
    pub fn get_role(&self, name: &str) -> AuthResult<Role> {
        self.roles
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AuthError::RoleNotFound(name.to_string()))
    }

    /// 특정 시점의 역할 목록 사본을 이름순으로 반환합니다.
    pub fn list_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.roles.read().values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// 역할 존재 여부.
    pub fn contains_role(&self, name: &str) -> bool {
        self.roles.read().contains_key(name)
    }

    /// 등록된 역할 수.
    pub fn len(&self) -> usize {
        self.roles.read().len()
    }

    /// 역할이 하나도 없는지 확인.
    pub fn is_empty(&self) -> bool {
        self.roles.read().is_empty()
    }

    /// 새 역할을 추가합니다. 같은 이름이 있으면 실패합니다.
    pub fn add_role(&self, role: Role) -> AuthResult<()> {
        let mut guard = self.roles.write();
        if guard.contains_key(&role.name) {
            return Err(AuthError::RoleAlreadyExists(role.name));
        }

        tracing::info!(
            role = %role.name,
            permissions = role.permissions.len(),
            "역할 추가"
        );
        guard.insert(role.name.clone(), role);
        Ok(())
    }

    /// 기존 역할을 통째로 교체합니다. 권한 목록은 병합하지 않습니다.
    pub fn update_role(&self, role: Role) -> AuthResult<()> {
        let mut guard = self.roles.write();
        let Some(slot) = guard.get_mut(&role.name) else {
            return Err(AuthError::RoleNotFound(role.name));
        };

        tracing::info!(
            role = %role.name,
            permissions = role.permissions.len(),
            "역할 갱신"
        );
        *slot = role;
        Ok(())
    }

    /// 역할을 삭제합니다.
    pub fn delete_role(&self, name: &str) -> AuthResult<()> {
        if self.roles.write().remove(name).is_none() {
            return Err(AuthError::RoleNotFound(name.to_string()));
        }

        tracing::info!(role = name, "역할 삭제");
        Ok(())
    }

    /// 외부 신원 매핑.
    pub fn mapper(&self) -> &RoleMapper {
        &self.mapper
    }

    /// 사용자가 보유한 역할로 권한을 확인합니다.
    pub fn check_user_permission(&self, user: &User, resource: &str, action: &str) -> bool {
        self.check_permission(user.roles.as_slice(), resource, action)
    }
}

fn evaluate<S: AsRef<str>>(
    roles_by_name: &HashMap<String, Role>,
    roles: &[S],
    resource: &str,
    action: &str,
) -> bool {
    for role_name in roles {
        let role_name = role_name.as_ref();
        let Some(role) = roles_by_name.get(role_name) else {
            tracing::debug!(role = role_name, "역할을 찾을 수 없음");
            continue;
        };

        if role.grants(resource, action) {
            tracing::debug!(
                role = role_name,
                resource = resource,
                action = action,
                "권한 허용"
            );
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::Permission;

    fn auditor() -> Role {
        Role::new("auditor", "Reads logs", vec![Permission::new("logs", ["read"])])
    }

    #[test]
    fn test_default_roles_loaded() {
        let store = RoleStore::default();
        assert_eq!(store.len(), 3);
        assert!(store.contains_role("admin"));
        assert!(store.contains_role("operator"));
        assert!(store.contains_role("viewer"));
    }

    #[test]
    fn test_configured_roles_replace_defaults() {
        let config = RbacConfig {
            roles: vec![auditor()],
            ..Default::default()
        };
        let store = RoleStore::new(&config);

        assert_eq!(store.len(), 1);
        assert!(!store.contains_role("admin"));
        assert!(store.check_permission(&["auditor"], "logs", "read"));
    }

    #[test]
    fn test_duplicate_config_roles_last_wins() {
        let mut second = auditor();
        second.permissions = vec![Permission::new("metrics", ["read"])];
        let config = RbacConfig {
            roles: vec![auditor(), second],
            ..Default::default()
        };
        let store = RoleStore::new(&config);

        assert_eq!(store.len(), 1);
        assert!(store.check_permission(&["auditor"], "metrics", "read"));
        assert!(!store.check_permission(&["auditor"], "logs", "read"));
    }

    #[test]
    fn test_check_permission_defaults() {
        let store = RoleStore::default();

        assert!(store.check_permission(&["admin"], "anything", "anything"));
        assert!(!store.check_permission(&["viewer"], "users", "delete"));
        assert!(!store.check_permission::<&str>(&[], "tools", "read"));
        assert!(store.check_permission(&["viewer"], "tools", "read"));
    }

    #[test]
    fn test_unknown_roles_skipped() {
        let store = RoleStore::default();

        assert!(!store.check_permission(&["ghost"], "tools", "read"));
        assert!(store.check_permission(&["ghost", "viewer"], "tools", "read"));
    }

    #[test]
    fn test_roles_are_or_combined() {
        let store = RoleStore::default();
        let roles = vec!["viewer".to_string(), "operator".to_string()];

        assert!(store.check_permission(roles.as_slice(), "deployments", "deploy"));
        assert!(!store.check_permission(roles.as_slice(), "users", "create"));
    }

    #[test]
    fn test_check_any_permission() {
        let store = RoleStore::default();

        assert!(store.check_any_permission(&["viewer"], &[("users", "delete"), ("logs", "list")]));
        assert!(!store.check_any_permission(&["viewer"], &[("users", "delete"), ("logs", "delete")]));
        assert!(!store.check_any_permission(&["viewer"], &[]));
    }

    #[test]
    fn test_add_role_twice() {
        let store = RoleStore::default();

        assert!(store.add_role(auditor()).is_ok());
        let err = store.add_role(auditor()).unwrap_err();
        assert!(matches!(err, AuthError::RoleAlreadyExists(name) if name == "auditor"));
    }

    #[test]
    fn test_delete_then_get() {
        let store = RoleStore::default();
        store.add_role(auditor()).unwrap();

        store.delete_role("auditor").unwrap();
        assert!(matches!(store.get_role("auditor"), Err(AuthError::RoleNotFound(_))));
        assert!(matches!(store.delete_role("auditor"), Err(AuthError::RoleNotFound(_))));
    }

    #[test]
    fn test_update_role_full_replace() {
        let store = RoleStore::default();
        store.add_role(auditor()).unwrap();

        let replacement = Role::new(
            "auditor",
            "Reads metrics",
            vec![Permission::new("metrics", ["read", "list"])],
        );
        store.update_role(replacement.clone()).unwrap();

        assert_eq!(store.get_role("auditor").unwrap(), replacement);
        assert!(!store.check_permission(&["auditor"], "logs", "read"));
        assert!(store.check_permission(&["auditor"], "metrics", "list"));
    }

    #[test]
    fn test_update_missing_role() {
        let store = RoleStore::default();
        assert!(matches!(store.update_role(auditor()), Err(AuthError::RoleNotFound(_))));
    }

    #[test]
    fn test_list_roles_is_snapshot() {
        let store = RoleStore::default();
        let snapshot = store.list_roles();

        store.delete_role("viewer").unwrap();

        let names: Vec<&str> = snapshot.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["admin", "operator", "viewer"]);
        assert_eq!(store.list_roles().len(), 2);
    }

    #[test]
    fn test_check_user_permission() {
        let store = RoleStore::default();
        let user = User::new("u-1", "alice").with_roles(["operator"]);

        assert!(store.check_user_permission(&user, "configurations", "delete"));
        assert!(!store.check_user_permission(&user, "users", "read"));
    }
}
