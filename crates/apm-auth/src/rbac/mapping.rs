//! 외부 신원 → 역할 매핑.

use std::collections::HashMap;

use crate::config::RbacConfig;
use crate::types::User;

/// 외부 신원 제공자의 그룹/역할 이름을 내부 역할 이름으로 변환합니다.
#[derive(Debug, Clone, Default)]
pub struct RoleMapper {
    mapping: HashMap<String, String>,
    default_role: Option<String>,
}

impl RoleMapper {
    /// 매핑과 기본 역할로 생성.
    pub fn new(mapping: HashMap<String, String>, default_role: Option<String>) -> Self {
        Self {
            mapping,
            default_role: default_role.filter(|r| !r.is_empty()),
        }
    }

    /// RBAC 설정에서 생성.
    pub fn from_config(config: &RbacConfig) -> Self {
        Self::new(config.role_mapping.clone(), Some(config.default_role.clone()))
    }

    /// 기본 역할.
    pub fn default_role(&self) -> Option<&str> {
        self.default_role.as_deref()
    }

    /// 외부 이름 목록을 내부 역할 목록으로 변환합니다.
    ///
    /// 순서를 유지하고 중복은 제거합니다. 매핑되는 이름이 하나도 없으면
    /// 기본 역할 하나를, 기본 역할도 없으면 빈 목록을 반환합니다.
    pub fn map_roles<S: AsRef<str>>(&self, external: &[S]) -> Vec<String> {
        let mut roles: Vec<String> = Vec::new();
        for name in external {
            if let Some(role) = self.mapping.get(name.as_ref()) {
                if !roles.contains(role) {
                    roles.push(role.clone());
                }
            }
        }

        if roles.is_empty() {
            if let Some(default) = &self.default_role {
                tracing::debug!(role = %default, "매핑된 역할 없음, 기본 역할 적용");
                roles.push(default.clone());
            }
        }
        roles
    }

    /// 외부 이름을 역할로 갖는 사용자를 내부 역할로 변환한 사본을 반환합니다.
    pub fn resolve_user(&self, user: &User) -> User {
        User {
            roles: self.map_roles(user.roles.as_slice()),
            ..user.clone()
        }
    }
}
