//! 역할 및 권한 정의.
//!
//! 권한 규칙은 역할별로 순서가 있는 (리소스 패턴, 액션 집합) 목록이며,
//! 와일드카드는 리터럴 `*` 하나뿐입니다.

use serde::{Deserialize, Serialize};

/// 모든 값과 일치하는 와일드카드.
pub const WILDCARD: &str = "*";

/// 잘 알려진 액션 이름.
pub mod actions {
    pub const CREATE: &str = "create";
    pub const READ: &str = "read";
    pub const UPDATE: &str = "update";
    pub const DELETE: &str = "delete";
    pub const LIST: &str = "list";
    pub const DEPLOY: &str = "deploy";
    pub const MANAGE: &str = "manage";
    pub const ALL: &str = super::WILDCARD;
}

/// 잘 알려진 리소스 이름.
pub mod resources {
    pub const TOOLS: &str = "tools";
    pub const DEPLOYMENTS: &str = "deployments";
    pub const CONFIGURATIONS: &str = "configurations";
    pub const METRICS: &str = "metrics";
    pub const LOGS: &str = "logs";
    pub const ALERTS: &str = "alerts";
    pub const DASHBOARDS: &str = "dashboards";
    pub const USERS: &str = "users";
    pub const API_KEYS: &str = "api_keys";
    pub const ALL: &str = super::WILDCARD;
}

/// 단일 권한 규칙.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// 리소스 이름 또는 `*`
    pub resource: String,
    /// 허용 액션 (`*` 포함 가능)
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Permission {
    /// 새로운 권한 규칙 생성.
    pub fn new<I, S>(resource: impl Into<String>, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource: resource.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// 리소스 패턴이 주어진 리소스와 일치하는지 확인.
    pub fn matches_resource(&self, resource: &str) -> bool {
        self.resource == WILDCARD || self.resource == resource
    }

    /// 액션 집합이 주어진 액션을 포함하는지 확인.
    pub fn matches_action(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == WILDCARD || a == action)
    }

    /// 이 규칙이 (resource, action)을 허용하는지 확인.
    pub fn allows(&self, resource: &str, action: &str) -> bool {
        self.matches_resource(resource) && self.matches_action(action)
    }
}

/// 사용자 역할.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// 역할 이름 (저장소 내에서 유일)
    pub name: String,
    /// 설명
    #[serde(default)]
    pub description: String,
    /// 선언 순서대로 평가되는 권한 목록
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl Role {
    /// 새로운 역할 생성.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            permissions,
        }
    }

    /// 역할이 (resource, action)을 허용하는 첫 번째 권한을 반환.
    pub fn granting_permission(&self, resource: &str, action: &str) -> Option<&Permission> {
        self.permissions.iter().find(|p| p.allows(resource, action))
    }

    /// 역할이 (resource, action)을 허용하는지 확인.
    pub fn grants(&self, resource: &str, action: &str) -> bool {
        self.granting_permission(resource, action).is_some()
    }
}

/// 설정에 역할이 없을 때 사용하는 기본 역할 (admin, operator, viewer).
pub fn default_roles() -> Vec<Role> {
    use actions::*;
    use resources::*;

    let read_list = [READ, LIST];

    vec![
        Role::new(
            "admin",
            "Full system administrator",
            vec![Permission::new(resources::ALL, [actions::ALL])],
        ),
        Role::new(
            "operator",
            "Can manage deployments and configurations",
            vec![
                Permission::new(TOOLS, [READ, UPDATE, MANAGE]),
                Permission::new(DEPLOYMENTS, [actions::ALL]),
                Permission::new(CONFIGURATIONS, [actions::ALL]),
                Permission::new(METRICS, read_list),
                Permission::new(LOGS, read_list),
                Permission::new(ALERTS, [READ, UPDATE, LIST]),
                Permission::new(DASHBOARDS, read_list),
            ],
        ),
        Role::new(
            "viewer",
            "Read-only access to monitoring data",
            [
                TOOLS,
                DEPLOYMENTS,
                CONFIGURATIONS,
                METRICS,
                LOGS,
                ALERTS,
                DASHBOARDS,
            ]
            .into_iter()
            .map(|resource| Permission::new(resource, read_list))
            .collect(),
        ),
    ]
}
