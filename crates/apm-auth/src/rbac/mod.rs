//! 역할 기반 접근 제어 (RBAC).
//!
//! 명시적 허용만 있는 모델입니다. 역할 집합 중 하나라도 (리소스, 액션)을
//! 허용하면 통과하고, 그렇지 않으면 거부합니다.

mod mapping;
mod role;
mod store;

pub use mapping::RoleMapper;
pub use role::{actions, default_roles, resources, Permission, Role, WILDCARD};
pub use store::RoleStore;
