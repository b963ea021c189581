//! APM 플랫폼 인증/인가 코어.
//!
//! - [`token::TokenManager`]: Access/Refresh Token 발급, 검증, 갱신
//! - [`rbac::RoleStore`]: 역할 저장소와 권한 평가
//! - [`apikey::ApiKeyManager`]: API 키 발급, 검증, 폐기
//!
//! 모든 연산은 동기식이며 I/O가 없습니다. `TokenManager`는 생성 후 불변이고,
//! `RoleStore`와 `ApiKeyManager`는 내부 `RwLock`으로 동시 접근을 처리합니다.
//!
//! ```
//! use apm_auth::config::JwtConfig;
//! use apm_auth::rbac::{actions, resources, RoleStore};
//! use apm_auth::token::TokenManager;
//! use apm_auth::User;
//!
//! let manager = TokenManager::new(&JwtConfig::default().with_secret("doc-secret")).unwrap();
//! let store = RoleStore::default();
//!
//! let user = User::new("u-1", "alice").with_roles(["viewer"]);
//! let response = manager.issue_access_token(&user).unwrap();
//! let claims = manager.validate_access_token(&response.access_token).unwrap();
//!
//! assert!(claims.has_permission(&store, resources::METRICS, actions::READ));
//! assert!(!claims.has_permission(&store, resources::METRICS, actions::DELETE));
//! ```

pub mod apikey;
pub mod config;
pub mod error;
pub mod logging;
pub mod rbac;
pub mod token;
pub mod types;

pub use apikey::{ApiKey, ApiKeyManager};
pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use rbac::{Permission, Role, RoleStore};
pub use token::{Claims, TokenManager};
pub use types::{AuthContext, AuthType, TokenResponse, TokenType, User};
