//! JWT 페이로드.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};
use crate::rbac::RoleStore;
use crate::types::{TokenType, User};

/// 서명된 토큰에 담기는 Claims.
///
/// 시간 필드는 Unix timestamp(초)이며, `aud`는 값이 하나여도 항상 배열로
/// 직렬화됩니다. 서명 이후에는 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Issuer - 발급자
    pub iss: String,
    /// Subject - 사용자 ID
    pub sub: String,
    /// Audience - 대상 서비스 목록
    #[serde(default)]
    pub aud: Vec<String>,
    /// Expiration - 만료 시각
    pub exp: i64,
    /// Not Before - 유효 시작 시각
    pub nbf: i64,
    /// Issued At - 발급 시각
    pub iat: i64,
    /// JWT ID - 토큰 고유 식별자
    pub jti: String,
    /// 발급 시점의 사용자 정보 (refresh token에는 없음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// 발급 시점의 역할 목록
    #[serde(default)]
    pub roles: Vec<String>,
    /// 토큰 종류
    pub token_type: TokenType,
}

impl Claims {
    /// 만료 시각.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// 토큰이 만료되었는지 확인.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// 특정 역할을 가지는지 확인.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// 토큰에 담긴 역할로 권한을 확인.
    pub fn has_permission(&self, store: &RoleStore, resource: &str, action: &str) -> bool {
        store.check_permission(self.roles.as_slice(), resource, action)
    }

    /// 토큰 종류가 기대값과 다르면 `WrongTokenCategory`.
    pub fn ensure_type(&self, expected: TokenType) -> AuthResult<()> {
        if self.token_type == expected {
            Ok(())
        } else {
            Err(AuthError::WrongTokenCategory {
                expected,
                actual: self.token_type,
            })
        }
    }
}
