//! 인증 도메인 공통 타입.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::apikey::ApiKey;
use crate::token::Claims;

/// 인증된 사용자.
///
/// 외부 신원 제공자가 소유하며, 이 크레이트에서는 변경하지 않는 입력값으로만
/// 다룹니다.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    /// 사용자 고유 ID
    pub id: String,
    /// 사용자 이름
    #[serde(default)]
    pub username: String,
    /// 이메일
    #[serde(default)]
    pub email: String,
    /// 보유 역할 이름
    #[serde(default)]
    pub roles: Vec<String>,
}

impl User {
    /// 새로운 사용자 생성.
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    /// 이메일을 설정합니다.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    /// 역할 목록을 설정합니다.
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }
}

/// 토큰 종류.
///
/// 서명 후에는 변경되지 않으며, 어떤 검증 경로가 토큰을 받아들일지 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// API 호출용 단기 토큰
    Access,
    /// 토큰 쌍 재발급 전용 장기 토큰
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        };
        write!(f, "{}", s)
    }
}

/// 토큰 발급 응답.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access Token
    pub access_token: String,
    /// Refresh Token
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// Access Token 만료까지 남은 시간 (초)
    pub expires_in: i64,
    /// Access Token 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// 인증 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    /// 서명된 JWT
    Jwt,
    /// API 키
    ApiKey,
    /// 일반 Bearer 토큰
    Bearer,
}

/// 인증 성공 후 요청 처리 계층에 전달되는 컨텍스트.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// 인증된 사용자
    pub user: User,
    /// 사용된 인증 방식
    pub auth_type: AuthType,
    /// JWT 인증인 경우 검증된 Claims
    pub claims: Option<Claims>,
}

impl AuthContext {
    /// 검증된 access token Claims에서 컨텍스트를 생성합니다.
    pub fn from_claims(claims: Claims) -> Self {
        let mut user = claims.user.clone().unwrap_or_default();
        user.id = claims.sub.clone();
        user.roles = claims.roles.clone();
        Self {
            user,
            auth_type: AuthType::Jwt,
            claims: Some(claims),
        }
    }

    /// 검증된 API 키에서 컨텍스트를 생성합니다.
    pub fn from_api_key(key: &ApiKey) -> Self {
        Self {
            user: User {
                id: key.user_id.clone(),
                username: key.name.clone(),
                email: String::new(),
                roles: key.roles.clone(),
            },
            auth_type: AuthType::ApiKey,
            claims: None,
        }
    }

    /// 컨텍스트의 역할 목록.
    pub fn roles(&self) -> &[String] {
        &self.user.roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_serialization() {
        let json = serde_json::to_string(&TokenType::Refresh).unwrap();
        assert_eq!(json, "\"refresh\"");

        let parsed: TokenType = serde_json::from_str("\"access\"").unwrap();
        assert_eq!(parsed, TokenType::Access);
        assert!(serde_json::from_str::<TokenType>("\"id\"").is_err());
    }

    #[test]
    fn test_user_builder() {
        let user = User::new("u-1", "alice")
            .with_email("alice@example.com")
            .with_roles(["operator", "viewer"]);

        assert_eq!(user.id, "u-1");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.roles, vec!["operator", "viewer"]);
    }

    #[test]
    fn test_auth_type_serialization() {
        let json = serde_json::to_string(&AuthType::ApiKey).unwrap();
        assert_eq!(json, "\"api_key\"");
    }

    #[test]
    fn test_context_from_api_key() {
        let key = ApiKey {
            id: "key_1".to_string(),
            key: String::new(),
            name: "ci".to_string(),
            user_id: "svc-ci".to_string(),
            roles: vec!["operator".to_string()],
            created_at: Utc::now(),
            last_used_at: Utc::now(),
            expires_at: None,
        };

        let context = AuthContext::from_api_key(&key);
        assert_eq!(context.auth_type, AuthType::ApiKey);
        assert_eq!(context.user.id, "svc-ci");
        assert_eq!(context.roles(), ["operator".to_string()]);
        assert!(context.claims.is_none());
    }
}
