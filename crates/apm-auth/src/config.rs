//! 인증 설정.
//!
//! JWT, API 키, RBAC 설정을 정의하고 파일/환경 변수에서 로드합니다.
//! 비어 있는 값(0 TTL, 빈 발급자)은 기본값으로 대체됩니다.

use chrono::Duration;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::apikey::{ApiKey, ApiKeyManager};
use crate::error::{AuthError, AuthResult};
use crate::rbac::{Role, RoleStore};
use crate::token::TokenManager;

/// 기본 발급자.
pub const DEFAULT_ISSUER: &str = "apm-system";

/// 기본 Access Token 유효 기간 (15분).
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// 기본 Refresh Token 유효 기간 (7일).
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// 환경 변수 접두사 (`APM__JWT__ISSUER` 형태).
const ENV_PREFIX: &str = "APM";

/// 인증 설정 루트.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT 설정
    #[serde(default)]
    pub jwt: JwtConfig,
    /// API 키 설정
    #[serde(default)]
    pub api_key: ApiKeyConfig,
    /// 역할 기반 접근 제어 설정
    #[serde(default)]
    pub rbac: RbacConfig,
    /// JWT 인증 활성화 (`false`면 [`AuthConfig::token_manager`]가 `None`)
    #[serde(default = "default_true")]
    pub enable_jwt: bool,
    /// API 키 인증 활성화 (`false`면 [`AuthConfig::api_key_manager`]가 `None`)
    #[serde(default)]
    pub enable_api_key: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            api_key: ApiKeyConfig::default(),
            rbac: RbacConfig::default(),
            enable_jwt: true,
            enable_api_key: false,
        }
    }
}

/// JWT 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// 서명 비밀 키 (없으면 프로세스마다 무작위 생성)
    #[serde(default)]
    pub secret: Option<SecretString>,
    /// 발급자
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// 허용 audience 목록 (비어 있으면 검사하지 않음)
    #[serde(default)]
    pub audience: Vec<String>,
    /// Access Token 유효 기간 (초)
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_secs: u64,
    /// Refresh Token 유효 기간 (초)
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_secs: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: default_issuer(),
            audience: Vec::new(),
            access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
        }
    }
}

impl JwtConfig {
    /// 비밀 키를 설정합니다.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(SecretString::from(secret.into()));
        self
    }

    /// 발급자를 설정합니다.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// 허용 audience 목록을 설정합니다.
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    /// 토큰 유효 기간을 설정합니다 (초).
    pub fn with_ttls(mut self, access_secs: u64, refresh_secs: u64) -> Self {
        self.access_token_ttl_secs = access_secs;
        self.refresh_token_ttl_secs = refresh_secs;
        self
    }

    /// 실제로 사용할 발급자.
    pub fn effective_issuer(&self) -> &str {
        if self.issuer.is_empty() {
            DEFAULT_ISSUER
        } else {
            &self.issuer
        }
    }

    /// Access Token 유효 기간.
    pub fn access_token_ttl(&self) -> AuthResult<Duration> {
        ttl_or_default(self.access_token_ttl_secs, DEFAULT_ACCESS_TOKEN_TTL_SECS)
    }

    /// Refresh Token 유효 기간.
    pub fn refresh_token_ttl(&self) -> AuthResult<Duration> {
        ttl_or_default(self.refresh_token_ttl_secs, DEFAULT_REFRESH_TOKEN_TTL_SECS)
    }
}

fn ttl_or_default(secs: u64, default: u64) -> AuthResult<Duration> {
    let secs = if secs == 0 { default } else { secs };
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| AuthError::InvalidConfig(format!("토큰 유효 기간이 너무 깁니다: {}초", secs)))
}

/// API 키 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiKeyConfig {
    /// API 키를 읽을 헤더 이름
    #[serde(default = "default_header_name")]
    pub header_name: String,
    /// API 키를 읽을 쿼리 파라미터
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// 사전 등록된 키 (`key` 필드는 원문 키)
    #[serde(default)]
    pub keys: HashMap<String, ApiKey>,
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            query_param: default_query_param(),
            keys: HashMap::new(),
        }
    }
}

/// 역할 기반 접근 제어 설정.
///
/// 저장소 생성 시 한 번만 사용됩니다.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RbacConfig {
    /// 역할 정의 (비어 있으면 기본 역할 사용)
    #[serde(default)]
    pub roles: Vec<Role>,
    /// 매핑되는 역할이 없을 때 부여할 기본 역할
    #[serde(default)]
    pub default_role: String,
    /// 외부 신원(그룹) 이름 → 역할 이름
    #[serde(default)]
    pub role_mapping: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}
fn default_issuer() -> String {
    DEFAULT_ISSUER.to_string()
}
fn default_access_ttl() -> u64 {
    DEFAULT_ACCESS_TOKEN_TTL_SECS
}
fn default_refresh_ttl() -> u64 {
    DEFAULT_REFRESH_TOKEN_TTL_SECS
}
fn default_header_name() -> String {
    "X-API-Key".to_string()
}
fn default_query_param() -> String {
    "api_key".to_string()
}

impl AuthConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> AuthResult<Self> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder().add_source(config::File::from(path.as_ref()));
        Self::build(builder)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> AuthResult<Self> {
        Self::load("config/auth.toml")
    }

    /// TOML 문자열에서 설정을 로드합니다 (환경 변수 오버라이드 포함).
    pub fn from_toml_str(contents: &str) -> AuthResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml));
        Self::build(builder)
    }

    /// JWT 인증이 활성화된 경우 토큰 관리자를 생성합니다.
    pub fn token_manager(&self) -> AuthResult<Option<TokenManager>> {
        if !self.enable_jwt {
            tracing::info!("JWT 인증 비활성화");
            return Ok(None);
        }
        TokenManager::new(&self.jwt).map(Some)
    }

    /// API 키 인증이 활성화된 경우 API 키 관리자를 생성합니다.
    pub fn api_key_manager(&self) -> Option<ApiKeyManager> {
        if !self.enable_api_key {
            tracing::info!("API 키 인증 비활성화");
            return None;
        }
        Some(ApiKeyManager::new(&self.api_key))
    }

    /// 역할 저장소를 생성합니다.
    pub fn role_store(&self) -> RoleStore {
        RoleStore::new(&self.rbac)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> AuthResult<Self> {
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }
}
