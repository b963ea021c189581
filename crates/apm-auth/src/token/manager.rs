//! 토큰 관리자 생성과 발급.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use secrecy::ExposeSecret;

use super::secret::{generate_secret, generate_token_id};
use super::Claims;
use crate::config::JwtConfig;
use crate::error::{AuthError, AuthResult};
use crate::types::{TokenResponse, TokenType, User};

/// 허용하는 서명 알고리즘 (HMAC 계열).
pub(crate) const HMAC_ALGORITHMS: [Algorithm; 3] =
    [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Access/Refresh Token 발급, 검증, 갱신을 담당합니다.
///
/// 생성 후에는 설정과 키가 바뀌지 않으므로 여러 스레드에서 추가 동기화 없이
/// 공유할 수 있습니다. 인스턴스마다 독립된 비밀 키를 가집니다.
pub struct TokenManager {
    pub(super) issuer: String,
    pub(super) audience: Vec<String>,
    pub(super) access_ttl: Duration,
    pub(super) refresh_ttl: Duration,
    encoding_key: EncodingKey,
    pub(super) decoding_key: DecodingKey,
    pub(super) validation: Validation,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

impl TokenManager {
    /// JWT 설정으로 관리자를 생성합니다.
    ///
    /// 비밀 키가 없으면 보안 난수로 한 번 생성해 인스턴스 수명 동안 사용합니다.
    /// 프로세스가 재시작되면 이전에 발급한 토큰은 모두 무효가 됩니다.
    ///
    /// # Errors
    ///
    /// * `Randomness` - 비밀 키 생성에 필요한 보안 난수를 얻지 못함
    /// * `InvalidConfig` - Access Token 유효 기간이 Refresh Token보다 짧지 않음
    pub fn new(config: &JwtConfig) -> AuthResult<Self> {
        let access_ttl = config.access_token_ttl()?;
        let refresh_ttl = config.refresh_token_ttl()?;
        if access_ttl >= refresh_ttl {
            return Err(AuthError::InvalidConfig(format!(
                "access token 유효 기간({}초)은 refresh token 유효 기간({}초)보다 짧아야 합니다",
                access_ttl.num_seconds(),
                refresh_ttl.num_seconds()
            )));
        }
        if Utc::now().checked_add_signed(refresh_ttl).is_none() {
            return Err(AuthError::InvalidConfig(format!(
                "refresh token 유효 기간이 표현 가능한 시각 범위를 넘습니다: {}초",
                refresh_ttl.num_seconds()
            )));
        }

        let configured = config
            .secret
            .as_ref()
            .filter(|s| !s.expose_secret().is_empty());
        let secret = match configured {
            Some(secret) => secret.clone(),
            None => {
                let secret = generate_secret(&mut OsRng)?;
                tracing::warn!("JWT 비밀 키가 설정되지 않아 무작위 키를 생성했습니다");
                secret
            }
        };
        let key = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // 발급자/audience는 서명과 만료 검사 이후 직접 확인
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Ok(Self {
            issuer: config.effective_issuer().to_string(),
            audience: config.audience.clone(),
            access_ttl,
            refresh_ttl,
            encoding_key: EncodingKey::from_secret(key),
            decoding_key: DecodingKey::from_secret(key),
            validation,
        })
    }

    /// 발급자.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// 허용 audience 목록.
    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    /// Access Token 유효 기간.
    pub fn access_token_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Refresh Token 유효 기간.
    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Access Token + Refresh Token 쌍 발급.
    ///
    /// 하나의 `now`를 nbf/iat에 공통으로 사용합니다. Refresh Token은 사용자
    /// 참조만 담고 audience와 역할 스냅샷은 담지 않습니다.
    pub fn issue_access_token(&self, user: &User) -> AuthResult<TokenResponse> {
        if user.id.is_empty() {
            return Err(AuthError::InvalidClaims);
        }

        let now = Utc::now().trunc_subsecs(0);
        let expires_at = expires_after(now, self.access_ttl)?;
        let refresh_expires_at = expires_after(now, self.refresh_ttl)?;

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: user.id.clone(),
            aud: self.audience.clone(),
            exp: expires_at.timestamp(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            jti: generate_token_id(&mut OsRng),
            user: Some(user.clone()),
            roles: user.roles.clone(),
            token_type: TokenType::Access,
        };

        let access_token = self.sign(&claims).inspect_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "access token 서명 실패");
        })?;

        let refresh_claims = Claims {
            iss: self.issuer.clone(),
            sub: user.id.clone(),
            aud: Vec::new(),
            exp: refresh_expires_at.timestamp(),
            nbf: now.timestamp(),
            iat: now.timestamp(),
            jti: generate_token_id(&mut OsRng),
            user: None,
            roles: Vec::new(),
            token_type: TokenType::Refresh,
        };

        let refresh_token = self.sign(&refresh_claims).inspect_err(|e| {
            tracing::error!(error = %e, user_id = %user.id, "refresh token 서명 실패");
        })?;

        tracing::debug!(
            user_id = %user.id,
            jti = %claims.jti,
            expires_at = %expires_at,
            "토큰 발급"
        );

        Ok(TokenResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
            expires_at,
        })
    }

    /// Claims를 HS256으로 서명합니다.
    pub(crate) fn sign(&self, claims: &Claims) -> AuthResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }
}

fn expires_after(now: DateTime<Utc>, ttl: Duration) -> AuthResult<DateTime<Utc>> {
    now.checked_add_signed(ttl).ok_or_else(|| {
        AuthError::InvalidConfig(format!("만료 시각 계산 오버플로: {}초", ttl.num_seconds()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_secret_when_missing() {
        let manager = TokenManager::new(&JwtConfig::default()).unwrap();
        let user = User::new("u-1", "alice");
        assert!(manager.issue_access_token(&user).is_ok());
    }

    #[test]
    fn test_ttl_ordering_enforced() {
        let config = JwtConfig::default().with_secret("s").with_ttls(3600, 60);
        assert!(matches!(
            TokenManager::new(&config),
            Err(AuthError::InvalidConfig(_))
        ));

        let equal = JwtConfig::default().with_secret("s").with_ttls(60, 60);
        assert!(TokenManager::new(&equal).is_err());
    }

    #[test]
    fn test_unrepresentable_ttl_rejected() {
        let config = JwtConfig::default()
            .with_secret("s")
            .with_ttls(900, 9_000_000_000_000);
        assert!(matches!(
            TokenManager::new(&config),
            Err(AuthError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_expires_after_overflow() {
        let now = Utc::now();
        assert!(matches!(
            expires_after(now, Duration::MAX),
            Err(AuthError::InvalidConfig(_))
        ));
        assert_eq!(expires_after(now, Duration::seconds(60)).unwrap(), now + Duration::seconds(60));
    }

    #[test]
    fn test_empty_user_id_rejected() {
        let manager = TokenManager::new(&JwtConfig::default().with_secret("s")).unwrap();
        let result = manager.issue_access_token(&User::default());
        assert!(matches!(result, Err(AuthError::InvalidClaims)));
    }

    #[test]
    fn test_token_response_metadata() {
        let config = JwtConfig::default().with_secret("s").with_ttls(1800, 86400);
        let manager = TokenManager::new(&config).unwrap();

        let before = Utc::now().timestamp();
        let response = manager.issue_access_token(&User::new("u-1", "alice")).unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 1800);
        assert!(response.expires_at.timestamp() >= before + 1800);
        assert_eq!(response.access_token.split('.').count(), 3);
        assert_eq!(response.refresh_token.split('.').count(), 3);
        assert_ne!(response.access_token, response.refresh_token);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let manager = TokenManager::new(&JwtConfig::default().with_secret("hunter2-signing")).unwrap();
        let debug = format!("{:?}", manager);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2-signing"));
    }
}
