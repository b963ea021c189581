//! 토큰 검증.
//!
//! 1. 구조/서명: HMAC 계열이 아닌 알고리즘은 즉시 거부하고 서명을 확인
//! 2. 시간: 만료(`TokenExpired`)와 유효 시작 시각
//! 3. 의미: 발급자 일치, 설정된 audience와의 교집합
//!
//! 앞 단계가 실패하면 뒤 단계는 실행하지 않으며 Claims도 반환하지 않습니다.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header};

use super::manager::HMAC_ALGORITHMS;
use super::{Claims, TokenManager};
use crate::error::{AuthError, AuthResult};
use crate::types::TokenType;

impl TokenManager {
    /// 토큰을 검증하고 Claims를 반환합니다.
    pub fn validate_token(&self, token: &str) -> AuthResult<Claims> {
        self.verify(token).inspect_err(|e| {
            tracing::debug!(error = %e, "토큰 검증 실패");
        })
    }

    /// Access Token만 허용하는 검증.
    pub fn validate_access_token(&self, token: &str) -> AuthResult<Claims> {
        let claims = self.validate_token(token)?;
        claims.ensure_type(TokenType::Access)?;
        Ok(claims)
    }

    fn verify(&self, token: &str) -> AuthResult<Claims> {
        // 알고리즘 치환 공격 방지
        let header = decode_header(token).map_err(|_| AuthError::InvalidToken)?;
        if !HMAC_ALGORITHMS.contains(&header.alg) {
            tracing::warn!(alg = ?header.alg, "허용되지 않은 서명 알고리즘");
            return Err(AuthError::InvalidToken);
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims,
                _ => AuthError::InvalidToken,
            })?
            .claims;

        if claims.iss != self.issuer {
            return Err(AuthError::IssuerMismatch {
                expected: self.issuer.clone(),
                actual: claims.iss,
            });
        }

        if !self.audience_accepted(&claims) {
            return Err(AuthError::AudienceMismatch);
        }

        Ok(claims)
    }

    /// 설정된 audience 중 하나라도 토큰 audience에 있으면 통과.
    ///
    /// 설정이 비어 있으면 항상 통과합니다. Refresh Token은 audience 없이
    /// 발급되므로 audience가 비어 있는 refresh 토큰도 통과합니다.
    fn audience_accepted(&self, claims: &Claims) -> bool {
        if self.audience.is_empty() {
            return true;
        }
        if claims.token_type == TokenType::Refresh && claims.aud.is_empty() {
            return true;
        }
        self.audience
            .iter()
            .any(|expected| claims.aud.iter().any(|aud| aud == expected))
    }
}
