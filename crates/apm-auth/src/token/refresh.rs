//! Refresh Token으로 토큰 쌍 재발급.

use super::TokenManager;
use crate::error::AuthResult;
use crate::types::{TokenResponse, TokenType, User};

impl TokenManager {
    /// Refresh Token을 검증하고 새 Access/Refresh Token 쌍을 발급합니다.
    ///
    /// 제시된 Refresh Token은 사용 처리되지 않으므로 재발급 이후에도 만료
    /// 전까지는 다시 사용할 수 있습니다.
    pub fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let claims = self.validate_token(refresh_token)?;
        claims.ensure_type(TokenType::Refresh)?;

        let snapshot = claims.user.unwrap_or_default();
        let user = User {
            id: claims.sub,
            username: snapshot.username,
            email: snapshot.email,
            roles: claims.roles,
        };

        tracing::debug!(user_id = %user.id, previous_jti = %claims.jti, "토큰 갱신");
        self.issue_access_token(&user)
    }
}
