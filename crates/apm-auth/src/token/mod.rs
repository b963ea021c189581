//! JWT 토큰 처리.
//!
//! Access Token 및 Refresh Token 발급/검증/갱신 로직.
//!
//! 토큰 형식은 `header.payload.signature`이며 각 부분은 패딩 없는
//! base64url입니다. 서명은 HMAC-SHA256을 사용합니다.

mod claims;
mod manager;
mod refresh;
pub(crate) mod secret;
mod validator;

pub use claims::Claims;
pub use manager::TokenManager;
pub use secret::{SECRET_SIZE, TOKEN_ID_SIZE};
