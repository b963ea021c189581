//! 비밀 키와 토큰 ID 생성.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use secrecy::SecretString;

use crate::error::{AuthError, AuthResult};

/// 자동 생성 비밀 키 크기 (바이트)
pub const SECRET_SIZE: usize = 32;

/// 토큰 ID 난수 크기 (바이트)
pub const TOKEN_ID_SIZE: usize = 16;

const TOKEN_ID_PREFIX: &str = "apm-";

/// 무작위 서명 비밀 키를 생성합니다.
///
/// 보안 난수를 얻지 못하면 약한 키로 진행하지 않고 실패합니다.
pub(crate) fn generate_secret<R: RngCore + ?Sized>(rng: &mut R) -> AuthResult<SecretString> {
    let mut bytes = [0u8; SECRET_SIZE];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Randomness(e.to_string()))?;

    let encoded = STANDARD.encode(bytes);
    bytes.fill(0);
    Ok(SecretString::from(encoded))
}

/// 토큰 ID를 생성합니다.
///
/// 난수 생성에 실패하면 발급을 중단하지 않고 시간 기반 ID를 사용합니다.
pub(crate) fn generate_token_id<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; TOKEN_ID_SIZE];
    match rng.try_fill_bytes(&mut bytes) {
        Ok(()) => format!("{}{}", TOKEN_ID_PREFIX, URL_SAFE_NO_PAD.encode(bytes)),
        Err(e) => {
            tracing::warn!(error = %e, "토큰 ID 난수 생성 실패, 시간 기반 ID 사용");
            let nanos = Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_else(|| Utc::now().timestamp_micros());
            format!("{}{}", TOKEN_ID_PREFIX, nanos)
        }
    }
}
