//! 인증/인가 에러 타입.
//!
//! 토큰 검증, 역할 저장소, API 키 관리에서 발생하는 에러를 하나의 열거형으로
//! 정의합니다. 내부에서 재시도하는 에러는 없습니다.

use thiserror::Error;

use crate::types::TokenType;

/// 인증 및 인가 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 구조/파싱 실패 등 일반적인 토큰 오류
    #[error("유효하지 않은 토큰")]
    InvalidToken,

    /// 만료 시각이 지난 토큰
    #[error("토큰이 만료되었습니다")]
    TokenExpired,

    /// 서명 검증 실패
    #[error("토큰 서명이 올바르지 않습니다")]
    InvalidSignature,

    /// 페이로드를 Claims 형태로 해석할 수 없음
    #[error("잘못된 토큰 클레임")]
    InvalidClaims,

    /// 발급자 불일치
    #[error("발급자 불일치: expected {expected}, got {actual}")]
    IssuerMismatch { expected: String, actual: String },

    /// 허용된 audience와 겹치는 값이 없음
    #[error("audience 불일치")]
    AudienceMismatch,

    /// 올바르게 서명되었지만 다른 흐름에 사용된 토큰
    #[error("잘못된 토큰 종류: expected {expected}, got {actual}")]
    WrongTokenCategory {
        expected: TokenType,
        actual: TokenType,
    },

    /// 이미 존재하는 역할
    #[error("역할이 이미 존재합니다: {0}")]
    RoleAlreadyExists(String),

    /// 존재하지 않는 역할
    #[error("역할을 찾을 수 없습니다: {0}")]
    RoleNotFound(String),

    /// 서명 실패 (키 형식 오류 등)
    #[error("토큰 서명 실패: {0}")]
    Signing(String),

    /// 보안 난수를 얻을 수 없음
    #[error("보안 난수 생성 실패: {0}")]
    Randomness(String),

    /// 잘못된 설정
    #[error("설정 에러: {0}")]
    InvalidConfig(String),

    /// 등록되지 않은 API 키
    #[error("API 키를 찾을 수 없습니다")]
    ApiKeyNotFound,

    /// 만료된 API 키
    #[error("API 키가 만료되었습니다")]
    ApiKeyExpired,
}

/// 인증 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// 토큰 발급/검증 단계의 에러인지 확인합니다.
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidToken
                | AuthError::TokenExpired
                | AuthError::InvalidSignature
                | AuthError::InvalidClaims
                | AuthError::IssuerMismatch { .. }
                | AuthError::AudienceMismatch
                | AuthError::WrongTokenCategory { .. }
        )
    }

    /// 역할 저장소 조회/변경 에러인지 확인합니다.
    pub fn is_rbac_error(&self) -> bool {
        matches!(
            self,
            AuthError::RoleAlreadyExists(_) | AuthError::RoleNotFound(_)
        )
    }

    /// 프로세스 초기화를 중단해야 하는 치명적인 에러인지 확인합니다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthError::Randomness(_) | AuthError::InvalidConfig(_))
    }
}

impl From<config::ConfigError> for AuthError {
    fn from(err: config::ConfigError) -> Self {
        AuthError::InvalidConfig(err.to_string())
    }
}
