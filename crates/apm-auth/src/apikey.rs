//! API 키 관리.
//!
//! 원문 키는 발급 시 한 번만 반환하고, 저장소에는 SHA-256 해시만 보관합니다.
//! 조회/목록 결과에서는 해시도 비워서 돌려줍니다.

use chrono::{DateTime, Duration, Utc};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

use crate::config::ApiKeyConfig;
use crate::error::{AuthError, AuthResult};

/// 원문 API 키 난수 크기 (바이트)
const RAW_KEY_SIZE: usize = 32;

/// API 키 ID 난수 크기 (바이트)
const KEY_ID_SIZE: usize = 16;

/// API 키.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    /// 키 ID
    pub id: String,
    /// 저장소 내부에서는 원문 키의 SHA-256 해시, 외부로 반환할 때는 빈 문자열
    #[serde(default)]
    pub key: String,
    /// 키 이름
    #[serde(default)]
    pub name: String,
    /// 소유자 ID
    #[serde(default)]
    pub user_id: String,
    /// 부여된 역할
    #[serde(default)]
    pub roles: Vec<String>,
    /// 생성 시각
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// 마지막 사용 시각
    #[serde(default = "Utc::now")]
    pub last_used_at: DateTime<Utc>,
    /// 만료 시각 (없으면 만료되지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// 주어진 시각 기준으로 만료되었는지 확인.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    fn redacted(&self) -> Self {
        Self {
            key: String::new(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Default)]
struct KeyIndex {
    /// 해시 → 키
    by_hash: HashMap<String, ApiKey>,
    /// ID → 해시
    by_id: HashMap<String, String>,
}

impl KeyIndex {
    /// 키를 등록합니다. 같은 ID 또는 같은 해시의 기존 키는 두 인덱스에서 모두
    /// 제거되며 반환됩니다.
    fn insert(&mut self, key: ApiKey) -> Vec<ApiKey> {
        let mut replaced = Vec::new();
        if let Some(old_hash) = self.by_id.remove(&key.id) {
            replaced.extend(self.by_hash.remove(&old_hash));
        }
        if let Some(old) = self.by_hash.remove(&key.key) {
            self.by_id.remove(&old.id);
            replaced.push(old);
        }

        self.by_id.insert(key.id.clone(), key.key.clone());
        self.by_hash.insert(key.key.clone(), key);
        replaced
    }

    fn get_by_id(&self, id: &str) -> Option<&ApiKey> {
        self.by_id.get(id).and_then(|hash| self.by_hash.get(hash))
    }
}

/// API 키 발급/검증/폐기 관리자.
#[derive(Debug)]
pub struct ApiKeyManager {
    header_name: String,
    query_param: String,
    index: RwLock<KeyIndex>,
}

impl ApiKeyManager {
    /// 설정으로 관리자를 생성합니다. 설정에 등록된 키는 해시하여 적재합니다.
    pub fn new(config: &ApiKeyConfig) -> Self {
        // 이름순으로 적재하여 중복 시 결과가 항상 같도록 함
        let mut entries: Vec<(&String, &ApiKey)> = config.keys.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let mut index = KeyIndex::default();
        for (name, key) in entries {
            let mut key = key.clone();
            key.key = hash_key(&key.key);
            if key.id.is_empty() {
                key.id = name.clone();
            }

            let id = key.id.clone();
            for previous in index.insert(key) {
                tracing::warn!(
                    id = %id,
                    replaced = %previous.id,
                    name = %previous.name,
                    "중복 API 키 정의, 이전 정의를 덮어씀"
                );
            }
        }

        Self {
            header_name: non_empty_or(&config.header_name, "X-API-Key"),
            query_param: non_empty_or(&config.query_param, "api_key"),
            index: RwLock::new(index),
        }
    }

    /// API 키를 읽을 헤더 이름.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    /// API 키를 읽을 쿼리 파라미터.
    pub fn query_param(&self) -> &str {
        &self.query_param
    }

    /// 새 API 키를 발급합니다.
    ///
    /// # Returns
    ///
    /// `(키 메타데이터, 원문 키)` - 원문 키는 이때만 확인할 수 있습니다.
    pub fn generate_api_key(
        &self,
        name: &str,
        user_id: &str,
        roles: Vec<String>,
        expires_in: Option<Duration>,
    ) -> AuthResult<(ApiKey, String)> {
        self.generate_with_rng(&mut OsRng, name, user_id, roles, expires_in)
    }

    fn generate_with_rng<R: RngCore + ?Sized>(
        &self,
        rng: &mut R,
        name: &str,
        user_id: &str,
        roles: Vec<String>,
        expires_in: Option<Duration>,
    ) -> AuthResult<(ApiKey, String)> {
        let now = Utc::now();
        let expires_at = expires_in
            .map(|d| {
                now.checked_add_signed(d).ok_or_else(|| {
                    AuthError::InvalidConfig(format!("API 키 만료 기간이 너무 깁니다: {}초", d.num_seconds()))
                })
            })
            .transpose()?;
        let raw_key = generate_raw_key(rng)?;

        let api_key = ApiKey {
            id: generate_key_id(rng),
            key: hash_key(&raw_key),
            name: name.to_string(),
            user_id: user_id.to_string(),
            roles,
            created_at: now,
            last_used_at: now,
            expires_at,
        };

        self.index.write().insert(api_key.clone());

        tracing::info!(
            id = %api_key.id,
            name = name,
            user_id = user_id,
            roles = ?api_key.roles,
            "API 키 발급"
        );

        Ok((api_key.redacted(), raw_key))
    }

    /// 원문 API 키를 검증하고 키 정보를 반환합니다. 성공 시 마지막 사용 시각을 갱신합니다.
    pub fn validate_api_key(&self, raw_key: &str) -> AuthResult<ApiKey> {
        let hashed = hash_key(raw_key);
        let now = Utc::now();

        let guard = self.index.upgradable_read();
        let Some(api_key) = guard.by_hash.get(&hashed) else {
            tracing::debug!("API 키를 찾을 수 없음");
            return Err(AuthError::ApiKeyNotFound);
        };

        if api_key.is_expired_at(now) {
            tracing::debug!(id = %api_key.id, expired_at = ?api_key.expires_at, "API 키 만료");
            return Err(AuthError::ApiKeyExpired);
        }

        let mut guard = RwLockUpgradableReadGuard::upgrade(guard);
        let api_key = guard
            .by_hash
            .get_mut(&hashed)
            .ok_or(AuthError::ApiKeyNotFound)?;
        api_key.last_used_at = now;
        Ok(api_key.redacted())
    }

    /// API 키를 폐기합니다.
    pub fn revoke_api_key(&self, key_id: &str) -> AuthResult<()> {
        let mut guard = self.index.write();
        let hash = guard.by_id.remove(key_id).ok_or(AuthError::ApiKeyNotFound)?;
        let removed = guard.by_hash.remove(&hash);

        tracing::info!(
            id = key_id,
            name = removed.as_ref().map(|k| k.name.as_str()).unwrap_or_default(),
            "API 키 폐기"
        );
        Ok(())
    }

    /// ID로 API 키를 조회합니다.
    pub fn get_api_key(&self, key_id: &str) -> AuthResult<ApiKey> {
        self.index
            .read()
            .get_by_id(key_id)
            .map(ApiKey::redacted)
            .ok_or(AuthError::ApiKeyNotFound)
    }

    /// 사용자의 API 키 목록을 생성 시각 순으로 반환합니다.
    pub fn list_api_keys(&self, user_id: &str) -> Vec<ApiKey> {
        let mut keys: Vec<ApiKey> = self
            .index
            .read()
            .by_hash
            .values()
            .filter(|k| k.user_id == user_id)
            .map(ApiKey::redacted)
            .collect();
        keys.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        keys
    }

    /// 요청 헤더/쿼리에서 API 키를 추출합니다.
    ///
    /// 헤더(설정된 이름, 소문자 이름 순)를 먼저 확인하고 없으면 쿼리 파라미터를 봅니다.
    pub fn extract_api_key(
        &self,
        headers: &HashMap<String, String>,
        query: &HashMap<String, String>,
    ) -> Option<String> {
        let from_header = headers
            .get(&self.header_name)
            .filter(|v| !v.is_empty())
            .or_else(|| {
                headers
                    .get(&self.header_name.to_lowercase())
                    .filter(|v| !v.is_empty())
            });

        from_header
            .or_else(|| query.get(&self.query_param).filter(|v| !v.is_empty()))
            .cloned()
    }
}

/// 원문 키의 SHA-256 해시 (hex).
fn hash_key(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}

fn generate_raw_key<R: RngCore + ?Sized>(rng: &mut R) -> AuthResult<String> {
    let mut bytes = [0u8; RAW_KEY_SIZE];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Randomness(e.to_string()))?;
    Ok(format!("apm_{}", hex::encode(bytes)))
}

fn generate_key_id<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; KEY_ID_SIZE];
    match rng.try_fill_bytes(&mut bytes) {
        Ok(()) => format!("key_{}", hex::encode(bytes)),
        Err(_) => format!(
            "key_{}",
            Utc::now()
                .timestamp_nanos_opt()
                .unwrap_or_else(|| Utc::now().timestamp_micros())
        ),
    }
}

fn non_empty_or(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}
