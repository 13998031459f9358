//! 인메모리 Identity Provider.
//!
//! 외부 Provider 없이 개발 서버와 테스트를 구동하기 위한 구현입니다.
//! 발급한 Access Token은 불투명한 랜덤 문자열이며, 만료와 사용자별 폐기를
//! 주입된 시계 기준으로 판정합니다. 프로세스 재시작 시 모든 상태가 사라집니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DecodedToken, IdentityProvider, NewUser, ProviderError, ProviderResult, UserRecord, UserUpdate};
use crate::clock::SharedClock;
use crate::domain::ClaimMap;

/// Provider가 허용하는 최소 비밀번호 길이.
const MIN_PASSWORD_LEN: usize = 6;

/// 발급된 토큰 정보.
#[derive(Debug, Clone)]
struct IssuedToken {
    uid: String,
    /// 발급 순번 (폐기 판정용)
    serial: u64,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    claims: ClaimMap,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<String, UserRecord>,
    /// 정규화된 이메일 → uid
    emails: HashMap<String, String>,
    tokens: HashMap<String, IssuedToken>,
    /// uid → 이 순번 이하로 발급된 토큰은 폐기됨
    revoked_through: HashMap<String, u64>,
    next_serial: u64,
}

/// 인메모리 Identity Provider.
pub struct MemoryIdentityProvider {
    state: RwLock<MemoryState>,
    clock: SharedClock,
    token_ttl: Duration,
}

impl MemoryIdentityProvider {
    /// 주어진 시계와 토큰 수명으로 생성.
    pub fn new(clock: SharedClock, token_ttl_secs: i64) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            clock,
            token_ttl: Duration::seconds(token_ttl_secs),
        }
    }

    /// 등록된 사용자 수.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.users.len()
    }

    /// 유효한 토큰 수 (만료 전, 폐기 포함).
    pub async fn live_token_count(&self) -> usize {
        let now = self.clock.now();
        self.state
            .read()
            .await
            .tokens
            .values()
            .filter(|t| t.expires_at > now)
            .count()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn create_user(&self, user: NewUser) -> ProviderResult<UserRecord> {
        let email = normalize_email(&user.email);
        if email.is_empty() || !email.contains('@') {
            return Err(ProviderError::InvalidArgument("malformed email address".to_string()));
        }
        if user.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::InvalidArgument(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let mut state = self.state.write().await;
        if state.emails.contains_key(&email) {
            return Err(ProviderError::EmailAlreadyExists);
        }

        let record = UserRecord {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.clone(),
            email_verified: user.email_verified,
            display_name: user.display_name,
            photo_url: None,
            custom_claims: ClaimMap::new(),
            created_at: self.clock.now(),
        };

        state.emails.insert(email, record.uid.clone());
        state.users.insert(record.uid.clone(), record.clone());

        Ok(record)
    }

    async fn get_user(&self, uid: &str) -> ProviderResult<UserRecord> {
        self.state
            .read()
            .await
            .users
            .get(uid)
            .cloned()
            .ok_or(ProviderError::UserNotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> ProviderResult<UserRecord> {
        let state = self.state.read().await;
        state
            .emails
            .get(&normalize_email(email))
            .and_then(|uid| state.users.get(uid))
            .cloned()
            .ok_or(ProviderError::UserNotFound)
    }

    async fn update_user(&self, uid: &str, update: UserUpdate) -> ProviderResult<UserRecord> {
        let mut state = self.state.write().await;
        let current_email = state
            .users
            .get(uid)
            .map(|u| u.email.clone())
            .ok_or(ProviderError::UserNotFound)?;

        if let Some(email) = update.email.as_deref().map(normalize_email) {
            if email != current_email {
                if state.emails.contains_key(&email) {
                    return Err(ProviderError::EmailAlreadyExists);
                }
                state.emails.remove(&current_email);
                state.emails.insert(email, uid.to_string());
            }
        }

        let record = state.users.get_mut(uid).ok_or(ProviderError::UserNotFound)?;
        if let Some(email) = update.email {
            record.email = normalize_email(&email);
        }
        if let Some(display_name) = update.display_name {
            record.display_name = Some(display_name);
        }
        if let Some(photo_url) = update.photo_url {
            record.photo_url = Some(photo_url);
        }

        Ok(record.clone())
    }

    async fn delete_user(&self, uid: &str) -> ProviderResult<()> {
        let mut state = self.state.write().await;
        let record = state.users.remove(uid).ok_or(ProviderError::UserNotFound)?;
        state.emails.remove(&record.email);
        state.tokens.retain(|_, t| t.uid != uid);
        state.revoked_through.remove(uid);
        Ok(())
    }

    async fn set_custom_claims(&self, uid: &str, claims: ClaimMap) -> ProviderResult<()> {
        let mut state = self.state.write().await;
        let record = state.users.get_mut(uid).ok_or(ProviderError::UserNotFound)?;
        record.custom_claims = claims;
        Ok(())
    }

    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let claims = state
            .users
            .get(uid)
            .map(|u| u.custom_claims.clone())
            .ok_or(ProviderError::UserNotFound)?;

        state.tokens.retain(|_, t| t.expires_at > now);
        state.next_serial += 1;

        let token = format!("mem.{}", Uuid::new_v4().simple());
        let issued = IssuedToken {
            uid: uid.to_string(),
            serial: state.next_serial,
            issued_at: now,
            expires_at: now + self.token_ttl,
            claims,
        };
        state.tokens.insert(token.clone(), issued);

        Ok(token)
    }

    async fn verify_id_token(&self, token: &str) -> ProviderResult<DecodedToken> {
        let now = self.clock.now();
        let state = self.state.read().await;
        let issued = state
            .tokens
            .get(token)
            .ok_or_else(|| ProviderError::InvalidToken("unknown token".to_string()))?;

        if now >= issued.expires_at {
            return Err(ProviderError::TokenExpired);
        }
        if let Some(&revoked) = state.revoked_through.get(&issued.uid) {
            if issued.serial <= revoked {
                return Err(ProviderError::TokenRevoked);
            }
        }

        Ok(DecodedToken {
            uid: issued.uid.clone(),
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
            claims: issued.claims.clone(),
        })
    }

    async fn revoke_refresh_tokens(&self, uid: &str) -> ProviderResult<()> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(uid) {
            return Err(ProviderError::UserNotFound);
        }
        let serial = state.next_serial;
        state.revoked_through.insert(uid.to_string(), serial);
        Ok(())
    }

    async fn generate_password_reset_link(
        &self,
        email: &str,
        continue_url: &str,
    ) -> ProviderResult<String> {
        let user = self.get_user_by_email(email).await?;
        let code = Uuid::new_v4().simple();
        Ok(format!(
            "{}?mode=resetPassword&oobCode={}&uid={}",
            continue_url, code, user.uid
        ))
    }

    fn access_token_ttl_secs(&self) -> i64 {
        self.token_ttl.num_seconds()
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}
