//! Identity Provider 어댑터 추상화.
//!
//! 호스팅된 Identity Provider(사용자 저장소, 토큰 발급/검증)와의 경계를
//! Provider 중립적인 인터페이스로 정의합니다. 게이트웨이는 비밀번호를 직접
//! 저장하거나 검증하지 않으며, 사용자 레코드의 원본은 항상 Provider입니다.

mod memory;

pub use memory::MemoryIdentityProvider;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ClaimMap;

// =============================================================================
// 에러 타입
// =============================================================================

/// IdentityProvider 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// 사용자를 찾을 수 없음
    #[error("user not found")]
    UserNotFound,

    /// 이미 등록된 이메일
    #[error("email address is already in use")]
    EmailAlreadyExists,

    /// 잘못된 인자 (비밀번호 형식 등)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// 만료된 토큰
    #[error("token has expired")]
    TokenExpired,

    /// 폐기된 토큰
    #[error("token has been revoked")]
    TokenRevoked,

    /// 잘못된 토큰
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Provider 연결/내부 오류
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Provider 작업 Result 타입.
pub type ProviderResult<T> = Result<T, ProviderError>;

// =============================================================================
// 레코드 타입
// =============================================================================

/// Provider에 저장된 사용자 레코드.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    /// 커스텀 클레임 (role 포함)
    pub custom_claims: ClaimMap,
    pub created_at: DateTime<Utc>,
}

/// 사용자 생성 요청.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Provider로 그대로 전달되며 게이트웨이에는 남지 않습니다.
    pub password: String,
    pub display_name: Option<String>,
    pub email_verified: bool,
}

/// 사용자 업데이트. `None` 필드는 변경하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

impl UserUpdate {
    /// 변경할 필드가 없는지 확인.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.display_name.is_none() && self.photo_url.is_none()
    }
}

/// 검증된 Access Token 내용.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedToken {
    pub uid: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// 토큰에 포함된 클레임
    pub claims: ClaimMap,
}

// =============================================================================
// IdentityProvider Trait
// =============================================================================

/// Identity Provider 어댑터 trait.
///
/// 사용자 CRUD, 커스텀 토큰 발급, ID 토큰 검증, 토큰 폐기를 제공합니다.
/// Provider별로 이 trait을 구현하면 세션 관리 로직은 그대로 재사용됩니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct HostedProvider {
///     client: Arc<AdminClient>,
/// }
///
/// #[async_trait]
/// impl IdentityProvider for HostedProvider {
///     async fn get_user(&self, uid: &str) -> ProviderResult<UserRecord> {
///         // Admin API 호출 및 변환
///     }
///
///     // ... 나머지 메서드 구현
/// }
/// ```
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// 사용자 생성.
    ///
    /// # Errors
    ///
    /// - `ProviderError::EmailAlreadyExists`: 중복 이메일
    /// - `ProviderError::InvalidArgument`: Provider가 거부한 입력
    async fn create_user(&self, user: NewUser) -> ProviderResult<UserRecord>;

    /// ID로 사용자 조회.
    async fn get_user(&self, uid: &str) -> ProviderResult<UserRecord>;

    /// 이메일로 사용자 조회.
    async fn get_user_by_email(&self, email: &str) -> ProviderResult<UserRecord>;

    /// 사용자 정보 업데이트.
    async fn update_user(&self, uid: &str, update: UserUpdate) -> ProviderResult<UserRecord>;

    /// 사용자 삭제.
    async fn delete_user(&self, uid: &str) -> ProviderResult<()>;

    /// 커스텀 클레임 전체 교체.
    async fn set_custom_claims(&self, uid: &str, claims: ClaimMap) -> ProviderResult<()>;

    /// 사용자용 Access Token 발급.
    async fn create_custom_token(&self, uid: &str) -> ProviderResult<String>;

    /// Access Token 검증.
    ///
    /// # Errors
    ///
    /// - `ProviderError::TokenExpired`: 만료된 토큰
    /// - `ProviderError::TokenRevoked`: 폐기된 토큰
    /// - `ProviderError::InvalidToken`: 형식 오류 또는 알 수 없는 토큰
    async fn verify_id_token(&self, token: &str) -> ProviderResult<DecodedToken>;

    /// 사용자의 현재 발급된 토큰을 모두 폐기.
    async fn revoke_refresh_tokens(&self, uid: &str) -> ProviderResult<()>;

    /// 비밀번호 재설정 링크 생성.
    async fn generate_password_reset_link(
        &self,
        email: &str,
        continue_url: &str,
    ) -> ProviderResult<String>;

    /// Access Token 수명 (초).
    fn access_token_ttl_secs(&self) -> i64 {
        3600
    }

    /// Provider 이름 (로깅용).
    fn provider_name(&self) -> &str;
}
