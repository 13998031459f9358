//! 세션 관리.
//!
//! Identity Provider와 Refresh Token 코덱을 조합하여 가입, 로그인, 토큰 갱신,
//! 로그아웃, Access Token 검증을 수행합니다.
//!
//! 세션 상태는 `미인증 → 인증됨(토큰 쌍 발급) → 갱신됨(새 쌍 발급) → 폐기됨(로그아웃)`
//! 순으로 진행하지만 게이트웨이는 이 상태를 저장하지 않습니다. Access Token의
//! 유효성은 Provider가, Refresh Token의 유효성은 서명/만료/용도가 결정합니다.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use authgate_core::{
    Claims, Identity, IdentityProvider, NewUser, ProfileUpdate, ProviderError, Role, SharedClock,
    TokenPair,
};

use super::jwt::{RefreshTokenCodec, TokenError};
use crate::metrics::record_session_event;

/// 세션 관리 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Provider가 가입을 거부함
    #[error("Registration failed: {0}")]
    RegistrationFailed(ProviderError),

    /// 알 수 없는 이메일 또는 Provider 오류
    #[error("Login failed: {0}")]
    LoginFailed(ProviderError),

    /// 토큰 폐기 실패
    #[error("Logout failed: {0}")]
    LogoutFailed(ProviderError),

    /// Access Token 검증 실패 (형식 오류, 만료, 폐기, 사용자 없음)
    #[error("Invalid or expired token")]
    TokenInvalid,

    /// Refresh Token 검증/발급 실패
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Refresh Token의 사용자가 더 이상 존재하지 않음
    #[error("Token subject no longer exists")]
    SubjectNotFound,

    /// 비밀번호 재설정 링크 생성 실패
    #[error("Password reset failed: {0}")]
    PasswordResetFailed(ProviderError),

    /// 기타 Provider 오류
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl SessionError {
    /// Provider 장애로 인한 실패인지 확인합니다.
    pub fn is_provider_unavailable(&self) -> bool {
        matches!(
            self,
            SessionError::RegistrationFailed(ProviderError::Unavailable(_))
                | SessionError::LoginFailed(ProviderError::Unavailable(_))
                | SessionError::LogoutFailed(ProviderError::Unavailable(_))
                | SessionError::PasswordResetFailed(ProviderError::Unavailable(_))
                | SessionError::Provider(ProviderError::Unavailable(_))
        )
    }
}

/// 세션 작업 Result 타입.
pub type SessionResult<T> = Result<T, SessionError>;

/// 세션 관리자.
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    codec: RefreshTokenCodec,
    clock: SharedClock,
    password_reset_url: String,
}

impl SessionManager {
    /// 새 세션 관리자 생성.
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        codec: RefreshTokenCodec,
        clock: SharedClock,
        password_reset_url: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            codec,
            clock,
            password_reset_url: password_reset_url.into(),
        }
    }

    /// 연결된 Provider 이름.
    pub fn provider_name(&self) -> &str {
        self.provider.provider_name()
    }

    /// 사용자 가입.
    ///
    /// Provider에 사용자를 만든 뒤 기본 역할 `user`와 생성 시각을 클레임으로 설정합니다.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<String>,
    ) -> SessionResult<Identity> {
        let record = self
            .provider
            .create_user(NewUser {
                email: email.to_string(),
                password: password.to_string(),
                display_name,
                email_verified: false,
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "Registration rejected by identity provider");
                SessionError::RegistrationFailed(e)
            })?;

        let claims = Claims::with_role(Role::User)
            .insert("createdAt", Value::String(self.clock.now().to_rfc3339()));

        self.provider
            .set_custom_claims(&record.uid, claims.to_map())
            .await
            .map_err(|e| {
                warn!(subject_id = %record.uid, error = %e, "Failed to set default role claim");
                SessionError::RegistrationFailed(e)
            })?;

        info!(subject_id = %record.uid, "User registered");
        record_session_event("register");

        Ok(Identity::from_record(record, claims))
    }

    /// 로그인.
    ///
    /// 비밀번호 대조는 Identity Provider에 위임되어 있으며, 이 메서드는 비밀번호를
    /// 해싱하거나 비교하지 않습니다. 호출 시점에 자격 증명은 Provider의 로그인
    /// 흐름(또는 입력 검증)을 이미 통과한 것으로 간주합니다.
    pub async fn login(&self, email: &str, _password: &str) -> SessionResult<TokenPair> {
        let record = self
            .provider
            .get_user_by_email(email)
            .await
            .map_err(SessionError::LoginFailed)?;

        let access_token = self
            .provider
            .create_custom_token(&record.uid)
            .await
            .map_err(SessionError::LoginFailed)?;
        let refresh_token = self.codec.issue_refresh_token(&record.uid)?;

        info!(subject_id = %record.uid, "User logged in");
        record_session_event("login");

        Ok(TokenPair::bearer(
            access_token,
            refresh_token,
            self.provider.access_token_ttl_secs(),
        ))
    }

    /// 토큰 갱신.
    ///
    /// 이전 Refresh Token은 추적하지 않으므로 만료 전까지 계속 유효합니다.
    pub async fn refresh(&self, refresh_token: &str) -> SessionResult<TokenPair> {
        let claims = self.codec.verify_refresh_token(refresh_token).map_err(|e| {
            warn!(error = %e, "Refresh token rejected");
            SessionError::Token(e)
        })?;

        let record = self.provider.get_user(&claims.sub).await.map_err(|e| match e {
            ProviderError::UserNotFound => {
                warn!(subject_id = %claims.sub, "Refresh token subject no longer exists");
                SessionError::SubjectNotFound
            }
            other => SessionError::Provider(other),
        })?;

        let access_token = self.provider.create_custom_token(&record.uid).await?;
        let refresh_token = self.codec.issue_refresh_token(&record.uid)?;

        debug!(subject_id = %record.uid, "Token pair refreshed");
        record_session_event("refresh");

        Ok(TokenPair::bearer(
            access_token,
            refresh_token,
            self.provider.access_token_ttl_secs(),
        ))
    }

    /// 로그아웃.
    ///
    /// Provider에서 사용자의 현재 Access Token을 모두 폐기합니다.
    /// 게이트웨이가 발급한 Refresh Token은 별도로 폐기되지 않습니다.
    pub async fn logout(&self, subject_id: &str) -> SessionResult<()> {
        self.provider
            .revoke_refresh_tokens(subject_id)
            .await
            .map_err(SessionError::LogoutFailed)?;

        info!(subject_id = %subject_id, "User logged out");
        record_session_event("logout");
        Ok(())
    }

    /// Access Token 검증.
    ///
    /// Provider 검증 후 최신 프로필을 다시 조회해 신원을 구성합니다.
    /// Provider 장애는 토큰 실패와 구분하여 `Provider` 에러로 반환합니다.
    pub async fn verify(&self, access_token: &str) -> SessionResult<Identity> {
        let decoded = self
            .provider
            .verify_id_token(access_token)
            .await
            .map_err(|e| match e {
                ProviderError::Unavailable(_) => SessionError::Provider(e),
                other => {
                    debug!(error = %other, "Access token verification failed");
                    SessionError::TokenInvalid
                }
            })?;

        let record = self
            .provider
            .get_user(&decoded.uid)
            .await
            .map_err(|e| match e {
                ProviderError::Unavailable(_) => SessionError::Provider(e),
                other => {
                    debug!(subject_id = %decoded.uid, error = %other, "Token subject lookup failed");
                    SessionError::TokenInvalid
                }
            })?;

        Ok(Identity::from_record(record, Claims::from_map(decoded.claims)))
    }

    /// 프로필 조회.
    pub async fn get_profile(&self, subject_id: &str) -> SessionResult<Identity> {
        let record = self.provider.get_user(subject_id).await?;
        Ok(Identity::from_stored_record(record))
    }

    /// 프로필 부분 업데이트.
    pub async fn update_profile(
        &self,
        subject_id: &str,
        update: ProfileUpdate,
    ) -> SessionResult<Identity> {
        let update = update.into_user_update();
        if update.is_empty() {
            return self.get_profile(subject_id).await;
        }

        let record = self.provider.update_user(subject_id, update).await?;
        debug!(subject_id = %subject_id, "Profile updated");
        Ok(Identity::from_stored_record(record))
    }

    /// 계정 삭제.
    pub async fn delete_account(&self, subject_id: &str) -> SessionResult<()> {
        self.provider.delete_user(subject_id).await?;
        info!(subject_id = %subject_id, "Account deleted");
        record_session_event("delete_account");
        Ok(())
    }

    /// 비밀번호 재설정 요청.
    ///
    /// 메일 발송은 다루지 않으므로 생성된 링크는 debug 로그로만 남기고 반환합니다.
    pub async fn request_password_reset(&self, email: &str) -> SessionResult<String> {
        let link = self
            .provider
            .generate_password_reset_link(email, &self.password_reset_url)
            .await
            .map_err(|e| {
                warn!(error = %e, "Password reset request rejected");
                SessionError::PasswordResetFailed(e)
            })?;

        debug!(reset_link = %link, "Password reset link generated");
        record_session_event("password_reset");
        Ok(link)
    }

    /// 사용자 역할 변경.
    ///
    /// 기존 토큰에는 반영되지 않으며, 다음 로그인/갱신부터 적용됩니다.
    pub async fn set_role(&self, subject_id: &str, role: Role) -> SessionResult<Identity> {
        let record = self.provider.get_user(subject_id).await?;

        let mut claims = Claims::from_map(record.custom_claims.clone());
        claims.role = Some(role.clone());
        self.provider
            .set_custom_claims(subject_id, claims.to_map())
            .await?;

        info!(subject_id = %subject_id, role = %role, "Role updated");
        Ok(Identity::from_record(record, claims))
    }
}
