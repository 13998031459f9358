//! 인증 API 요청/응답 타입.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::{Validate, ValidationError};

use authgate_core::{Identity, ProfileUpdate, Role, MAX_ROLE_NAME_LEN};

use crate::auth::{strong_password, LOGIN_MIN_LEN};
use crate::error::ApiError;

// ==================== 요청 타입 ====================

/// 가입 요청.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(custom(function = "strong_password"))]
    pub password: String,
    #[validate(length(min = 2, max = 50, message = "Display name must be between 2 and 50 characters"))]
    pub display_name: Option<String>,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = LOGIN_MIN_LEN, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/// 비밀번호 재설정 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

/// 토큰 갱신 요청.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// 프로필 수정 요청.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 2, max = 50, message = "Display name must be between 2 and 50 characters"))]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    #[validate(url(message = "Photo URL must be a valid URL"))]
    pub photo_url: Option<String>,
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(request: UpdateProfileRequest) -> Self {
        ProfileUpdate {
            email: request.email.map(|e| normalize_email(&e)),
            display_name: request.display_name,
            photo_url: request.photo_url,
        }
    }
}

/// 역할 변경 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[validate(custom(function = "assignable_role"))]
    pub role: Role,
}

/// 부여 가능한 역할 이름인지 검사.
fn assignable_role(role: &Role) -> Result<(), ValidationError> {
    if Role::is_valid_name(role.as_str()) {
        return Ok(());
    }
    let mut error = ValidationError::new("role_name");
    error.message = Some(
        format!(
            "Role must be 1-{} characters of lowercase letters, digits, '_' or '-'",
            MAX_ROLE_NAME_LEN
        )
        .into(),
    );
    Err(error)
}

/// 이메일 정규화 (앞뒤 공백 제거, 소문자).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ==================== 응답 타입 ====================

/// 공통 성공 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}

/// 사용자 정보.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub uid: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub email_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            role: identity.role().cloned(),
            uid: identity.subject_id,
            email: identity.email,
            display_name: identity.display_name,
            photo_url: identity.photo_url,
            email_verified: identity.email_verified,
        }
    }
}

/// `{ "user": ... }` 응답 데이터.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: UserResponse,
}

impl From<Identity> for UserData {
    fn from(identity: Identity) -> Self {
        Self {
            user: identity.into(),
        }
    }
}

/// 선택 인증 세션 조회 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

// ==================== 추출기 ====================

/// JSON 본문을 역직렬화한 뒤 `validator` 규칙을 검사하는 추출기.
///
/// 형식 오류는 `BadRequest`, 규칙 위반은 필드별 상세를 담은 `ValidationFailed`가 됩니다.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::BadRequest(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            email: "a@x.com".into(),
            password: "Passw0rd".into(),
            display_name: None,
        };
        assert!(ok.validate().is_ok());

        let bad = RegisterRequest {
            email: "nope".into(),
            password: "password".into(),
            display_name: Some("A".into()),
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("display_name"));
    }

    #[test]
    fn test_login_requires_six_chars() {
        let short = LoginRequest {
            email: "a@x.com".into(),
            password: "12345".into(),
        };
        assert!(short.validate().is_err());

        let ok = LoginRequest {
            email: "a@x.com".into(),
            password: "123456".into(),
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_profile_update_validation() {
        let bad_url = UpdateProfileRequest {
            email: None,
            display_name: None,
            photo_url: Some("not a url".into()),
        };
        assert!(bad_url.validate().is_err());

        let empty = UpdateProfileRequest {
            email: None,
            display_name: None,
            photo_url: None,
        };
        assert!(empty.validate().is_ok());
    }

    #[test]
    fn test_profile_update_normalizes_email() {
        let update: ProfileUpdate = UpdateProfileRequest {
            email: Some(" Alice@X.com ".into()),
            display_name: None,
            photo_url: None,
        }
        .into();
        assert_eq!(update.email.as_deref(), Some("alice@x.com"));
    }

    #[test]
    fn test_user_response_shape() {
        let json = serde_json::to_value(UserResponse {
            uid: "u1".into(),
            email: "a@x.com".into(),
            display_name: Some("Alice".into()),
            photo_url: None,
            email_verified: false,
            role: Some(Role::User),
        })
        .unwrap();

        assert_eq!(json["uid"], "u1");
        assert_eq!(json["displayName"], "Alice");
        assert_eq!(json["emailVerified"], false);
        assert_eq!(json["role"], "user");
        assert!(json.get("photoURL").is_none());
    }

    #[test]
    fn test_role_request_validation() {
        let ok: UpdateRoleRequest = serde_json::from_str(r#"{"role":"admin"}"#).unwrap();
        assert_eq!(ok.role, Role::Admin);
        assert!(ok.validate().is_ok());

        let custom: UpdateRoleRequest = serde_json::from_str(r#"{"role":"editor"}"#).unwrap();
        assert_eq!(custom.role, Role::Custom("editor".into()));
        assert!(custom.validate().is_ok());

        let shouting: UpdateRoleRequest = serde_json::from_str(r#"{"role":"Super User!"}"#).unwrap();
        let errors = shouting.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("role"));

        assert!(serde_json::from_str::<UpdateRoleRequest>(r#"{"role":""}"#).is_err());
        assert!(serde_json::from_str::<UpdateRoleRequest>(r#"{"role":7}"#).is_err());
    }
}
