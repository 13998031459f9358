//! 통합 API 에러 타입.
//!
//! 모든 엔드포인트와 요청 게이트는 실패를 [`ApiError`]로 분류하고,
//! 응답 본문은 항상 [`ApiErrorResponse`] 형식을 따릅니다.
//!
//! # 예시
//!
//! ```json
//! {
//!   "code": "RATE_LIMITED",
//!   "message": "Too many authentication attempts. Please try again later.",
//!   "details": { "retryAfter": 840 },
//!   "timestamp": 1738300800
//! }
//! ```

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::ValidationErrors;

use crate::auth::{SessionError, TokenError};

/// 내부 오류 시 클라이언트에 노출하는 고정 메시지.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// 시도 제한 초과 메시지.
pub const RATE_LIMITED_MESSAGE: &str = "Too many authentication attempts. Please try again later.";

/// API 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_FAILED", "AUTHENTICATION_FAILED")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp, 선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// API 에러 분류.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    /// 입력 검증 실패 (필드별 상세 포함)
    #[error("Validation failed")]
    ValidationFailed(Value),

    /// 자격 증명 또는 토큰 오류
    #[error("{0}")]
    AuthenticationFailed(String),

    /// 역할/소유권 불일치
    #[error("{0}")]
    AuthorizationDenied(String),

    /// 시도 횟수 초과
    #[error("Too many authentication attempts. Please try again later.")]
    RateLimited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },

    /// Provider가 거부한 요청
    #[error("{0}")]
    BadRequest(String),

    /// 내부 오류. 상세 내용은 서버 로그에만 남습니다.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    /// HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ValidationFailed(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
            ApiError::AuthorizationDenied(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::AuthenticationFailed(_) => "AUTHENTICATION_FAILED",
            ApiError::AuthorizationDenied(_) => "AUTHORIZATION_DENIED",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 응답 본문 생성.
    pub fn to_response_body(&self) -> ApiErrorResponse {
        match self {
            ApiError::ValidationFailed(details) => {
                ApiErrorResponse::with_details(self.code(), self.to_string(), details.clone())
            }
            ApiError::RateLimited { retry_after } => ApiErrorResponse::with_details(
                self.code(),
                RATE_LIMITED_MESSAGE,
                json!({ "retryAfter": retry_after }),
            ),
            ApiError::Internal(_) => ApiErrorResponse::new(self.code(), INTERNAL_ERROR_MESSAGE),
            _ => ApiErrorResponse::new(self.code(), self.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "Internal error");
        }

        let mut response = (self.status(), Json(self.to_response_body())).into_response();

        if let ApiError::RateLimited { retry_after } = self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after));
        }

        response
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Map::new();
        for (field, errs) in errors.field_errors() {
            let messages: Vec<Value> = errs
                .iter()
                .map(|e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    Value::String(message)
                })
                .collect();
            fields.insert(field.to_string(), Value::Array(messages));
        }
        ApiError::ValidationFailed(Value::Object(fields))
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        if err.is_provider_unavailable() {
            return ApiError::Internal(err.to_string());
        }

        match err {
            SessionError::LoginFailed(_) => {
                ApiError::AuthenticationFailed("Invalid email or password".to_string())
            }
            SessionError::TokenInvalid => {
                ApiError::AuthenticationFailed("Invalid or expired token".to_string())
            }
            SessionError::Token(TokenError::Signing(detail)) => ApiError::Internal(detail),
            SessionError::Token(_) | SessionError::SubjectNotFound => {
                ApiError::AuthenticationFailed("Invalid or expired refresh token".to_string())
            }
            other @ (SessionError::RegistrationFailed(_)
            | SessionError::LogoutFailed(_)
            | SessionError::PasswordResetFailed(_)
            | SessionError::Provider(_)) => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;
