//! 인증 endpoint.
//!
//! # 라우트 구조 (`/api/auth` 아래)
//!
//! | 경로 | 게이트 |
//! |------|--------|
//! | `POST /register`, `POST /login`, `POST /forgot-password` | 시도 제한 |
//! | `POST /refresh-token`, `GET /health` | 없음 |
//! | `POST /logout`, `GET/PUT /profile`, `DELETE /account`, `GET /verify` | 인증 필수 |
//! | `GET /session` | 선택 인증 |
//! | `GET /users/{user_id}` | 인증 필수 + 소유권 |
//! | `PUT /users/{user_id}/role` | 인증 필수 + `admin` 역할 |

pub mod types;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post, put, MethodRouter},
    Json, Router,
};
use tracing::info;

use authgate_core::Role;

use crate::auth::{CurrentIdentity, OptionalIdentity};
use crate::error::ApiResult;
use crate::middleware::{
    gate_middleware, AuthenticateStage, Gate, OwnershipStage, RateLimitStage, RateLimiter,
    RoleStage,
};
use crate::routes::health::health_check;
use crate::state::AppState;

pub use types::*;

/// 가입.
///
/// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let identity = state
        .sessions
        .register(
            &normalize_email(&request.email),
            &request.password,
            request.display_name,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(
            "User registered successfully",
            UserData::from(identity),
        )),
    ))
}

/// 로그인.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let tokens = state
        .sessions
        .login(&normalize_email(&request.email), &request.password)
        .await?;

    Ok(Json(ApiResponse::with_data("Login successful", tokens)))
}

/// 로그아웃.
///
/// POST /api/auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> ApiResult<impl IntoResponse> {
    state.sessions.logout(&identity.subject_id).await?;
    Ok(Json(ApiResponse::message("Logout successful")))
}

/// 비밀번호 재설정 요청.
///
/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    state
        .sessions
        .request_password_reset(&normalize_email(&request.email))
        .await?;
    Ok(Json(ApiResponse::message("Password reset email sent")))
}

/// 토큰 갱신.
///
/// POST /api/auth/refresh-token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<impl IntoResponse> {
    let tokens = state.sessions.refresh(&request.refresh_token).await?;
    Ok(Json(ApiResponse::with_data("Token refreshed successfully", tokens)))
}

/// 내 프로필 조회.
///
/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> ApiResult<impl IntoResponse> {
    let profile = state.sessions.get_profile(&identity.subject_id).await?;
    Ok(Json(ApiResponse::with_data(
        "Profile retrieved successfully",
        UserData::from(profile),
    )))
}

/// 내 프로필 수정.
///
/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .sessions
        .update_profile(&identity.subject_id, request.into())
        .await?;
    Ok(Json(ApiResponse::with_data(
        "Profile updated successfully",
        UserData::from(profile),
    )))
}

/// 계정 삭제.
///
/// DELETE /api/auth/account
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(identity): CurrentIdentity,
) -> ApiResult<impl IntoResponse> {
    state.sessions.delete_account(&identity.subject_id).await?;
    Ok(Json(ApiResponse::message("Account deleted successfully")))
}

/// 토큰 검증.
///
/// GET /api/auth/verify
pub async fn verify(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
    Json(ApiResponse::with_data("Token is valid", UserData::from(identity)))
}

/// 세션 조회 (선택 인증).
///
/// GET /api/auth/session
pub async fn session(OptionalIdentity(identity): OptionalIdentity) -> impl IntoResponse {
    let status = SessionStatus {
        authenticated: identity.is_some(),
        user: identity.map(UserResponse::from),
    };
    Json(ApiResponse::with_data("Session status", status))
}

/// 사용자 조회 (본인 또는 관리자).
///
/// GET /api/auth/users/{user_id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let profile = state.sessions.get_profile(&user_id).await?;
    Ok(Json(ApiResponse::with_data(
        "User retrieved successfully",
        UserData::from(profile),
    )))
}

/// 역할 변경 (관리자).
///
/// PUT /api/auth/users/{user_id}/role
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    CurrentIdentity(admin): CurrentIdentity,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    let updated = state.sessions.set_role(&user_id, request.role.clone()).await?;

    info!(
        admin_id = %admin.subject_id,
        subject_id = %user_id,
        role = %request.role,
        "Role changed by administrator"
    );

    Ok(Json(ApiResponse::with_data(
        "Role updated successfully",
        UserData::from(updated),
    )))
}

/// 게이트를 라우트에 적용.
fn gated(route: MethodRouter<Arc<AppState>>, gate: Gate) -> MethodRouter<Arc<AppState>> {
    route.route_layer(from_fn_with_state(Arc::new(gate), gate_middleware))
}

/// 인증 라우터 생성.
pub fn auth_router(state: &AppState) -> Router<Arc<AppState>> {
    let sessions = state.sessions.clone();

    let attempt_gate = |limiter: &RateLimiter| {
        if state.rate_limit_enabled {
            Gate::new().stage(RateLimitStage::new(
                limiter.clone(),
                state.trust_proxy_headers,
            ))
        } else {
            Gate::new()
        }
    };
    let authenticated = || Gate::new().stage(AuthenticateStage::mandatory(sessions.clone()));

    Router::new()
        .route(
            "/register",
            gated(post(register), attempt_gate(&state.limiters.register)),
        )
        .route("/login", gated(post(login), attempt_gate(&state.limiters.login)))
        .route(
            "/forgot-password",
            gated(
                post(forgot_password),
                attempt_gate(&state.limiters.forgot_password),
            ),
        )
        .route("/refresh-token", post(refresh_token))
        .route("/logout", gated(post(logout), authenticated()))
        .route(
            "/profile",
            gated(get(get_profile).put(update_profile), authenticated()),
        )
        .route("/account", gated(delete(delete_account), authenticated()))
        .route("/verify", gated(get(verify), authenticated()))
        .route(
            "/session",
            gated(
                get(session),
                Gate::new().stage(AuthenticateStage::optional(sessions.clone())),
            ),
        )
        .route(
            "/users/{user_id}",
            gated(
                get(get_user),
                authenticated().stage(OwnershipStage::new("user_id")),
            ),
        )
        .route(
            "/users/{user_id}/role",
            gated(
                put(update_role),
                authenticated().stage(RoleStage::require(Role::Admin)),
            ),
        )
        .route("/health", get(health_check))
}

