//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크
//! - `/metrics` - Prometheus 메트릭
//! - `/api/auth` - 가입, 로그인, 토큰 갱신, 프로필, 역할 관리

pub mod auth;
pub mod health;

pub use auth::{auth_router, ApiResponse, SessionStatus, UserData, UserResponse};
pub use health::{health_router, HealthResponse};

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use authgate_core::ServerConfig;

use crate::middleware::metrics_layer;
use crate::state::AppState;

/// /metrics 엔드포인트 핸들러.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// 전체 API 라우터 생성 (상태 미적용).
pub fn create_api_router(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .route("/metrics", get(metrics_handler))
        .nest("/api/auth", auth_router(state))
}

/// CORS 레이어 생성.
///
/// 허용 origin이 비어 있으면 모든 origin을 허용합니다 (개발 모드).
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let (allow_origin, restricted) = if parsed.is_empty() {
        if !origins.is_empty() {
            warn!("CORS origins are configured but none are valid, allowing any");
        } else {
            warn!("CORS origins not set, allowing any origin (development mode)");
        }
        (AllowOrigin::any(), false)
    } else {
        info!("CORS configured with {} allowed origins", parsed.len());
        (AllowOrigin::list(parsed), true)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(restricted)
        .max_age(Duration::from_secs(3600))
}

/// 전체 애플리케이션 라우터 생성.
///
/// 메트릭, 트레이싱, 타임아웃(408), CORS 레이어를 포함합니다.
pub fn create_router(state: Arc<AppState>, server: &ServerConfig) -> Router {
    create_api_router(&state)
        .with_state(state)
        .layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(server.request_timeout_secs),
        ))
        .layer(cors_layer(&server.cors_origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::{AppConfig, ManualClock};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::state::create_test_state;

    fn app() -> Router {
        let clock = ManualClock::starting_now();
        let config = AppConfig::default();
        let (state, _) = create_test_state(&clock, &config);
        create_router(Arc::new(state), &config.server)
    }

    #[tokio::test]
    async fn test_health_is_mounted_twice() {
        for uri in ["/health", "/api/auth/health"] {
            let response = app()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = app()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app()
            .oneshot(Request::builder().uri("/api/auth/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
