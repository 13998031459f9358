//! 인증 게이트웨이 REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Refresh Token 코덱과 세션 관리
//! - 역할/소유권 기반 인가
//! - 클라이언트별 인증 시도 제한
//! - 위 요소를 조합하는 요청 게이트
//! - Axum 기반 REST API 및 Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: 토큰 코덱, 세션 관리, 인가 판정
//! - [`middleware`]: 요청 게이트, 시도 제한, HTTP 메트릭
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`error`]: API 에러 분류 및 응답 형식

pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{CurrentIdentity, OptionalIdentity, RefreshTokenCodec, SessionError, SessionManager};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::{metrics_layer, Gate, GateOutcome, GateStage, RateLimiter};
pub use routes::{create_api_router, create_router};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
