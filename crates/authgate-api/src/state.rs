//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Arc로 래핑된 필드만 가지므로 복제 비용이 작고,
//! Axum의 State extractor를 통해 핸들러와 게이트에 주입됩니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::SecretString;

use authgate_core::{AppConfig, IdentityProvider, RateLimitSettings, SharedClock};

use crate::auth::{RefreshTokenCodec, SessionManager};
use crate::middleware::{RateLimitConfig, RateLimiter};

/// 시도 민감 경로별 제한기.
///
/// 개별 설정이 없는 경로는 하나의 기본 제한기를 공유하므로, 한 클라이언트의
/// 가입/로그인/재설정 시도가 같은 창에서 함께 집계됩니다.
#[derive(Clone)]
pub struct AttemptLimiters {
    pub register: RateLimiter,
    pub login: RateLimiter,
    pub forgot_password: RateLimiter,
}

impl AttemptLimiters {
    /// 설정에서 제한기 구성.
    pub fn from_settings(settings: &RateLimitSettings, clock: &SharedClock) -> Self {
        let shared = RateLimiter::new(settings.default_limit().into(), clock.clone());
        let for_route = |route: &str| match settings.route_override(route) {
            Some(limit) => RateLimiter::new(RateLimitConfig::from(limit), clock.clone()),
            None => shared.clone(),
        };

        Self {
            register: for_route("register"),
            login: for_route("login"),
            forgot_password: for_route("forgot_password"),
        }
    }
}

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 세션 관리자 - 가입/로그인/갱신/로그아웃/토큰 검증
    pub sessions: Arc<SessionManager>,

    /// 시도 제한기
    pub limiters: AttemptLimiters,

    /// 시도 제한 사용 여부
    pub rate_limit_enabled: bool,

    /// 프록시 헤더(X-Forwarded-For, X-Real-IP) 신뢰 여부
    pub trust_proxy_headers: bool,

    /// 시계
    pub clock: SharedClock,

    /// Prometheus 핸들 (설치된 경우)
    pub metrics: Option<PrometheusHandle>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// # 인자
    /// * `provider` - Identity Provider 어댑터
    /// * `refresh_secret` - Refresh Token 서명 키
    /// * `config` - 애플리케이션 설정
    /// * `clock` - 토큰/시도 제한에 쓰는 시계
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        refresh_secret: SecretString,
        config: &AppConfig,
        clock: SharedClock,
    ) -> Self {
        let codec = RefreshTokenCodec::new(
            refresh_secret,
            config.auth.refresh_token_ttl_days,
            clock.clone(),
        );
        let sessions = SessionManager::new(
            provider,
            codec,
            clock.clone(),
            config.auth.password_reset_url.clone(),
        );

        Self {
            sessions: Arc::new(sessions),
            limiters: AttemptLimiters::from_settings(&config.rate_limit, &clock),
            rate_limit_enabled: config.rate_limit.enabled,
            trust_proxy_headers: config.rate_limit.trust_proxy_headers,
            started_at: clock.now(),
            clock,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Prometheus 핸들 설정.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (self.clock.now() - self.started_at).num_seconds().max(0)
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 인메모리 Provider와 주어진 시계로 상태를 구성합니다. Provider 핸들도 함께
/// 반환하므로 테스트에서 사용자 수나 토큰 상태를 직접 확인할 수 있습니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state(
    clock: &authgate_core::ManualClock,
    config: &AppConfig,
) -> (AppState, Arc<authgate_core::MemoryIdentityProvider>) {
    let provider = Arc::new(authgate_core::MemoryIdentityProvider::new(
        clock.shared(),
        config.provider.access_token_ttl_secs,
    ));
    let state = AppState::new(
        provider.clone(),
        SecretString::from("test-refresh-secret".to_string()),
        config,
        clock.shared(),
    );
    (state, provider)
}
