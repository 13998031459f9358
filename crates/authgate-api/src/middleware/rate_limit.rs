//! 인증 시도 제한.
//!
//! 클라이언트별 고정 창(window) 카운터로 가입/로그인/비밀번호 재설정 같은
//! 시도 민감 경로를 보호합니다.
//!
//! - 매 확인마다 만료된 기록을 전체 맵에서 먼저 제거합니다 (O(n)).
//! - 거부된 요청은 카운터를 더 올리지 않습니다.
//! - 창은 `window_reset_at`에 정확히 초기화되며, 그 다음 확인은 새 창을 시작합니다.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use metrics::counter;
use tokio::sync::RwLock;

use authgate_core::{AttemptLimit, SharedClock};

/// 클라이언트 주소를 알 수 없을 때 쓰는 키.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// 시도 제한 설정.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// 창 내 최대 시도 수
    pub max_attempts: u32,
    /// 창 길이
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::minutes(15),
        }
    }
}

impl From<AttemptLimit> for RateLimitConfig {
    fn from(limit: AttemptLimit) -> Self {
        Self {
            max_attempts: limit.max_attempts,
            window: Duration::seconds(limit.window_secs as i64),
        }
    }
}

/// 클라이언트별 시도 기록.
#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    count: u32,
    window_reset_at: DateTime<Utc>,
}

/// 시도 제한 확인 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitResult {
    /// 요청 허용됨
    Allowed,
    /// 제한 초과
    Limited {
        /// 재시도까지 대기 시간 (초)
        retry_after: u64,
    },
}

/// 클라이언트별 시도 제한기.
///
/// 복제본은 같은 기록 맵을 공유합니다.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    records: Arc<RwLock<HashMap<String, AttemptRecord>>>,
    clock: SharedClock,
}

impl RateLimiter {
    /// 새 제한기 생성.
    pub fn new(config: RateLimitConfig, clock: SharedClock) -> Self {
        Self {
            config,
            records: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// 설정 반환.
    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// 시도 허용 여부 확인.
    pub async fn check(&self, client_key: &str) -> RateLimitResult {
        let now = self.clock.now();
        let mut records = self.records.write().await;

        records.retain(|_, record| now < record.window_reset_at);

        let result = match records.get_mut(client_key) {
            None => {
                records.insert(
                    client_key.to_string(),
                    AttemptRecord {
                        count: 1,
                        window_reset_at: now + self.config.window,
                    },
                );
                RateLimitResult::Allowed
            }
            Some(record) if record.count < self.config.max_attempts => {
                record.count += 1;
                RateLimitResult::Allowed
            }
            Some(record) => {
                let remaining_ms = (record.window_reset_at - now).num_milliseconds().max(1);
                RateLimitResult::Limited {
                    retry_after: (remaining_ms as u64).div_ceil(1000),
                }
            }
        };

        let status = match result {
            RateLimitResult::Allowed => "allowed",
            RateLimitResult::Limited { .. } => "limited",
        };
        counter!("auth_rate_limit_total", "status" => status).increment(1);

        result
    }

    /// 현재 창의 시도 횟수.
    pub async fn attempts(&self, client_key: &str) -> Option<u32> {
        self.records.read().await.get(client_key).map(|r| r.count)
    }

    /// 현재 추적 중인 클라이언트 수 반환.
    pub async fn tracked_clients(&self) -> usize {
        self.records.read().await.len()
    }
}

/// 요청에서 클라이언트 키 추출.
///
/// 프록시 헤더는 `trust_proxy_headers`가 켜진 경우에만 사용합니다.
/// 순서: X-Forwarded-For 첫 주소 → X-Real-IP → 연결 주소 → `unknown`.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_proxy_headers: bool,
) -> String {
    if trust_proxy_headers {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = real_ip {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
