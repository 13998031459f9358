//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → 설정 파일(선택) → `AUTHGATE__` 접두사 환경 변수 순으로 덮어씁니다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 설정 파일 경로를 지정하는 환경 변수.
pub const CONFIG_PATH_ENV: &str = "AUTHGATE_CONFIG";

/// 기존 배포와의 호환을 위한 서명 키 환경 변수.
pub const LEGACY_SECRET_ENV: &str = "JWT_SECRET";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 토큰 설정
    pub auth: AuthConfig,
    /// 인증 시도 제한 설정
    pub rate_limit: RateLimitSettings,
    /// Identity Provider 설정
    pub provider: ProviderConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용 CORS origin (비어 있으면 모두 허용)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout_secs: 30,
            cors_origins: Vec::new(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "authgate_api=info,authgate_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 토큰 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Refresh Token 서명 키. 없으면 개발용 기본값을 사용합니다.
    pub refresh_token_secret: Option<String>,
    /// Refresh Token 수명 (일)
    pub refresh_token_ttl_days: i64,
    /// 비밀번호 재설정 링크의 continue URL
    pub password_reset_url: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            refresh_token_secret: None,
            refresh_token_ttl_days: 30,
            password_reset_url: "http://localhost:3000/reset-password".to_string(),
        }
    }
}

/// 한 마운트 지점의 시도 제한 값.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptLimit {
    /// 윈도우 내 최대 시도 횟수
    pub max_attempts: u32,
    /// 윈도우 길이 (초)
    pub window_secs: u64,
}

impl Default for AttemptLimit {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_secs: 15 * 60,
        }
    }
}

/// 라우트별 덮어쓰기.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteLimitOverride {
    pub max_attempts: Option<u32>,
    pub window_secs: Option<u64>,
}

/// 인증 시도 제한 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// 기본 최대 시도 횟수
    pub max_attempts: u32,
    /// 기본 윈도우 길이 (초)
    pub window_secs: u64,
    /// X-Forwarded-For / X-Real-IP 헤더 신뢰 여부 (프록시 뒤에서만 켤 것)
    pub trust_proxy_headers: bool,
    /// 라우트 이름(`register`, `login`, `forgot_password`)별 덮어쓰기
    pub routes: HashMap<String, RouteLimitOverride>,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        let limit = AttemptLimit::default();
        Self {
            enabled: true,
            max_attempts: limit.max_attempts,
            window_secs: limit.window_secs,
            trust_proxy_headers: false,
            routes: HashMap::new(),
        }
    }
}

impl RateLimitSettings {
    /// 기본 제한 값.
    pub fn default_limit(&self) -> AttemptLimit {
        AttemptLimit {
            max_attempts: self.max_attempts,
            window_secs: self.window_secs,
        }
    }

    /// 라우트 덮어쓰기가 있으면 그 값을, 없으면 `None`.
    pub fn route_override(&self, route: &str) -> Option<AttemptLimit> {
        self.routes.get(route).map(|o| AttemptLimit {
            max_attempts: o.max_attempts.unwrap_or(self.max_attempts),
            window_secs: o.window_secs.unwrap_or(self.window_secs),
        })
    }
}

/// Identity Provider 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// 인메모리 Provider (개발/테스트)
    #[default]
    Memory,
}

/// Identity Provider 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Access Token 수명 (초, Provider가 결정)
    pub access_token_ttl_secs: i64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Memory,
            access_token_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("AUTHGATE")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        if config.auth.refresh_token_secret.is_none() {
            config.auth.refresh_token_secret = std::env::var(LEGACY_SECRET_ENV)
                .ok()
                .filter(|s| !s.is_empty());
        }

        Ok(config)
    }

    /// 기본 경로(`AUTHGATE_CONFIG` 또는 `config/default.toml`)에서 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load(path)
    }
}
