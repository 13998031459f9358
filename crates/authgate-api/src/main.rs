//! 인증 게이트웨이 서버 진입점.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use secrecy::SecretString;
use tracing::{error, info, warn};

use authgate_api::{create_router, setup_metrics_recorder, AppState};
use authgate_core::{
    init_logging, AppConfig, IdentityProvider, LogConfig, MemoryIdentityProvider, ProviderKind,
    SystemClock,
};

/// 서명 키가 설정되지 않았을 때 쓰는 개발용 키.
const DEV_REFRESH_SECRET: &str = "development-refresh-secret-change-in-production";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("failed to load configuration")?;

    init_logging(LogConfig::from(&config.logging))
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    info!("Starting AuthGate server...");

    let metrics_handle = setup_metrics_recorder().context("failed to install metrics recorder")?;
    info!("Prometheus metrics recorder initialized");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| {
            error!(
                host = %config.server.host,
                port = config.server.port,
                error = %e,
                "Invalid listen address, check server.host and server.port"
            );
            e
        })?;

    let refresh_secret = match config.auth.refresh_token_secret.clone() {
        Some(secret) => SecretString::from(secret),
        None => {
            warn!("Refresh token secret is not configured, using the development fallback. Set AUTHGATE__AUTH__REFRESH_TOKEN_SECRET or JWT_SECRET in production");
            SecretString::from(DEV_REFRESH_SECRET.to_string())
        }
    };

    let clock = SystemClock::shared();
    let provider: Arc<dyn IdentityProvider> = match config.provider.kind {
        ProviderKind::Memory => {
            warn!("Using the in-memory identity provider, users are lost on restart");
            Arc::new(MemoryIdentityProvider::new(
                clock.clone(),
                config.provider.access_token_ttl_secs,
            ))
        }
    };

    info!(
        provider = provider.provider_name(),
        rate_limit_enabled = config.rate_limit.enabled,
        max_attempts = config.rate_limit.max_attempts,
        window_secs = config.rate_limit.window_secs,
        "Authentication gateway configured"
    );

    let state = AppState::new(provider, refresh_secret, &config, clock).with_metrics(metrics_handle);
    let app = create_router(Arc::new(state), &config.server);

    info!(%addr, "API server listening");
    info!("Metrics available at http://{}/metrics", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM 시그널을 수신하면 반환합니다.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
