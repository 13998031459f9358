//! 요청 게이트.
//!
//! 보호된 경로로 들어오는 요청을 순서가 정해진 단계(stage) 목록에 통과시킵니다.
//! 각 단계는 [`GateOutcome::Continue`] 또는 [`GateOutcome::Reject`]를 반환하며,
//! 첫 거부에서 파이프라인이 멈춥니다.
//!
//! 일반적인 구성:
//!
//! 1. [`RateLimitStage`] - 시도 민감 경로에서만 (429)
//! 2. [`AuthenticateStage`] - Bearer 토큰 검증 (401, 또는 선택 모드에서 통과)
//! 3. [`RoleStage`] / [`OwnershipStage`] - 인가 판정 (403, 신원이 없으면 401)
//!
//! 단계가 `Err`를 반환하면 예상하지 못한 오류로 보고 500과 고정 메시지로
//! 응답합니다. 상세 내용은 로그에만 남습니다.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts, RawPathParams, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{error, warn};

use authgate_core::{Identity, Role, BEARER};

use super::rate_limit::{client_key, RateLimitResult, RateLimiter};
use crate::auth::{has_any_role, has_role, owns_resource, SessionError, SessionManager};
use crate::error::ApiError;

/// 단계 판정 결과.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// 다음 단계로 진행
    Continue,
    /// 요청 거부
    Reject(ApiError),
}

/// 단계 사이에서 공유되는 요청 정보.
#[derive(Debug, Clone, Default)]
pub struct GateContext {
    /// 요청 헤더
    pub headers: HeaderMap,
    /// 연결 주소
    pub peer: Option<SocketAddr>,
    /// 경로 파라미터
    pub params: HashMap<String, String>,
    /// 인증 단계가 채우는 신원
    pub identity: Option<Identity>,
}

impl GateContext {
    /// 요청 파츠에서 컨텍스트 생성.
    pub async fn from_parts(parts: &mut Parts) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        let params = match RawPathParams::from_request_parts(parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            Err(_) => HashMap::new(),
        };

        Self {
            headers: parts.headers.clone(),
            peer,
            params,
            identity: None,
        }
    }

    /// `Authorization: Bearer <token>` 헤더의 토큰.
    ///
    /// 헤더가 없거나 형식이 다르거나 토큰이 비어 있으면 `None`입니다.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix(BEARER))
            .and_then(|h| h.strip_prefix(' '))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// 게이트 단계.
#[async_trait]
pub trait GateStage: Send + Sync {
    /// 메트릭/로그에 쓰는 단계 이름.
    fn name(&self) -> &'static str;

    /// 단계 판정.
    async fn apply(&self, ctx: &mut GateContext) -> anyhow::Result<GateOutcome>;
}

// =============================================================================
// 단계 구현
// =============================================================================

/// 시도 제한 단계.
pub struct RateLimitStage {
    limiter: RateLimiter,
    trust_proxy_headers: bool,
}

impl RateLimitStage {
    pub fn new(limiter: RateLimiter, trust_proxy_headers: bool) -> Self {
        Self {
            limiter,
            trust_proxy_headers,
        }
    }
}

#[async_trait]
impl GateStage for RateLimitStage {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn apply(&self, ctx: &mut GateContext) -> anyhow::Result<GateOutcome> {
        let key = client_key(&ctx.headers, ctx.peer, self.trust_proxy_headers);

        Ok(match self.limiter.check(&key).await {
            RateLimitResult::Allowed => GateOutcome::Continue,
            RateLimitResult::Limited { retry_after } => {
                warn!(client_key = %key, retry_after, "Authentication attempt limit exceeded");
                GateOutcome::Reject(ApiError::RateLimited { retry_after })
            }
        })
    }
}

/// 인증 모드.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// 토큰 필수
    Mandatory,
    /// 토큰이 없거나 잘못되어도 익명으로 진행
    Optional,
}

/// Access Token 검증 단계.
pub struct AuthenticateStage {
    sessions: Arc<SessionManager>,
    mode: AuthMode,
}

impl AuthenticateStage {
    pub fn new(sessions: Arc<SessionManager>, mode: AuthMode) -> Self {
        Self { sessions, mode }
    }

    pub fn mandatory(sessions: Arc<SessionManager>) -> Self {
        Self::new(sessions, AuthMode::Mandatory)
    }

    pub fn optional(sessions: Arc<SessionManager>) -> Self {
        Self::new(sessions, AuthMode::Optional)
    }
}

#[async_trait]
impl GateStage for AuthenticateStage {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    async fn apply(&self, ctx: &mut GateContext) -> anyhow::Result<GateOutcome> {
        let Some(token) = ctx.bearer_token().map(str::to_owned) else {
            return Ok(match self.mode {
                AuthMode::Mandatory => GateOutcome::Reject(ApiError::AuthenticationFailed(
                    "Access token is required".to_string(),
                )),
                AuthMode::Optional => GateOutcome::Continue,
            });
        };

        match (self.sessions.verify(&token).await, self.mode) {
            (Ok(identity), _) => {
                ctx.identity = Some(identity);
                Ok(GateOutcome::Continue)
            }
            (Err(e), AuthMode::Optional) => {
                warn!(error = %e, "Optional authentication failed, continuing anonymously");
                Ok(GateOutcome::Continue)
            }
            (Err(SessionError::TokenInvalid), AuthMode::Mandatory) => Ok(GateOutcome::Reject(
                ApiError::AuthenticationFailed("Invalid or expired token".to_string()),
            )),
            (Err(e), AuthMode::Mandatory) => Err(e.into()),
        }
    }
}

/// 역할 요구 조건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleRequirement {
    /// 정확히 이 역할
    One(Role),
    /// 이 중 하나
    AnyOf(Vec<Role>),
}

impl RoleRequirement {
    fn is_met_by(&self, identity: &Identity) -> bool {
        match self {
            RoleRequirement::One(role) => has_role(identity, role),
            RoleRequirement::AnyOf(roles) => has_any_role(identity, roles),
        }
    }

    fn denial_message(&self) -> String {
        match self {
            RoleRequirement::One(role) => format!("Access denied. Required role: {}", role),
            RoleRequirement::AnyOf(roles) => {
                let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
                format!("Access denied. Required roles: {}", names.join(", "))
            }
        }
    }
}

/// 역할 인가 단계.
pub struct RoleStage {
    requirement: RoleRequirement,
}

impl RoleStage {
    pub fn require(role: Role) -> Self {
        Self {
            requirement: RoleRequirement::One(role),
        }
    }

    pub fn require_any(roles: impl Into<Vec<Role>>) -> Self {
        Self {
            requirement: RoleRequirement::AnyOf(roles.into()),
        }
    }
}

#[async_trait]
impl GateStage for RoleStage {
    fn name(&self) -> &'static str {
        "authorize_role"
    }

    async fn apply(&self, ctx: &mut GateContext) -> anyhow::Result<GateOutcome> {
        let Some(identity) = ctx.identity.as_ref() else {
            return Ok(GateOutcome::Reject(authentication_required()));
        };

        if self.requirement.is_met_by(identity) {
            return Ok(GateOutcome::Continue);
        }

        Ok(GateOutcome::Reject(ApiError::AuthorizationDenied(
            self.requirement.denial_message(),
        )))
    }
}

/// 리소스 소유권 단계.
///
/// 경로 파라미터 값을 리소스 소유자 ID로 보고, 본인 또는 관리자만 통과시킵니다.
pub struct OwnershipStage {
    param: &'static str,
}

impl OwnershipStage {
    pub fn new(param: &'static str) -> Self {
        Self { param }
    }
}

#[async_trait]
impl GateStage for OwnershipStage {
    fn name(&self) -> &'static str {
        "authorize_ownership"
    }

    async fn apply(&self, ctx: &mut GateContext) -> anyhow::Result<GateOutcome> {
        let Some(identity) = ctx.identity.as_ref() else {
            return Ok(GateOutcome::Reject(authentication_required()));
        };

        let resource_owner = ctx
            .params
            .get(self.param)
            .ok_or_else(|| anyhow::anyhow!("route parameter `{}` is missing", self.param))?;

        if owns_resource(identity, resource_owner) {
            Ok(GateOutcome::Continue)
        } else {
            Ok(GateOutcome::Reject(ApiError::AuthorizationDenied(
                "Access denied. You can only access your own resources.".to_string(),
            )))
        }
    }
}

fn authentication_required() -> ApiError {
    ApiError::AuthenticationFailed("Authentication required".to_string())
}

// =============================================================================
// 파이프라인
// =============================================================================

/// 단계 파이프라인.
#[derive(Clone, Default)]
pub struct Gate {
    stages: Vec<Arc<dyn GateStage>>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 단계 추가.
    pub fn stage(mut self, stage: impl GateStage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// 단계 이름 목록 (순서대로).
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 파이프라인 실행.
    pub async fn run(&self, ctx: &mut GateContext) -> GateOutcome {
        for stage in &self.stages {
            match stage.apply(ctx).await {
                Ok(GateOutcome::Continue) => continue,
                Ok(GateOutcome::Reject(err)) => {
                    warn!(stage = stage.name(), status = %err.status(), reason = %err, "Request rejected");
                    record_rejection(stage.name(), &err);
                    return GateOutcome::Reject(err);
                }
                Err(e) => {
                    error!(stage = stage.name(), error = %e, "Gate stage failed");
                    let err = ApiError::Internal(e.to_string());
                    record_rejection(stage.name(), &err);
                    return GateOutcome::Reject(err);
                }
            }
        }
        GateOutcome::Continue
    }
}

fn record_rejection(stage: &'static str, err: &ApiError) {
    counter!(
        "auth_gate_rejections_total",
        "stage" => stage,
        "status" => err.status().as_u16().to_string()
    )
    .increment(1);
}

/// 게이트 미들웨어.
///
/// 통과한 요청에는 검증된 [`Identity`]를 request extension으로 추가합니다.
pub async fn gate_middleware(
    State(gate): State<Arc<Gate>>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let mut ctx = GateContext::from_parts(&mut parts).await;

    match gate.run(&mut ctx).await {
        GateOutcome::Continue => {
            if let Some(identity) = ctx.identity {
                parts.extensions.insert(identity);
            }
            next.run(Request::from_parts(parts, body)).await
        }
        GateOutcome::Reject(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::{Claims, ManualClock, MemoryIdentityProvider};
    use axum::http::StatusCode;
    use secrecy::SecretString;

    use crate::auth::RefreshTokenCodec;
    use crate::middleware::rate_limit::RateLimitConfig;

    fn identity(uid: &str, role: Option<Role>) -> Identity {
        Identity {
            subject_id: uid.to_string(),
            email: format!("{}@x.com", uid),
            email_verified: false,
            display_name: None,
            photo_url: None,
            claims: Claims {
                role,
                ..Default::default()
            },
        }
    }

    fn ctx_with(identity: Option<Identity>) -> GateContext {
        GateContext {
            identity,
            ..Default::default()
        }
    }

    fn sessions(clock: &ManualClock) -> Arc<SessionManager> {
        let provider = Arc::new(MemoryIdentityProvider::new(clock.shared(), 3600));
        let codec = RefreshTokenCodec::new(SecretString::from("s".to_string()), 30, clock.shared());
        Arc::new(SessionManager::new(provider, codec, clock.shared(), "http://localhost"))
    }

    struct Failing;

    #[async_trait]
    impl GateStage for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn apply(&self, _ctx: &mut GateContext) -> anyhow::Result<GateOutcome> {
            anyhow::bail!("database at 10.1.2.3 refused connection")
        }
    }

    struct Unreachable;

    #[async_trait]
    impl GateStage for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        async fn apply(&self, _ctx: &mut GateContext) -> anyhow::Result<GateOutcome> {
            panic!("stage after a rejection must not run");
        }
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut ctx = GateContext::default();
        assert_eq!(ctx.bearer_token(), None);

        ctx.headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(ctx.bearer_token(), Some("abc"));

        ctx.headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(ctx.bearer_token(), None);

        ctx.headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(ctx.bearer_token(), None);

        ctx.headers.insert(AUTHORIZATION, "Bearerabc".parse().unwrap());
        assert_eq!(ctx.bearer_token(), None);
    }

    #[tokio::test]
    async fn test_rejection_short_circuits() {
        let gate = Gate::new()
            .stage(RoleStage::require(Role::Admin))
            .stage(Unreachable);

        let outcome = gate.run(&mut ctx_with(None)).await;
        assert_eq!(outcome, GateOutcome::Reject(authentication_required()));
    }

    #[tokio::test]
    async fn test_stage_error_becomes_internal() {
        let gate = Gate::new().stage(Failing).stage(Unreachable);

        match gate.run(&mut ctx_with(None)).await {
            GateOutcome::Reject(err) => {
                assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(err.to_response_body().message, "Internal server error");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_role_stage_messages() {
        let admin_only = Gate::new().stage(RoleStage::require(Role::Admin));
        let either = Gate::new().stage(RoleStage::require_any([Role::User, Role::Admin]));

        assert_eq!(
            admin_only.run(&mut ctx_with(Some(identity("a", Some(Role::User))))).await,
            GateOutcome::Reject(ApiError::AuthorizationDenied(
                "Access denied. Required role: admin".to_string()
            ))
        );
        assert_eq!(
            either.run(&mut ctx_with(Some(identity("a", None)))).await,
            GateOutcome::Reject(ApiError::AuthorizationDenied(
                "Access denied. Required roles: user, admin".to_string()
            ))
        );
        assert_eq!(
            either.run(&mut ctx_with(Some(identity("a", Some(Role::User))))).await,
            GateOutcome::Continue
        );

        let editors = Gate::new().stage(RoleStage::require_any([
            Role::Admin,
            Role::Custom("editor".into()),
        ]));
        assert_eq!(
            editors.run(&mut ctx_with(Some(identity("e", Role::parse("editor"))))).await,
            GateOutcome::Continue
        );
        assert_eq!(
            editors.run(&mut ctx_with(Some(identity("u", Some(Role::User))))).await,
            GateOutcome::Reject(ApiError::AuthorizationDenied(
                "Access denied. Required roles: admin, editor".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_ownership_stage() {
        let gate = Gate::new().stage(OwnershipStage::new("user_id"));

        let mut own = ctx_with(Some(identity("alice", Some(Role::User))));
        own.params.insert("user_id".into(), "alice".into());
        assert_eq!(gate.run(&mut own).await, GateOutcome::Continue);

        let mut other = ctx_with(Some(identity("alice", Some(Role::User))));
        other.params.insert("user_id".into(), "bob".into());
        assert!(matches!(
            gate.run(&mut other).await,
            GateOutcome::Reject(ApiError::AuthorizationDenied(_))
        ));

        let mut admin = ctx_with(Some(identity("root", Some(Role::Admin))));
        admin.params.insert("user_id".into(), "bob".into());
        assert_eq!(gate.run(&mut admin).await, GateOutcome::Continue);

        let mut missing_param = ctx_with(Some(identity("alice", None)));
        assert!(matches!(
            gate.run(&mut missing_param).await,
            GateOutcome::Reject(ApiError::Internal(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_modes() {
        let clock = ManualClock::starting_now();
        let sessions = sessions(&clock);

        let mandatory = Gate::new().stage(AuthenticateStage::mandatory(sessions.clone()));
        let optional = Gate::new().stage(AuthenticateStage::optional(sessions.clone()));

        assert_eq!(
            mandatory.run(&mut GateContext::default()).await,
            GateOutcome::Reject(ApiError::AuthenticationFailed(
                "Access token is required".to_string()
            ))
        );

        let mut bad = GateContext::default();
        bad.headers.insert(AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert_eq!(
            mandatory.run(&mut bad.clone()).await,
            GateOutcome::Reject(ApiError::AuthenticationFailed(
                "Invalid or expired token".to_string()
            ))
        );
        assert_eq!(optional.run(&mut bad).await, GateOutcome::Continue);
        assert!(bad.identity.is_none());

        sessions.register("a@x.com", "Passw0rd", None).await.unwrap();
        let pair = sessions.login("a@x.com", "x").await.unwrap();
        let mut good = GateContext::default();
        good.headers.insert(
            AUTHORIZATION,
            format!("Bearer {}", pair.access_token).parse().unwrap(),
        );
        assert_eq!(mandatory.run(&mut good).await, GateOutcome::Continue);
        assert_eq!(good.identity.unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn test_rate_limit_stage() {
        let clock = ManualClock::starting_now();
        let limiter = RateLimiter::new(
            RateLimitConfig {
                max_attempts: 1,
                window: chrono::Duration::minutes(1),
            },
            clock.shared(),
        );
        let gate = Gate::new().stage(RateLimitStage::new(limiter, false));

        assert_eq!(gate.run(&mut GateContext::default()).await, GateOutcome::Continue);
        assert_eq!(
            gate.run(&mut GateContext::default()).await,
            GateOutcome::Reject(ApiError::RateLimited { retry_after: 60 })
        );
    }

    #[test]
    fn test_stage_names_in_order() {
        let clock = ManualClock::starting_now();
        let gate = Gate::new()
            .stage(AuthenticateStage::mandatory(sessions(&clock)))
            .stage(RoleStage::require(Role::Admin));
        assert_eq!(gate.stage_names(), vec!["authenticate", "authorize_role"]);
    }
}
