//! API 서버용 HTTP middleware.
//!
//! 요청 처리 파이프라인에 적용되는 middleware 모듈.

mod gate;
mod metrics;
mod rate_limit;

pub use gate::{
    gate_middleware, AuthMode, AuthenticateStage, Gate, GateContext, GateOutcome, GateStage,
    OwnershipStage, RateLimitStage, RoleRequirement, RoleStage,
};
pub use metrics::metrics_layer;
pub use rate_limit::{client_key, RateLimitConfig, RateLimitResult, RateLimiter, UNKNOWN_CLIENT};
