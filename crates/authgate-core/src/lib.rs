//! # AuthGate Core
//!
//! 인증 게이트웨이의 핵심 도메인 모델 및 외부 Identity Provider 경계를 제공합니다.
//!
//! 이 크레이트는 게이트웨이 전반에서 사용되는 기본 타입을 제공합니다:
//! - 검증된 사용자 신원 ([`Identity`]) 및 역할 클레임
//! - Access/Refresh 토큰 쌍
//! - Identity Provider 어댑터 trait 및 인메모리 구현
//! - 테스트에서 제어 가능한 시계
//! - 설정 관리
//! - 로깅 인프라

pub mod clock;
pub mod config;
pub mod domain;
pub mod logging;
pub mod provider;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use config::*;
pub use domain::*;
pub use logging::*;
pub use provider::{
    DecodedToken, IdentityProvider, MemoryIdentityProvider, NewUser, ProviderError,
    ProviderResult, UserRecord, UserUpdate,
};
