//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`RefreshTokenCodec`]: Refresh Token 서명/검증
//! - [`SessionManager`]: 가입, 로그인, 갱신, 로그아웃, Access Token 검증
//! - [`has_role`], [`has_any_role`], [`owns_resource`]: 인가 판정
//! - [`CurrentIdentity`], [`OptionalIdentity`]: 핸들러용 신원 추출기

mod jwt;
mod middleware;
mod password;
mod roles;
mod session;

pub use jwt::{RefreshClaims, RefreshTokenCodec, TokenError, DEFAULT_REFRESH_TTL_DAYS, REFRESH_PURPOSE};
pub use middleware::{CurrentIdentity, OptionalIdentity};
pub use password::{strong_password, validate_password_strength, LOGIN_MIN_LEN, REGISTER_MIN_LEN};
pub use roles::{has_any_role, has_role, owns_resource};
pub use session::{SessionError, SessionManager, SessionResult};
