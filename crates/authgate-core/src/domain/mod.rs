//! 게이트웨이 도메인 모델.

mod claims;
mod identity;
mod role;
mod token;

pub use claims::{ClaimMap, Claims, ROLE_CLAIM};
pub use identity::{Identity, ProfileUpdate};
pub use role::{Role, MAX_ROLE_NAME_LEN};
pub use token::{TokenPair, BEARER};
