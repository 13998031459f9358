//! 역할/소유권 기반 접근 제어.
//!
//! 검증된 [`Identity`]에 대한 순수 판정 함수입니다. 에러를 만들지 않으며
//! 내부 상태가 없으므로 동시에 호출해도 안전합니다. `false`를 인가 실패로
//! 바꾸는 것은 호출자(요청 게이트)의 몫입니다.

use authgate_core::{Identity, Role};

/// 역할 일치 여부.
///
/// 역할 클레임이 없으면 항상 `false`입니다.
pub fn has_role(identity: &Identity, role: &Role) -> bool {
    identity.role() == Some(role)
}

/// 주어진 역할 중 하나라도 가지는지 확인.
pub fn has_any_role(identity: &Identity, roles: &[Role]) -> bool {
    identity.role().is_some_and(|r| roles.contains(r))
}

/// 리소스 소유자이거나 관리자인지 확인.
pub fn owns_resource(identity: &Identity, resource_subject_id: &str) -> bool {
    identity.subject_id == resource_subject_id || has_role(identity, &Role::Admin)
}
