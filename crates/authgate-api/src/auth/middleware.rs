//! 핸들러용 신원 추출기.
//!
//! 토큰 검증은 요청 게이트가 수행하고, 통과한 요청의 request extension에
//! [`Identity`]를 넣어 둡니다. 이 모듈의 추출기는 그 값을 꺼내기만 합니다.
//!
//! ```rust,ignore
//! async fn profile(CurrentIdentity(identity): CurrentIdentity) -> impl IntoResponse {
//!     format!("Hello, {}!", identity.email)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use authgate_core::Identity;

use crate::error::ApiError;

/// 인증된 사용자 신원 추출기.
///
/// 게이트를 거치지 않았거나 선택 인증에서 익명으로 통과한 요청이면 401을 반환합니다.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| ApiError::AuthenticationFailed("Authentication required".to_string()))
    }
}

/// 선택적 신원 추출기.
///
/// 신원이 있으면 `Some`, 없으면 `None`을 반환하며 실패하지 않습니다.
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalIdentity(parts.extensions.get::<Identity>().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::Claims;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    fn parts_with(identity: Option<Identity>) -> Parts {
        let (mut parts, _) = Request::builder().uri("/").body(()).unwrap().into_parts();
        if let Some(identity) = identity {
            parts.extensions.insert(identity);
        }
        parts
    }

    fn identity() -> Identity {
        Identity {
            subject_id: "uid-1".to_string(),
            email: "a@x.com".to_string(),
            email_verified: false,
            display_name: None,
            photo_url: None,
            claims: Claims::default(),
        }
    }

    #[tokio::test]
    async fn test_current_identity_present() {
        let mut parts = parts_with(Some(identity()));
        let CurrentIdentity(found) = CurrentIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(found.subject_id, "uid-1");
    }

    #[tokio::test]
    async fn test_current_identity_missing_is_unauthorized() {
        let mut parts = parts_with(None);
        let rejection = CurrentIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_optional_identity() {
        let mut anonymous = parts_with(None);
        let OptionalIdentity(none) = OptionalIdentity::from_request_parts(&mut anonymous, &())
            .await
            .unwrap();
        assert!(none.is_none());

        let mut signed_in = parts_with(Some(identity()));
        let OptionalIdentity(some) = OptionalIdentity::from_request_parts(&mut signed_in, &())
            .await
            .unwrap();
        assert!(some.is_some());
    }
}
