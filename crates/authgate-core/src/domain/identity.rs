//! 검증된 사용자 신원.

use serde::{Deserialize, Serialize};

use super::{Claims, Role};
use crate::provider::{UserRecord, UserUpdate};

/// 검증된 사용자 신원.
///
/// 토큰 검증 또는 프로필 조회 결과이며, 요청 하나의 범위에서만 사용되는
/// 불변 스냅샷입니다. 게이트웨이는 이를 저장하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Provider가 부여한 사용자 ID
    #[serde(rename = "uid")]
    pub subject_id: String,
    /// 이메일
    pub email: String,
    /// 이메일 인증 여부
    pub email_verified: bool,
    /// 표시 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// 프로필 사진 URL
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// 커스텀 클레임
    #[serde(default)]
    pub claims: Claims,
}

impl Identity {
    /// Provider 레코드와 클레임으로 생성.
    pub fn from_record(record: UserRecord, claims: Claims) -> Self {
        Self {
            subject_id: record.uid,
            email: record.email,
            email_verified: record.email_verified,
            display_name: record.display_name,
            photo_url: record.photo_url,
            claims,
        }
    }

    /// 레코드에 저장된 커스텀 클레임을 그대로 사용.
    pub fn from_stored_record(record: UserRecord) -> Self {
        let claims = Claims::from_map(record.custom_claims.clone());
        Self::from_record(record, claims)
    }

    /// 역할 클레임.
    pub fn role(&self) -> Option<&Role> {
        self.claims.role.as_ref()
    }
}

/// 프로필 부분 업데이트.
///
/// 값이 있고 비어 있지 않은 필드만 적용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl ProfileUpdate {
    /// Provider 업데이트로 변환 (빈 문자열 제거).
    pub fn into_user_update(self) -> UserUpdate {
        fn present(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        UserUpdate {
            email: present(self.email),
            display_name: present(self.display_name),
            photo_url: present(self.photo_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn record() -> UserRecord {
        UserRecord {
            uid: "uid-1".to_string(),
            email: "a@x.com".to_string(),
            email_verified: false,
            display_name: Some("Alice".to_string()),
            photo_url: None,
            custom_claims: json!({"role": "admin"}).as_object().unwrap().clone(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_stored_record_reads_role() {
        let identity = Identity::from_stored_record(record());
        assert_eq!(identity.subject_id, "uid-1");
        assert_eq!(identity.role(), Some(&Role::Admin));
    }

    #[test]
    fn test_identity_json_shape() {
        let identity = Identity::from_stored_record(record());
        let json = serde_json::to_value(&identity).unwrap();

        assert_eq!(json["uid"], "uid-1");
        assert_eq!(json["emailVerified"], false);
        assert_eq!(json["displayName"], "Alice");
        assert!(json.get("photoURL").is_none());
        assert_eq!(json["claims"]["role"], "admin");
    }

    #[test]
    fn test_profile_update_drops_empty_fields() {
        let update = ProfileUpdate {
            email: Some(String::new()),
            display_name: Some("Bob".to_string()),
            photo_url: Some("   ".to_string()),
        }
        .into_user_update();

        assert_eq!(update.email, None);
        assert_eq!(update.display_name.as_deref(), Some("Bob"));
        assert_eq!(update.photo_url, None);
        assert!(!update.is_empty());
    }
}
