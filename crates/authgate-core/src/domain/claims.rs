//! 커스텀 클레임.
//!
//! Provider는 클레임을 임의의 JSON 맵으로 다루지만, 게이트웨이 내부에서는
//! 역할만 타입으로 꺼내고 나머지는 불투명한 맵으로 보존합니다.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Role;

/// 역할 클레임 키.
pub const ROLE_CLAIM: &str = "role";

/// 클레임 맵 타입 (Provider 경계에서 사용).
pub type ClaimMap = Map<String, Value>;

/// 사용자 클레임.
///
/// `role`이 없거나 문자열이 아니거나 비어 있으면 `None`이며, 역할 검사에서
/// 실패할 뿐 에러로 취급하지 않습니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClaimMap", into = "ClaimMap")]
pub struct Claims {
    /// 역할
    pub role: Option<Role>,
    /// 역할 외 나머지 클레임
    pub extra: ClaimMap,
}

impl Claims {
    /// 역할만 가진 클레임 생성.
    pub fn with_role(role: Role) -> Self {
        Self {
            role: Some(role),
            extra: Map::new(),
        }
    }

    /// 추가 클레임 설정.
    pub fn insert(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key == ROLE_CLAIM {
            return self;
        }
        self.extra.insert(key, value.into());
        self
    }

    /// Provider 맵에서 변환.
    pub fn from_map(mut map: ClaimMap) -> Self {
        let role = match map.remove(ROLE_CLAIM) {
            Some(Value::String(raw)) => {
                let role = Role::parse(&raw);
                if role.is_none() {
                    tracing::debug!("Ignoring empty role claim");
                }
                role
            }
            Some(_) | None => None,
        };

        Self { role, extra: map }
    }

    /// Provider 맵으로 변환.
    pub fn to_map(&self) -> ClaimMap {
        let mut map = self.extra.clone();
        if let Some(role) = &self.role {
            map.insert(ROLE_CLAIM.to_string(), Value::String(role.as_str().to_string()));
        }
        map
    }
}

impl From<ClaimMap> for Claims {
    fn from(map: ClaimMap) -> Self {
        Claims::from_map(map)
    }
}

impl From<Claims> for ClaimMap {
    fn from(claims: Claims) -> Self {
        claims.to_map()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_map_extracts_role() {
        let map = json!({"role": "admin", "createdAt": "2026-01-01T00:00:00Z"});
        let claims = Claims::from_map(map.as_object().unwrap().clone());

        assert_eq!(claims.role, Some(Role::Admin));
        assert_eq!(claims.extra.get("createdAt"), Some(&json!("2026-01-01T00:00:00Z")));
        assert!(!claims.extra.contains_key(ROLE_CLAIM));
    }

    #[test]
    fn test_missing_or_malformed_role_is_none() {
        let claims = Claims::from_map(Map::new());
        assert_eq!(claims.role, None);

        let map = json!({"role": ""});
        let claims = Claims::from_map(map.as_object().unwrap().clone());
        assert_eq!(claims.role, None);

        let map = json!({"role": 7});
        let claims = Claims::from_map(map.as_object().unwrap().clone());
        assert_eq!(claims.role, None);
    }

    #[test]
    fn test_custom_role_round_trips() {
        let map = json!({"role": "editor"});
        let claims = Claims::from_map(map.as_object().unwrap().clone());
        assert_eq!(claims.role, Some(Role::Custom("editor".into())));
        assert_eq!(claims.to_map().get(ROLE_CLAIM), Some(&json!("editor")));
    }

    #[test]
    fn test_serde_uses_flat_map() {
        let claims = Claims::with_role(Role::User).insert("plan", "free");
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json, json!({"role": "user", "plan": "free"}));

        let back: Claims = serde_json::from_value(json).unwrap();
        assert_eq!(back, claims);
    }

    #[test]
    fn test_insert_cannot_override_role() {
        let claims = Claims::with_role(Role::User).insert(ROLE_CLAIM, "admin");
        assert_eq!(claims.role, Some(Role::User));
        assert!(claims.extra.is_empty());
    }
}
