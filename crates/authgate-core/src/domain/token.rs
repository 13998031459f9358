//! Access Token + Refresh Token 페어.

use serde::{Deserialize, Serialize};

/// 토큰 타입 (항상 "Bearer").
pub const BEARER: &str = "Bearer";

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Provider가 발급한 Access Token
    pub access_token: String,
    /// 게이트웨이가 서명한 Refresh Token
    pub refresh_token: String,
    /// Access Token 만료 시간 (초)
    pub expires_in: i64,
    /// 토큰 타입
    pub token_type: String,
}

impl TokenPair {
    /// Bearer 토큰 쌍 생성.
    pub fn bearer(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            token_type: BEARER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_pair_json_shape() {
        let pair = TokenPair::bearer("a".into(), "r".into(), 3600);
        let json = serde_json::to_value(&pair).unwrap();

        assert_eq!(json["accessToken"], "a");
        assert_eq!(json["refreshToken"], "r");
        assert_eq!(json["expiresIn"], 3600);
        assert_eq!(json["tokenType"], "Bearer");
    }
}
