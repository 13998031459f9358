//! Refresh Token 서명/검증.
//!
//! Refresh Token은 게이트웨이가 직접 발급하는 자기완결형 HS256 JWT입니다.
//! 페이로드에는 사용자 ID, 용도 태그(`refresh`), 발급/만료 시각이 들어갑니다.
//!
//! 검증 순서는 서명 → 만료 → 용도이며, 앞 단계에서 실패하면 뒤 단계는
//! 확인하지 않습니다. 만료 판정은 주입된 시계를 사용합니다.

use chrono::Duration;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use authgate_core::SharedClock;

/// Refresh Token 용도 태그.
pub const REFRESH_PURPOSE: &str = "refresh";

/// Refresh Token 기본 수명 (일).
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 30;

/// Refresh Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// Subject - 사용자 ID
    pub sub: String,
    /// 용도 태그. 누락 시 빈 문자열로 읽혀 용도 불일치로 거부됩니다.
    #[serde(default)]
    pub purpose: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 같은 초에 발급된 토큰끼리도 구분되도록 하는 난수
    #[serde(default)]
    pub jti: String,
}

/// Refresh Token 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// 서명 불일치 또는 형식 오류
    #[error("invalid refresh token")]
    InvalidToken,
    /// 만료됨
    #[error("refresh token has expired")]
    ExpiredToken,
    /// 용도 태그가 `refresh`가 아님
    #[error("token is not a refresh token")]
    WrongPurpose,
    /// 서명 실패
    #[error("failed to sign refresh token: {0}")]
    Signing(String),
}

/// Refresh Token 코덱.
pub struct RefreshTokenCodec {
    secret: SecretString,
    ttl: Duration,
    clock: SharedClock,
}

impl std::fmt::Debug for RefreshTokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenCodec")
            .field("secret", &"[REDACTED]")
            .field("ttl_days", &self.ttl.num_days())
            .finish()
    }
}

impl RefreshTokenCodec {
    /// 새 코덱 생성.
    ///
    /// # Arguments
    ///
    /// * `secret` - 서명 키
    /// * `ttl_days` - 토큰 수명 (일)
    /// * `clock` - 발급/만료 판정에 쓰는 시계
    pub fn new(secret: SecretString, ttl_days: i64, clock: SharedClock) -> Self {
        Self {
            secret,
            ttl: Duration::days(ttl_days),
            clock,
        }
    }

    /// Refresh Token 발급.
    pub fn issue_refresh_token(&self, subject_id: &str) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = RefreshClaims {
            sub: subject_id.to_string(),
            purpose: REFRESH_PURPOSE.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Refresh Token 검증.
    ///
    /// # Errors
    ///
    /// - `TokenError::InvalidToken`: 서명 불일치, 형식 오류
    /// - `TokenError::ExpiredToken`: 만료 시각 경과
    /// - `TokenError::WrongPurpose`: 용도 태그 불일치
    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // 만료는 주입된 시계로 직접 판정한다
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )
        .map_err(|_| TokenError::InvalidToken)?;
        let claims = data.claims;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::ExpiredToken);
        }

        if claims.purpose != REFRESH_PURPOSE {
            return Err(TokenError::WrongPurpose);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_core::{Clock, ManualClock};

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn codec(secret: &str, clock: &ManualClock) -> RefreshTokenCodec {
        RefreshTokenCodec::new(
            SecretString::from(secret.to_string()),
            DEFAULT_REFRESH_TTL_DAYS,
            clock.shared(),
        )
    }

    fn sign_raw(claims: &RefreshClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);

        let token = codec.issue_refresh_token("user123").unwrap();
        let claims = codec.verify_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.purpose, REFRESH_PURPOSE);
        assert_eq!(claims.exp - claims.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn test_tokens_issued_in_same_instant_differ() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);

        let a = codec.issue_refresh_token("user123").unwrap();
        let b = codec.issue_refresh_token("user123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);
        let token = codec.issue_refresh_token("user123").unwrap();

        clock.advance(Duration::days(30) + Duration::seconds(1));

        assert_eq!(codec.verify_refresh_token(&token), Err(TokenError::ExpiredToken));
    }

    #[test]
    fn test_wrong_secret() {
        let clock = ManualClock::starting_now();
        let issuer = codec(TEST_SECRET, &clock);
        let verifier = codec("wrong-secret-key-for-testing-minimum-32-chars", &clock);

        let token = issuer.issue_refresh_token("user123").unwrap();
        assert_eq!(verifier.verify_refresh_token(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_signature_checked_before_expiry() {
        let clock = ManualClock::starting_now();
        let issuer = codec(TEST_SECRET, &clock);
        let verifier = codec("another-secret", &clock);
        let token = issuer.issue_refresh_token("user123").unwrap();

        clock.advance(Duration::days(60));

        assert_eq!(verifier.verify_refresh_token(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_wrong_purpose() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);
        let now = clock.now().timestamp();

        let token = sign_raw(
            &RefreshClaims {
                sub: "user123".to_string(),
                purpose: "access".to_string(),
                iat: now,
                exp: now + 3600,
                jti: "j".to_string(),
            },
            TEST_SECRET,
        );

        assert_eq!(codec.verify_refresh_token(&token), Err(TokenError::WrongPurpose));
    }

    #[test]
    fn test_expiry_checked_before_purpose() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);
        let now = clock.now().timestamp();

        let token = sign_raw(
            &RefreshClaims {
                sub: "user123".to_string(),
                purpose: "access".to_string(),
                iat: now - 7200,
                exp: now - 3600,
                jti: "j".to_string(),
            },
            TEST_SECRET,
        );

        assert_eq!(codec.verify_refresh_token(&token), Err(TokenError::ExpiredToken));
    }

    #[test]
    fn test_missing_purpose_is_wrong_purpose() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);
        let now = clock.now().timestamp();

        let token = encode(
            &Header::new(Algorithm::HS256),
            &serde_json::json!({"sub": "user123", "iat": now, "exp": now + 60}),
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(codec.verify_refresh_token(&token), Err(TokenError::WrongPurpose));
    }

    #[test]
    fn test_malformed_token() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);

        assert_eq!(
            codec.verify_refresh_token("invalid.token.here"),
            Err(TokenError::InvalidToken)
        );
        assert_eq!(codec.verify_refresh_token(""), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let clock = ManualClock::starting_now();
        let codec = codec(TEST_SECRET, &clock);
        let debug = format!("{:?}", codec);
        assert!(!debug.contains(TEST_SECRET));
        assert!(debug.contains("REDACTED"));
    }
}
