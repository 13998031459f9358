//! 사용자 역할.
//!
//! Provider의 커스텀 클레임 `role` 값을 타입으로 표현합니다.
//! `user`, `admin` 외의 값은 [`Role::Custom`]으로 그대로 보존됩니다.

use serde::{Deserialize, Serialize};

/// 역할 이름 최대 길이.
pub const MAX_ROLE_NAME_LEN: usize = 32;

/// 사용자 역할.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Role {
    /// 일반 사용자 - 가입 시 기본 역할
    #[default]
    User,
    /// 관리자 - 타인 리소스 접근 및 역할 변경 가능
    Admin,
    /// 애플리케이션 정의 역할
    Custom(String),
}

impl Role {
    /// 클레임에 기록되는 문자열.
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Custom(name) => name,
        }
    }

    /// 클레임 문자열에서 역할 파싱.
    ///
    /// 대소문자를 구분하며 (`"ADMIN"`은 관리자가 아님), 비어 있는 값만 `None`입니다.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ if s.trim().is_empty() => None,
            _ => Some(Role::Custom(s.to_string())),
        }
    }

    /// 새로 부여할 역할 이름으로 쓸 수 있는지 확인.
    ///
    /// 소문자, 숫자, `_`, `-`만 허용하며 길이는 1..=32입니다.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_ROLE_NAME_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::parse(&value).ok_or_else(|| "role must not be empty".to_string())
    }
}
