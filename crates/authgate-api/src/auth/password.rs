//! 비밀번호 형식 검증.
//!
//! 비밀번호 저장과 대조는 Identity Provider가 담당하므로, 게이트웨이는
//! 가입 시 형식만 확인합니다.

use validator::ValidationError;

/// 가입 비밀번호 최소 길이.
pub const REGISTER_MIN_LEN: usize = 8;

/// 로그인 비밀번호 최소 길이.
pub const LOGIN_MIN_LEN: u64 = 6;

/// 비밀번호 강도 검증.
///
/// # 요구사항
///
/// - 최소 8자 이상
/// - 소문자, 대문자, 숫자 각각 1개 이상
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < REGISTER_MIN_LEN {
        return Err("Password must be at least 8 characters long");
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if !(has_lower && has_upper && has_digit) {
        return Err(
            "Password must contain at least one lowercase letter, one uppercase letter, and one number",
        );
    }

    Ok(())
}

/// `validator`용 커스텀 검증 함수.
pub fn strong_password(password: &str) -> Result<(), ValidationError> {
    validate_password_strength(password).map_err(|message| {
        let mut error = ValidationError::new("password_strength");
        error.message = Some(message.into());
        error
    })
}
