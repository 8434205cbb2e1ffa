//! Client-side input validation. Runs before any network traffic.

#[cfg(test)]
#[path = "validate_test.rs"]
mod validate_test;

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ClientError;
use crate::net::types::{LoginRequest, RegisterRequest};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

// Vietnamese mobile numbers: `0` or `+84`, a carrier digit, eight more digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(0|\+84)[3|5|7|8|9][0-9]{8}$").expect("phone pattern compiles"));

#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Whitespace inside the number is ignored.
#[must_use]
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}

fn invalid(field: &'static str, message: &str) -> ClientError {
    ClientError::Validation { field, message: message.to_owned() }
}

/// # Errors
///
/// [`ClientError::Validation`] naming the first offending field.
pub fn validate_login(credentials: &LoginRequest) -> Result<(), ClientError> {
    if credentials.email.trim().is_empty() || credentials.password.is_empty() {
        return Err(invalid("credentials", "Vui lòng nhập email và mật khẩu"));
    }
    if !is_valid_email(credentials.email.trim()) {
        return Err(invalid("email", "Email không hợp lệ"));
    }
    Ok(())
}

/// # Errors
///
/// [`ClientError::Validation`] naming the first offending field.
pub fn validate_registration(request: &RegisterRequest, confirm_password: &str) -> Result<(), ClientError> {
    if request.full_name.trim().is_empty() {
        return Err(invalid("fullName", "Vui lòng nhập họ tên"));
    }
    if !is_valid_email(request.email.trim()) {
        return Err(invalid("email", "Email không hợp lệ"));
    }
    if let Some(phone) = request.phone.as_deref().filter(|p| !p.trim().is_empty())
        && !is_valid_phone(phone)
    {
        return Err(invalid("phone", "Số điện thoại không hợp lệ"));
    }
    if request.password.is_empty() {
        return Err(invalid("password", "Vui lòng nhập mật khẩu"));
    }
    if request.password != confirm_password {
        return Err(invalid("confirmPassword", "Mật khẩu xác nhận không khớp"));
    }
    Ok(())
}
