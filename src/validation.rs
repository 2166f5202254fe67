//! Input rules shared by registration and the web directory.

use url::Url;

use crate::error::AppError;

pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 15;

/// Accepts `local@domain.tld`: one `@`, no whitespace, a dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Password rule: 8 to 15 characters with at least one digit and one
/// non-alphanumeric character.
pub fn check_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&len) {
        return Err(AppError::validation(format!(
            "password must be between {PASSWORD_MIN_LEN} and {PASSWORD_MAX_LEN} characters"
        )));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("password must contain a digit"));
    }
    if password.chars().all(char::is_alphanumeric) {
        return Err(AppError::validation(
            "password must contain a special character",
        ));
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// normalize_web_url
///
/// Directory URLs may be entered without a scheme (`www.example.gov`); those are
/// read as https. The result must be http(s) with a dotted host.
pub fn normalize_web_url(field: &str, raw: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let invalid = || AppError::validation(format!("{field} must be a valid website URL"));
    let url = Url::parse(&candidate).map_err(|_| invalid())?;

    let dotted_host = url
        .host_str()
        .is_some_and(|host| host.contains('.') && !host.starts_with('.') && !host.ends_with('.'));
    if !matches!(url.scheme(), "http" | "https") || !dotted_host {
        return Err(invalid());
    }
    Ok(url.to_string())
}
