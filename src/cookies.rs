//! Session and remember-me cookies.

use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

use crate::{auth::TOKEN_TTL_SECS, error::ApiError};

pub const SESSION_COOKIE: &str = "admin-token";
pub const REMEMBER_EMAIL_COOKIE: &str = "remember-email";
pub const REMEMBER_FLAG_COOKIE: &str = "remember-me";

/// Remember-me cookies live for 30 days.
pub const REMEMBER_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Returns the value of cookie `name` from the request's `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// `admin-token`: http-only, same-site lax, whole site, seven days.
pub fn session_cookie(token: &str, secure: bool) -> String {
    build(SESSION_COOKIE, token, TOKEN_TTL_SECS, true, secure)
}

pub fn clear_session_cookie(secure: bool) -> String {
    build(SESSION_COOKIE, "", 0, true, secure)
}

/// The two login-form pre-fill cookies. Readable by scripts on purpose.
pub fn remember_cookies(email: &str, secure: bool) -> [String; 2] {
    [
        build(REMEMBER_EMAIL_COOKIE, email, REMEMBER_TTL_SECS, false, secure),
        build(REMEMBER_FLAG_COOKIE, "true", REMEMBER_TTL_SECS, false, secure),
    ]
}

pub fn clear_remember_cookies(secure: bool) -> [String; 2] {
    [
        build(REMEMBER_EMAIL_COOKIE, "", 0, false, secure),
        build(REMEMBER_FLAG_COOKIE, "", 0, false, secure),
    ]
}

/// Wraps a cookie string as a `Set-Cookie` header pair.
pub fn set_cookie_header(cookie: String) -> Result<(HeaderName, HeaderValue), ApiError> {
    let value = HeaderValue::try_from(cookie)
        .map_err(|e| ApiError::Internal(format!("invalid cookie value: {e}")))?;
    Ok((header::SET_COOKIE, value))
}

fn build(name: &str, value: &str, max_age: i64, http_only: bool, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; SameSite=Lax");
    if http_only {
        cookie.push_str("; HttpOnly");
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}
