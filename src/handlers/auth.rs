use axum::{
    Json,
    extract::State,
    http::{HeaderName, HeaderValue},
    response::AppendHeaders,
};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, issue_token, verify_token},
    cookies::{
        clear_remember_cookies, clear_session_cookie, remember_cookies, session_cookie,
        set_cookie_header,
    },
    error::{ApiError, ApiResult},
    models::{LoginRequest, LoginResponse, MessageResponse, SetCookieRequest, User},
    password::{PasswordError, verify_password},
};

/// Same message for unknown email and wrong password.
pub const MSG_BAD_CREDENTIALS: &str = "Email hoặc mật khẩu không đúng";

type CookieHeaders = AppendHeaders<Vec<(HeaderName, HeaderValue)>>;

/// login
///
/// [Public Route] Verifies email and password, issues the session token and sets
/// the `admin-token` cookie. With `remember: true` the remember-me cookies are
/// set as well; otherwise they are cleared.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Wrong email or password")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<(CookieHeaders, Json<LoginResponse>)> {
    payload.validate()?;

    let user = state
        .repo
        .get_user_by_email(payload.email.trim())
        .await?
        .ok_or_else(|| {
            tracing::warn!(email = %payload.email, "login for unknown email");
            ApiError::Unauthorized(MSG_BAD_CREDENTIALS.to_string())
        })?;

    match verify_password(&payload.password, user.password.as_deref()) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(ApiError::Unauthorized(MSG_BAD_CREDENTIALS.to_string()));
        }
        Err(PasswordError::Missing) => {
            tracing::warn!(user_id = %user.id, "login for account without password");
            return Err(ApiError::Unauthorized(MSG_BAD_CREDENTIALS.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    let token = issue_token(&state.config.jwt_secret, &user)?;
    let secure = state.config.secure_cookies();

    let mut cookies = vec![set_cookie_header(session_cookie(&token, secure))?];
    let remember = if payload.remember {
        remember_cookies(&user.email, secure)
    } else {
        clear_remember_cookies(secure)
    };
    for cookie in remember {
        cookies.push(set_cookie_header(cookie)?);
    }

    tracing::info!(user_id = %user.id, role = ?user.role, "user logged in");
    Ok((AppendHeaders(cookies), Json(LoginResponse { token, user })))
}

/// logout
///
/// [Public Route] Clears the session cookie. The token itself stays valid until
/// it expires; there is no revocation list.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(State(state): State<AppState>) -> ApiResult<(CookieHeaders, Json<MessageResponse>)> {
    let cookie = set_cookie_header(clear_session_cookie(state.config.secure_cookies()))?;
    Ok((
        AppendHeaders(vec![cookie]),
        Json(MessageResponse::new("Đăng xuất thành công")),
    ))
}

/// set_session_cookie
///
/// [Public Route] Stores an already issued token as the session cookie after
/// verifying it.
#[utoipa::path(
    post,
    path = "/api/auth/set-cookie",
    request_body = SetCookieRequest,
    responses(
        (status = 200, description = "Cookie set", body = MessageResponse),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn set_session_cookie(
    State(state): State<AppState>,
    Json(payload): Json<SetCookieRequest>,
) -> ApiResult<(CookieHeaders, Json<MessageResponse>)> {
    let claims = verify_token(&state.config.jwt_secret, &payload.token)?;
    let cookie = set_cookie_header(session_cookie(&payload.token, state.config.secure_cookies()))?;
    tracing::debug!(user_id = %claims.sub, "session cookie set from token");
    Ok((
        AppendHeaders(vec![cookie]),
        Json(MessageResponse::new("Đã thiết lập phiên đăng nhập")),
    ))
}

/// me
///
/// [Authenticated Route] The current user's record.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me(caller: AuthUser, State(state): State<AppState>) -> ApiResult<Json<User>> {
    state
        .repo
        .get_user(caller.id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Không tìm thấy người dùng"))
}
