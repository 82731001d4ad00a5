//! The auth gate: the middleware deciding whether a request may reach its handler.

use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    auth::{AuthUser, verify_token},
    cookies::{SESSION_COOKIE, clear_session_cookie, read_cookie},
    error::ApiError,
};

pub const LOGIN_PAGE: &str = "/admin/login";
pub const CALLBACK_PARAM: &str = "callbackUrl";

/// How the gate treats a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Passes through with no checks.
    Public,
    /// JSON endpoint: failures answer 401.
    Api,
    /// Admin page: failures redirect to the login page.
    Page,
}

struct PublicRoute {
    // `None` allows every method.
    method: Option<&'static str>,
    prefix: &'static str,
}

/// Routes reachable without a session, matched on whole path segments.
const PUBLIC_ROUTES: &[PublicRoute] = &[
    PublicRoute { method: Some("GET"), prefix: "/api/posts/published" },
    PublicRoute { method: Some("GET"), prefix: "/api/posts/slug" },
    PublicRoute { method: Some("GET"), prefix: "/api/categories" },
    PublicRoute { method: Some("GET"), prefix: "/api/comments" },
    PublicRoute { method: None, prefix: "/api/auth/login" },
    PublicRoute { method: None, prefix: "/api/auth/logout" },
    PublicRoute { method: None, prefix: "/api/auth/set-cookie" },
    PublicRoute { method: None, prefix: "/api/contact" },
    PublicRoute { method: None, prefix: LOGIN_PAGE },
];

/// classify
///
/// Allow-list first, then API namespace, then admin pages. Anything else
/// (health, docs, the public site) is public.
pub fn classify(method: &Method, path: &str) -> RouteClass {
    // HEAD is served by the GET handler.
    let method = if *method == Method::HEAD { &Method::GET } else { method };
    let allowed = PUBLIC_ROUTES.iter().any(|route| {
        route.method.is_none_or(|m| m == method.as_str()) && matches_prefix(path, route.prefix)
    });

    if allowed {
        RouteClass::Public
    } else if matches_prefix(path, "/api") {
        RouteClass::Api
    } else if matches_prefix(path, "/admin") {
        RouteClass::Page
    } else {
        RouteClass::Public
    }
}

fn matches_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Login page URL carrying the original path and query as the callback.
pub fn login_redirect_target(path_and_query: &str) -> String {
    let callback: String = url::form_urlencoded::byte_serialize(path_and_query.as_bytes()).collect();
    format!("{LOGIN_PAGE}?{CALLBACK_PARAM}={callback}")
}

/// auth_gate
///
/// Applied to the whole router. On success the verified identity is inserted
/// into the request extensions for the `AuthUser` extractor.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let class = classify(request.method(), request.uri().path());
    if class == RouteClass::Public {
        return next.run(request).await;
    }

    let original = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let Some(token) = read_cookie(request.headers(), SESSION_COOKIE) else {
        tracing::debug!(path = %original, "no session cookie");
        return match class {
            RouteClass::Page => Redirect::temporary(&login_redirect_target(&original)).into_response(),
            _ => ApiError::unauthenticated().into_response(),
        };
    };

    match verify_token(&state.config.jwt_secret, &token) {
        Ok(claims) => {
            let user = AuthUser::from(claims);
            tracing::debug!(user_id = %user.id, role = ?user.role, "session accepted");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(err) => {
            tracing::info!(path = %original, error = %err, "session rejected");
            match class {
                RouteClass::Page => {
                    let mut response =
                        Redirect::temporary(&login_redirect_target(&original)).into_response();
                    let clear = clear_session_cookie(state.config.secure_cookies());
                    if let Ok(value) = clear.parse::<axum::http::HeaderValue>() {
                        response.headers_mut().append(header::SET_COOKIE, value);
                    }
                    response
                }
                _ => ApiError::from(err).into_response(),
            }
        }
    }
}
