use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Pages Router
///
/// `/admin/login` is on the gate's allow-list; every other `/admin` path is
/// redirected to it when the session is missing or invalid.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", get(handlers::pages::login_page))
        .route("/admin", get(handlers::pages::admin_shell))
        .route("/admin/{*path}", get(handlers::pages::admin_shell))
}
