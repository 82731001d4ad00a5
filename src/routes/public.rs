use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Everything here is on the gate's allow-list. Keep the two in step: a route
/// added here without an allow-list entry answers 401.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for the load balancer.
        .route("/health", get(|| async { "ok" }))
        // POST /api/auth/login | /logout | /set-cookie
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/set-cookie", post(handlers::auth::set_session_cookie))
        // GET /api/posts/published?page=&limit=&search=&categoryId=
        .route("/api/posts/published", get(handlers::posts::list_published_posts))
        // GET /api/posts/slug/{slug}
        // Published posts only; increments the view counter.
        .route("/api/posts/slug/{slug}", get(handlers::posts::get_post_by_slug))
        .route("/api/categories", get(handlers::categories::list_categories))
        .route("/api/categories/{id}", get(handlers::categories::get_category))
        // GET /api/comments?postId=
        .route("/api/comments", get(handlers::comments::list_comments))
        // POST /api/contact
        // Logged only; no mail transport.
        .route("/api/contact", post(handlers::contact::submit_contact))
}
