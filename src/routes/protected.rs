use crate::{
    AppState, handlers,
    upload::{AVATAR_POLICY, MEDIA_POLICY},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

/// Protected Router Module
///
/// Every request reaching these handlers carries an `AuthUser` inserted by the
/// gate. Handlers decide role and ownership themselves.
pub fn protected_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/auth/me
        .route("/api/auth/me", get(handlers::auth::me))
        // --- Posts ---
        // GET /api/posts lists every status; POST requires author or admin.
        .route(
            "/api/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        // Mutations require the owner or an admin.
        .route(
            "/api/posts/{id}",
            get(handlers::posts::get_post)
                .patch(handlers::posts::update_post)
                .put(handlers::posts::replace_post)
                .delete(handlers::posts::delete_post),
        )
        // --- Categories ---
        .route("/api/categories", post(handlers::categories::create_category))
        .route(
            "/api/categories/{id}",
            axum::routing::patch(handlers::categories::update_category)
                .delete(handlers::categories::delete_category),
        )
        // --- Users ---
        .route(
            "/api/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/api/users/{id}",
            get(handlers::users::get_user)
                .patch(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/api/users/{id}/password", put(handlers::users::change_password))
        .route(
            "/api/users/{id}/avatar",
            post(handlers::users::upload_avatar)
                .layer(DefaultBodyLimit::max(AVATAR_POLICY.body_limit()))
                .delete(handlers::users::delete_avatar),
        )
        // --- Comments ---
        .route("/api/comments", post(handlers::comments::create_comment))
        .route("/api/comments/{id}", delete(handlers::comments::delete_comment))
        // --- Media ---
        // POST /api/media/upload
        // Images up to 5MB, videos up to 100MB; the body limit leaves room for framing.
        .route(
            "/api/media/upload",
            post(handlers::media::upload_media)
                .layer(DefaultBodyLimit::max(MEDIA_POLICY.body_limit())),
        )
        // DELETE /api/media/{*key}
        // The key may contain slashes (`media/<uuid>.png`).
        .route("/api/media/{*key}", delete(handlers::media::delete_media))
        // GET /api/stats
        .route("/api/stats", get(handlers::stats::get_stats))
}
