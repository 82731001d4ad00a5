use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services.
pub mod auth;
pub mod config;
pub mod cookies;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod seed;
pub mod storage;
pub mod upload;

// Routing, grouped by how the gate treats each route.
pub mod routes;
use routes::{pages, protected, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageService, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json` and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::logout, handlers::auth::set_session_cookie,
        handlers::auth::me,
        handlers::posts::list_posts, handlers::posts::list_published_posts,
        handlers::posts::get_post_by_slug, handlers::posts::get_post, handlers::posts::create_post,
        handlers::posts::update_post, handlers::posts::replace_post, handlers::posts::delete_post,
        handlers::categories::list_categories, handlers::categories::get_category,
        handlers::categories::create_category, handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::users::list_users, handlers::users::create_user, handlers::users::get_user,
        handlers::users::update_user, handlers::users::delete_user, handlers::users::change_password,
        handlers::users::upload_avatar, handlers::users::delete_avatar,
        handlers::comments::list_comments, handlers::comments::create_comment,
        handlers::comments::delete_comment,
        handlers::media::upload_media, handlers::media::delete_media,
        handlers::contact::submit_contact,
        handlers::stats::get_stats,
    ),
    components(
        schemas(
            models::Role, models::PostStatus, models::User, models::Post, models::Category,
            models::Comment, models::PaginationMeta, models::LoginRequest, models::LoginResponse,
            models::SetCookieRequest, models::MessageResponse, models::CreatePostRequest,
            models::UpdatePostRequest, models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreateUserRequest, models::UpdateUserRequest, models::ChangePasswordRequest,
            models::CreateCommentRequest, models::ContactRequest, models::UploadResponse,
            models::DashboardStats,
        )
    ),
    tags(
        (name = "portfolio-cms", description = "Portfolio and blog CMS API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared by every handler and by the auth gate. Cloning is cheap; the
/// repository and storage are behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Persistence handle. Postgres in production, in-memory in tests.
    pub repo: RepositoryState,
    /// Image host.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Merges the route groups, puts the auth gate in front of all of them and adds
/// the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(protected::protected_routes())
        .merge(pages::page_routes())
        // The gate decides per request (allow-list, API, admin page), so it wraps
        // every route instead of a sub-router.
        .layer(middleware::from_fn_with_state(state.clone(), gate::auth_gate))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, tagged with its `x-request-id` so every log line of
/// the request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
