use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use super::ListParams;
use crate::{
    AppState,
    auth::{AuthUser, authorize},
    error::{ApiError, ApiResult},
    models::{CreatePostRequest, Paginated, Post, PostStatus, Role, UpdatePostRequest},
};

const MSG_POST_NOT_FOUND: &str = "Không tìm thấy bài viết";
const MSG_SLUG_TAKEN: &str = "Slug đã tồn tại";

/// Fails with 400 when `slug` belongs to a post other than `except`.
async fn ensure_slug_available(state: &AppState, slug: &str, except: Option<Uuid>) -> ApiResult<()> {
    match state.repo.get_post_by_slug(slug).await? {
        Some(existing) if Some(existing.id) != except => {
            Err(ApiError::validation(MSG_SLUG_TAKEN))
        }
        _ => Ok(()),
    }
}

async fn ensure_category_exists(state: &AppState, category_id: Option<Uuid>) -> ApiResult<()> {
    if let Some(id) = category_id {
        if state.repo.get_category(id).await?.is_none() {
            return Err(ApiError::validation("Danh mục không tồn tại"));
        }
    }
    Ok(())
}

async fn load_post(state: &AppState, id: Uuid) -> ApiResult<Post> {
    state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found(MSG_POST_NOT_FOUND))
}

/// list_posts
///
/// [Authenticated Route] Admin listing across all statuses with pagination,
/// search, status and category filters.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(ListParams),
    responses((status = 200, description = "Posts", body = Paginated<Post>))
)]
pub async fn list_posts(
    _caller: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Paginated<Post>>> {
    let filter = params.post_filter();
    let (items, total) = state.repo.list_posts(&filter).await?;
    Ok(Json(Paginated::new(items, filter.page, filter.limit, total)))
}

/// list_published_posts
///
/// [Public Route] Same listing restricted to published posts, whatever `status`
/// the caller passes.
#[utoipa::path(
    get,
    path = "/api/posts/published",
    params(ListParams),
    responses((status = 200, description = "Published posts", body = Paginated<Post>))
)]
pub async fn list_published_posts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Paginated<Post>>> {
    let mut filter = params.post_filter();
    filter.status = Some(PostStatus::Published);
    let (items, total) = state.repo.list_posts(&filter).await?;
    Ok(Json(Paginated::new(items, filter.page, filter.limit, total)))
}

/// get_post_by_slug
///
/// [Public Route] A published post by slug. Each read increments `viewCount`;
/// under concurrent reads the count may be approximate.
#[utoipa::path(
    get,
    path = "/api/posts/slug/{slug}",
    params(("slug" = String, Path, description = "Post slug")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not found or not published")
    )
)]
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Post>> {
    let post = state
        .repo
        .get_post_by_slug(&slug)
        .await?
        .filter(|p| p.status == PostStatus::Published)
        .ok_or_else(|| ApiError::not_found(MSG_POST_NOT_FOUND))?;

    let post = state.repo.record_post_view(post.id).await?.unwrap_or(post);
    Ok(Json(post))
}

/// get_post
///
/// [Authenticated Route] Any post by id, drafts included.
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_post(
    _caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Post>> {
    Ok(Json(load_post(&state, id).await?))
}

/// create_post
///
/// [Authenticated Route] Authors and admins only. The author is always the caller.
/// A taken slug is rejected before anything is written.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Invalid payload or slug taken"),
        (status = 403, description = "Readers cannot write posts")
    )
)]
pub async fn create_post(
    caller: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    authorize(&caller, None, Role::Author)?;
    payload.validate()?;
    ensure_slug_available(&state, &payload.slug, None).await?;
    ensure_category_exists(&state, payload.category_id).await?;

    let post = state.repo.create_post(payload, caller.id).await?;
    tracing::info!(post_id = %post.id, slug = %post.slug, author_id = %caller.id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// update_post
///
/// [Authenticated Route] Partial update by the owner or an admin.
#[utoipa::path(
    patch,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_post(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> ApiResult<Json<Post>> {
    let post = load_post(&state, id).await?;
    authorize(&caller, Some(post.author_id), Role::Admin)?;
    payload.validate()?;
    if let Some(slug) = payload.slug.as_deref() {
        ensure_slug_available(&state, slug, Some(id)).await?;
    }
    ensure_category_exists(&state, payload.category_id).await?;

    state
        .repo
        .update_post(id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_POST_NOT_FOUND))
}

/// replace_post
///
/// [Authenticated Route] Full replacement by the owner or an admin; optional
/// fields left out are cleared.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = CreatePostRequest,
    responses(
        (status = 200, description = "Replaced", body = Post),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn replace_post(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreatePostRequest>,
) -> ApiResult<Json<Post>> {
    let post = load_post(&state, id).await?;
    authorize(&caller, Some(post.author_id), Role::Admin)?;
    payload.validate()?;
    ensure_slug_available(&state, &payload.slug, Some(id)).await?;
    ensure_category_exists(&state, payload.category_id).await?;

    state
        .repo
        .replace_post(id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_POST_NOT_FOUND))
}

/// delete_post
///
/// [Authenticated Route] Owner or admin.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_post(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let post = load_post(&state, id).await?;
    authorize(&caller, Some(post.author_id), Role::Admin)?;

    if state.repo.delete_post(id).await? {
        tracing::info!(post_id = %id, user_id = %caller.id, "post deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(MSG_POST_NOT_FOUND))
    }
}
