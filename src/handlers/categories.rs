use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, authorize},
    error::{ApiError, ApiResult},
    models::{Category, CreateCategoryRequest, Role, UpdateCategoryRequest},
};

const MSG_CATEGORY_NOT_FOUND: &str = "Không tìm thấy danh mục";

async fn ensure_slug_available(state: &AppState, slug: &str, except: Option<Uuid>) -> ApiResult<()> {
    match state.repo.get_category_by_slug(slug).await? {
        Some(existing) if Some(existing.id) != except => Err(ApiError::validation("Slug đã tồn tại")),
        _ => Ok(()),
    }
}

/// list_categories
///
/// [Public Route] Every category with its post count, ordered by name.
#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = Category),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Category>> {
    state
        .repo
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_CATEGORY_NOT_FOUND))
}

/// create_category
///
/// [Authenticated Route] Authors and admins.
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Invalid payload or slug taken"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn create_category(
    caller: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    authorize(&caller, None, Role::Author)?;
    payload.validate()?;
    ensure_slug_available(&state, &payload.slug, None).await?;

    let category = state.repo.create_category(payload).await?;
    tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_category(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> ApiResult<Json<Category>> {
    authorize(&caller, None, Role::Author)?;
    payload.validate()?;
    if let Some(slug) = payload.slug.as_deref() {
        ensure_slug_available(&state, slug, Some(id)).await?;
    }

    state
        .repo
        .update_category(id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_CATEGORY_NOT_FOUND))
}

/// delete_category
///
/// [Authenticated Route] Admin only. Posts in the category are kept and lose
/// their category.
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_category(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize(&caller, None, Role::Admin)?;

    if state.repo.delete_category(id).await? {
        tracing::info!(category_id = %id, user_id = %caller.id, "category deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(MSG_CATEGORY_NOT_FOUND))
    }
}
