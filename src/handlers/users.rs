use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use super::ListParams;
use crate::{
    AppState,
    auth::{AuthUser, authorize},
    error::{ApiError, ApiResult},
    models::{
        ChangePasswordRequest, CreateUserRequest, MessageResponse, NewUser, Paginated, Role,
        UpdateUserRequest, User,
    },
    password::{hash_password, verify_password},
    upload::{AVATAR_POLICY, read_file_field},
};

const MSG_USER_NOT_FOUND: &str = "Không tìm thấy người dùng";

async fn load_user(state: &AppState, id: Uuid) -> ApiResult<User> {
    state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::not_found(MSG_USER_NOT_FOUND))
}

/// list_users
///
/// [Admin Route] Paginated, searchable by name or email.
#[utoipa::path(
    get,
    path = "/api/users",
    params(ListParams),
    responses(
        (status = 200, description = "Users", body = Paginated<User>),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users(
    caller: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Paginated<User>>> {
    authorize(&caller, None, Role::Admin)?;
    let filter = params.user_filter();
    let (items, total) = state.repo.list_users(&filter).await?;
    Ok(Json(Paginated::new(items, filter.page, filter.limit, total)))
}

/// create_user
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = User),
        (status = 400, description = "Invalid payload or email taken"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    authorize(&caller, None, Role::Admin)?;
    payload.validate()?;

    let email = payload.email.trim().to_lowercase();
    if state.repo.get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::validation("Email đã được sử dụng"));
    }

    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name,
            email,
            password_hash: Some(hash_password(&payload.password)?),
            role: payload.role,
            bio: payload.bio,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = ?user.role, created_by = %caller.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// get_user
///
/// [Authenticated Route] Self or admin.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = User),
        (status = 403, description = "Neither self nor admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    authorize(&caller, Some(id), Role::Admin)?;
    Ok(Json(load_user(&state, id).await?))
}

/// update_user
///
/// [Authenticated Route] Self or admin. Only an admin may change `email` or `role`.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = User),
        (status = 400, description = "Invalid payload or email taken"),
        (status = 403, description = "Not allowed"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    authorize(&caller, Some(id), Role::Admin)?;
    payload.validate()?;

    let current = load_user(&state, id).await?;

    if let Some(email) = payload.email.as_mut() {
        *email = email.trim().to_lowercase();
    }
    let email_changes = payload.email.as_deref().is_some_and(|e| e != current.email);
    let role_changes = payload.role.is_some_and(|r| r != current.role);
    if (email_changes || role_changes) && !caller.is_admin() {
        tracing::warn!(user_id = %caller.id, target = %id, "non-admin tried to change email or role");
        return Err(ApiError::forbidden());
    }

    if let Some(email) = payload.email.as_deref().filter(|_| email_changes) {
        if let Some(existing) = state.repo.get_user_by_email(email).await? {
            if existing.id != id {
                return Err(ApiError::validation("Email đã được sử dụng"));
            }
        }
    }

    state
        .repo
        .update_user(id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_USER_NOT_FOUND))
}

/// delete_user
///
/// [Admin Route] An admin cannot delete their own account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Cannot delete own account"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    authorize(&caller, None, Role::Admin)?;
    if caller.id == id {
        return Err(ApiError::validation("Không thể xóa tài khoản của chính bạn"));
    }

    if state.repo.delete_user(id).await? {
        tracing::info!(user_id = %id, deleted_by = %caller.id, "user deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(MSG_USER_NOT_FOUND))
    }
}

/// change_password
///
/// [Authenticated Route] Self or admin. The current password must match even for
/// admins; on mismatch the stored hash is left untouched.
#[utoipa::path(
    put,
    path = "/api/users/{id}/password",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Changed", body = MessageResponse),
        (status = 400, description = "Wrong current password or password not set"),
        (status = 403, description = "Neither self nor admin")
    )
)]
pub async fn change_password(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    authorize(&caller, Some(id), Role::Admin)?;
    payload.validate()?;

    let user = load_user(&state, id).await?;
    if !verify_password(&payload.current_password, user.password.as_deref())? {
        tracing::warn!(user_id = %id, "password change with wrong current password");
        return Err(ApiError::validation("Mật khẩu hiện tại không đúng"));
    }

    let hash = hash_password(&payload.new_password)?;
    if !state.repo.update_password(id, &hash).await? {
        return Err(ApiError::not_found(MSG_USER_NOT_FOUND));
    }

    tracing::info!(user_id = %id, changed_by = %caller.id, "password changed");
    Ok(Json(MessageResponse::new("Đổi mật khẩu thành công")))
}

/// upload_avatar
///
/// [Authenticated Route] Self or admin. Multipart `file`, images only, 5MB.
#[utoipa::path(
    post,
    path = "/api/users/{id}/avatar",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body(content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 200, description = "Avatar stored", body = User),
        (status = 400, description = "Missing, oversized or unsupported file"),
        (status = 403, description = "Neither self nor admin")
    )
)]
pub async fn upload_avatar(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> ApiResult<Json<User>> {
    authorize(&caller, Some(id), Role::Admin)?;
    load_user(&state, id).await?;

    let file = read_file_field(&mut multipart, &AVATAR_POLICY).await?;
    let key = file.object_key(&format!("avatars/{}", id));
    let url = state.storage.upload(&key, file.bytes, &file.content_type).await?;

    tracing::info!(user_id = %id, key = %key, "avatar uploaded");
    state
        .repo
        .set_avatar(id, Some(url))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_USER_NOT_FOUND))
}

/// delete_avatar
///
/// [Authenticated Route] Self or admin. Clears the avatar reference; the stored
/// object is left on the image host.
#[utoipa::path(
    delete,
    path = "/api/users/{id}/avatar",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Avatar removed", body = User),
        (status = 403, description = "Neither self nor admin"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_avatar(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    authorize(&caller, Some(id), Role::Admin)?;

    state
        .repo
        .set_avatar(id, None)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(MSG_USER_NOT_FOUND))
}
