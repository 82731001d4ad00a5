use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::{AuthUser, authorize},
    error::{ApiError, ApiResult},
    models::{Role, UploadResponse},
    storage::sanitize_key,
    upload::{MEDIA_POLICY, read_file_field},
};

/// upload_media
///
/// [Authenticated Route] Authors and admins. Multipart `file`; images up to 5MB,
/// videos up to 100MB. Responds once the image host has the object.
#[utoipa::path(
    post,
    path = "/api/media/upload",
    request_body(content_type = "multipart/form-data", description = "Form with a `file` field"),
    responses(
        (status = 201, description = "Uploaded", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unsupported file"),
        (status = 500, description = "Image host failure")
    )
)]
pub async fn upload_media(
    caller: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    authorize(&caller, None, Role::Author)?;

    let file = read_file_field(&mut multipart, &MEDIA_POLICY).await?;
    let key = file.object_key("media");
    let size = file.bytes.len();
    let content_type = file.content_type.clone();

    let url = state.storage.upload(&key, file.bytes, &content_type).await?;
    tracing::info!(key = %key, size, content_type = %content_type, user_id = %caller.id, "media uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            key,
            content_type,
            size,
        }),
    ))
}

/// delete_media
///
/// [Admin Route] Removes an object by the key returned from the upload.
#[utoipa::path(
    delete,
    path = "/api/media/{key}",
    params(("key" = String, Path, description = "Object key, may contain slashes")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn delete_media(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<StatusCode> {
    authorize(&caller, None, Role::Admin)?;

    let key = sanitize_key(&key);
    if key.is_empty() {
        return Err(ApiError::validation("Khóa tệp không hợp lệ"));
    }

    state.storage.delete(&key).await?;
    tracing::info!(key = %key, user_id = %caller.id, "media deleted");
    Ok(StatusCode::NO_CONTENT)
}
