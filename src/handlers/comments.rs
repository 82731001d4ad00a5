use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, authorize, can_access},
    error::{ApiError, ApiResult},
    models::{Comment, CreateCommentRequest, PostStatus, Role},
};

const MSG_POST_NOT_FOUND: &str = "Không tìm thấy bài viết";

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CommentQuery {
    pub post_id: Uuid,
}

/// list_comments
///
/// [Public Route] Comments of one published post, oldest first, with the
/// author's name. Drafts answer 404 like missing posts.
#[utoipa::path(
    get,
    path = "/api/comments",
    params(CommentQuery),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Post not found or not published")
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Query(query): Query<CommentQuery>,
) -> ApiResult<Json<Vec<Comment>>> {
    match state.repo.get_post(query.post_id).await? {
        Some(post) if post.status == PostStatus::Published => {}
        _ => return Err(ApiError::not_found(MSG_POST_NOT_FOUND)),
    }
    Ok(Json(state.repo.list_comments(query.post_id).await?))
}

/// create_comment
///
/// [Authenticated Route] Any logged-in user may comment on a published post.
/// Drafts take comments only from their author or an admin.
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Created", body = Comment),
        (status = 400, description = "Empty content"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn create_comment(
    caller: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    payload.validate()?;
    let post = state
        .repo
        .get_post(payload.post_id)
        .await?
        .filter(|post| {
            post.status == PostStatus::Published
                || can_access(&caller, Some(post.author_id), Role::Admin)
        })
        .ok_or_else(|| ApiError::not_found(MSG_POST_NOT_FOUND))?;

    let comment = state
        .repo
        .create_comment(post.id, caller.id, payload.content)
        .await?;
    tracing::info!(comment_id = %comment.id, post_id = %comment.post_id, user_id = %caller.id, "comment created");
    Ok((StatusCode::CREATED, Json(comment)))
}

/// delete_comment
///
/// [Authenticated Route] The comment's author or an admin.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_comment(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let comment = state
        .repo
        .get_comment(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Không tìm thấy bình luận"))?;
    authorize(&caller, Some(comment.user_id), Role::Admin)?;

    state.repo.delete_comment(id).await?;
    tracing::info!(comment_id = %id, user_id = %caller.id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
