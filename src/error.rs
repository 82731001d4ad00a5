use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use validator::ValidationErrors;

use crate::{auth::AuthError, password::PasswordError, storage::StorageError};

pub const MSG_UNAUTHENTICATED: &str = "Bạn cần đăng nhập để thực hiện thao tác này";
pub const MSG_INVALID_SESSION: &str = "Phiên đăng nhập không hợp lệ hoặc đã hết hạn";
pub const MSG_FORBIDDEN: &str = "Bạn không có quyền thực hiện thao tác này";
pub const MSG_INTERNAL: &str = "Đã xảy ra lỗi máy chủ, vui lòng thử lại sau";
pub const MSG_DUPLICATE: &str = "Dữ liệu đã tồn tại";
pub const MSG_INVALID_INPUT: &str = "Dữ liệu không hợp lệ";

/// ApiError
///
/// Every handler failure ends up here. The HTTP status is the only machine-readable
/// signal; the body is `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized(MSG_UNAUTHENTICATED.to_string())
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden(MSG_FORBIDDEN.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        ApiError::NotFound(message.to_string())
    }

    pub fn validation(message: &str) -> Self {
        ApiError::Validation(message.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(err) if is_unique_violation(err) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) | ApiError::Storage(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg) => msg.clone(),
            ApiError::Database(err) if is_unique_violation(err) => MSG_DUPLICATE.to_string(),
            other => {
                tracing::error!(error = %other, "request failed");
                MSG_INTERNAL.to_string()
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| MSG_INVALID_INPUT.to_string());
        ApiError::Validation(message)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Invalid(reason) => {
                tracing::debug!(%reason, "session token rejected");
                ApiError::Unauthorized(MSG_INVALID_SESSION.to_string())
            }
            AuthError::Signing(reason) => ApiError::Internal(reason),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Missing => {
                ApiError::Validation("Tài khoản chưa được thiết lập mật khẩu".to_string())
            }
            PasswordError::Hash(e) => ApiError::Internal(e.to_string()),
        }
    }
}
