//! Multipart upload extraction and per-endpoint size/type policies.

use axum::extract::Multipart;
use uuid::Uuid;

use crate::{error::ApiError, storage::sanitize_key};

const MB: usize = 1024 * 1024;

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
pub const VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

/// UploadPolicy
///
/// The media library and the avatar endpoint enforce different limits; both are
/// declared here so the difference stays visible.
#[derive(Debug, Clone, Copy)]
pub struct UploadPolicy {
    pub image_max_bytes: usize,
    /// `None` rejects videos outright.
    pub video_max_bytes: Option<usize>,
}

/// `POST /api/media/upload`: images up to 5MB, videos up to 100MB.
pub const MEDIA_POLICY: UploadPolicy = UploadPolicy {
    image_max_bytes: 5 * MB,
    video_max_bytes: Some(100 * MB),
};

/// `POST /api/users/{id}/avatar`: images only, 5MB flat.
pub const AVATAR_POLICY: UploadPolicy = UploadPolicy {
    image_max_bytes: 5 * MB,
    video_max_bytes: None,
};

impl UploadPolicy {
    /// Request body limit for routes using this policy; leaves room for multipart framing.
    pub fn body_limit(&self) -> usize {
        self.video_max_bytes.unwrap_or(0).max(self.image_max_bytes) + MB
    }

    pub fn check(&self, content_type: &str, size: usize) -> Result<(), ApiError> {
        let limit = if IMAGE_TYPES.contains(&content_type) {
            self.image_max_bytes
        } else if VIDEO_TYPES.contains(&content_type) {
            self.video_max_bytes
                .ok_or_else(|| ApiError::validation("Định dạng tệp không được hỗ trợ"))?
        } else {
            return Err(ApiError::validation("Định dạng tệp không được hỗ trợ"));
        };

        if size == 0 {
            return Err(ApiError::validation("Tệp tải lên rỗng"));
        }
        if size > limit {
            return Err(ApiError::Validation(format!(
                "Kích thước tệp vượt quá giới hạn {}MB",
                limit / MB
            )));
        }
        Ok(())
    }
}

/// A file read from the `file` field of a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// Unique object key under `prefix`, keeping the original extension.
    pub fn object_key(&self, prefix: &str) -> String {
        let extension = self
            .file_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).extension())
            .and_then(std::ffi::OsStr::to_str)
            .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_else(|| "bin".to_string());
        sanitize_key(&format!("{}/{}.{}", prefix, Uuid::new_v4(), extension))
    }
}

/// read_file_field
///
/// Pulls the `file` field out of the form and checks it against `policy`.
pub async fn read_file_field(
    multipart: &mut Multipart,
    policy: &UploadPolicy,
) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!(error = %e, "malformed multipart body");
        ApiError::validation("Dữ liệu tải lên không hợp lệ")
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to read upload body");
            ApiError::validation("Dữ liệu tải lên không hợp lệ")
        })?;

        policy.check(&content_type, bytes.len())?;

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::validation("Không có tệp nào được tải lên"))
}
