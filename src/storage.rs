use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("upload of `{key}` failed: {reason}")]
    Upload { key: String, reason: String },

    #[error("delete of `{key}` failed: {reason}")]
    Delete { key: String, reason: String },
}

/// StorageService
///
/// Contract for the external image host. Handlers only see this trait, so the
/// S3-compatible client and the in-memory mock are interchangeable.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if it does not exist. Local setup only.
    async fn ensure_bucket_exists(&self);

    /// Stores `body` under `key` and returns the public URL of the object.
    /// Blocks until the host acknowledges the write.
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError>;

    /// Removes the object stored under `key`.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// S3StorageClient
///
/// Image host client speaking the S3 API (MinIO locally, any S3-compatible
/// host in production).
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            // Path-style addressing (http://endpoint/bucket/key) for MinIO compatibility.
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self.client.create_bucket().bucket(&self.bucket_name).send().await {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        let key = sanitize_key(key);
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(%key, %content_type, "object uploaded");
        Ok(format!("{}/{}", self.public_base_url, key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = sanitize_key(key);
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(%key, "object deleted");
        Ok(())
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a key can never escape its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// MockStorageService
///
/// In-memory `StorageService` for tests. Records stored and deleted keys.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    pub uploaded: Arc<Mutex<Vec<String>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploaded.lock().map(|keys| keys.clone()).unwrap_or_default()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().map(|keys| keys.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn upload(&self, key: &str, _body: Vec<u8>, _content_type: &str) -> Result<String, StorageError> {
        let key = sanitize_key(key);
        if self.should_fail {
            return Err(StorageError::Upload {
                key,
                reason: "simulated failure".to_string(),
            });
        }
        if let Ok(mut keys) = self.uploaded.lock() {
            keys.push(key.clone());
        }
        Ok(format!("http://localhost:9000/mock-bucket/{}", key))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let key = sanitize_key(key);
        if self.should_fail {
            return Err(StorageError::Delete {
                key,
                reason: "simulated failure".to_string(),
            });
        }
        if let Ok(mut keys) = self.deleted.lock() {
            keys.push(key);
        }
        Ok(())
    }
}

/// StorageState
///
/// Shared handle to the storage service held by `AppState`.
pub type StorageState = Arc<dyn StorageService>;
