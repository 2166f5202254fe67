use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

/// Presigned upload URLs expire after 10 minutes.
const PRESIGN_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("url does not reference a managed asset: {0}")]
    ForeignUrl(String),
    #[error("storage backend failure: {0}")]
    Backend(String),
}

// 1. StorageService Contract
/// StorageService
///
/// The Asset Store contract. Complaint images are uploaded by the client
/// straight to the bucket through a presigned URL; the API only ever records
/// and releases references.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Provisions the bucket in Local (MinIO) setups. No-op in production.
    async fn ensure_bucket_exists(&self);

    /// Generates a temporary signed URL allowing one direct PUT of `key`,
    /// constrained to `content_type`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError>;

    /// The durable reference stored on a record once `key` has been uploaded.
    fn object_url(&self, key: &str) -> String;

    /// Deletes the asset an `object_url` points to.
    async fn release(&self, url: &str) -> Result<(), StorageError>;
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments
/// from a key to prevent path traversal.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Recovers the object key from a path-style URL under `base`.
pub fn key_from_url(base: &str, url: &str) -> Result<String, StorageError> {
    let prefix = format!("{}/", base.trim_end_matches('/'));
    url.strip_prefix(&prefix)
        .map(|key| key.split(['?', '#']).next().unwrap_or_default())
        .map(sanitize_key)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// Uses the AWS SDK against any S3-compatible endpoint. Path-style addressing
/// is forced so MinIO and gateway endpoints resolve `endpoint/bucket/key`.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    // Path-style base of every object URL: `{endpoint}/{bucket}`.
    public_base: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base: format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// CreateBucket is idempotent, so this is safe to call on every startup.
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(error = %e, bucket = %self.bucket_name, "create_bucket skipped");
        }
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(PRESIGN_TTL)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(sanitize_key(key))
            // The upload must carry exactly this Content-Type.
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, sanitize_key(key))
    }

    async fn release(&self, url: &str) -> Result<(), StorageError> {
        let key = key_from_url(&self.public_base, url)?;
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        tracing::debug!(%key, "released asset");
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory `StorageService` for tests. Clones share the release log.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    released: Arc<Mutex<Vec<String>>>,
}

const MOCK_BASE: &str = "http://localhost:9000/mock-bucket";

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

    /// URLs passed to `release`, in call order (including failed attempts).
    pub async fn released(&self) -> Vec<String> {
        self.released.lock().await.clone()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Backend(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        Ok(format!("{}/{}?signature=fake", MOCK_BASE, sanitize_key(key)))
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", MOCK_BASE, sanitize_key(key))
    }

    async fn release(&self, url: &str) -> Result<(), StorageError> {
        self.released.lock().await.push(url.to_string());
        if self.should_fail {
            return Err(StorageError::Backend(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        key_from_url(MOCK_BASE, url).map(|_| ())
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
