//! MinIO/S3-compatible storage client
//!
//! Uploaded files are kept under `<prefix>/<uuid>/<filename>`; that key is what
//! an uploaded record stores as its `file_path`.
//!
//! Uses rust-s3 crate for lightweight S3 operations.

use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::core::error::AppError;

/// Longest filename segment kept in an object key
const MAX_FILENAME_LEN: usize = 200;

/// MinIO/S3-compatible storage client
pub struct MinIOClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    upload_prefix: String,
}

impl MinIOClient {
    /// Build the client. No network traffic happens here; call
    /// [`MinIOClient::ensure_bucket_exists`] once at startup.
    pub fn new(config: &StorageConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create MinIO credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create MinIO bucket: {}", e)))?;

        // MinIO expects http://endpoint/bucket rather than http://bucket.endpoint
        bucket.set_path_style();

        Ok(Self {
            bucket,
            region,
            credentials,
            upload_prefix: config.upload_prefix.clone(),
        })
    }

    /// Create the bucket unless it is already there
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let name = self.bucket.name();
        let result = Bucket::create_with_path_style(
            &name,
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await;

        match result {
            Ok(_) => {
                info!("Bucket '{}' created successfully", name);
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", name);
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        name, e
                    );
                }
                Ok(())
            }
        }
    }

    /// Fresh object key for an uploaded file: `<prefix>/<uuid>/<sanitized filename>`
    pub fn generate_key(&self, filename: &str) -> String {
        let name = sanitize_filename(filename);
        if self.upload_prefix.is_empty() {
            format!("{}/{}", Uuid::new_v4(), name)
        } else {
            format!("{}/{}/{}", self.upload_prefix, Uuid::new_v4(), name)
        }
    }

    /// Upload bytes under `key`
    pub async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), AppError> {
        self.bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!(
            "Uploaded file '{}' ({} bytes) to bucket '{}'",
            key,
            data.len(),
            self.bucket.name()
        );
        Ok(())
    }

    /// Download the bytes stored under `key`
    pub async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let response = self.bucket.get_object(key).await.map_err(|e| {
            let error_str = e.to_string();
            if error_str.contains("404") || error_str.contains("NoSuchKey") {
                AppError::NotFound(format!("Stored file '{}' not found", key))
            } else {
                AppError::Internal(format!("Failed to download file '{}': {}", key, e))
            }
        })?;

        Ok(response.to_vec())
    }

    /// Delete the object under `key`
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete file '{}': {}", key, e)))?;

        debug!("Deleted file '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    /// Delete that only logs on failure; used when cleaning up after an aborted upload
    /// or after the owning record is already gone
    pub async fn delete_quietly(&self, key: &str) {
        if let Err(e) = self.delete(key).await {
            warn!("Failed to remove stored file '{}': {}", key, e);
        }
    }

    /// Get the bucket name
    pub fn bucket_name(&self) -> String {
        self.bucket.name()
    }
}

/// Reduce a client-supplied filename to a safe final path segment.
///
/// Directory components are discarded, characters outside `[A-Za-z0-9._-]`
/// become `_`, and an empty result becomes `file`.
fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        return "file".to_string();
    }

    // keep the extension when shortening
    if trimmed.len() > MAX_FILENAME_LEN {
        let ext = trimmed
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| ext.len() < 16)
            .unwrap_or("");
        let keep = MAX_FILENAME_LEN - ext.len() - 1;
        if ext.is_empty() {
            return trimmed[..MAX_FILENAME_LEN].to_string();
        }
        return format!("{}.{}", &trimmed[..keep], ext);
    }

    trimmed.to_string()
}
