//! Object storage client for listing images.
//!
//! Talks to a Supabase-style storage REST endpoint: objects are uploaded with
//! the service key and served from the bucket's public URL.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use uuid::Uuid;

use nearby_core::ListingId;

use crate::config::StorageConfig;

/// Largest accepted image upload (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Errors from the storage service.
#[derive(Debug, Error)]
pub enum StorageError {
    /// `STORAGE_*` variables are not set.
    #[error("Image storage is not configured")]
    NotConfigured,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The storage service answered with a non-success status.
    #[error("Storage returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Path inside the bucket.
    pub path: String,
    /// Publicly readable URL.
    pub public_url: String,
}

/// Storage client. Cheap to clone.
#[derive(Clone)]
pub struct StorageClient {
    inner: Option<Arc<StorageClientInner>>,
}

struct StorageClientInner {
    client: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: SecretString,
}

impl StorageClient {
    /// Create a storage client; `None` yields a client whose calls fail with
    /// [`StorageError::NotConfigured`].
    #[must_use]
    pub fn new(config: Option<&StorageConfig>) -> Self {
        let inner = config.map(|c| {
            Arc::new(StorageClientInner {
                client: reqwest::Client::new(),
                base_url: c.url.trim_end_matches('/').to_string(),
                bucket: c.bucket.clone(),
                service_key: c.service_key.clone(),
            })
        });
        Self { inner }
    }

    /// Whether storage credentials are configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.inner.is_some()
    }

    fn inner(&self) -> Result<&StorageClientInner, StorageError> {
        self.inner.as_deref().ok_or(StorageError::NotConfigured)
    }

    /// Upload an image for a listing under a fresh object name.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotConfigured` without credentials, or the
    /// HTTP/upstream error of the upload.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn upload_listing_image(
        &self,
        listing_id: ListingId,
        content_type: &str,
        extension: &str,
        data: Bytes,
    ) -> Result<StoredObject, StorageError> {
        let inner = self.inner()?;
        let path = object_path(listing_id, Uuid::new_v4(), extension);
        let url = format!("{}/object/{}/{path}", inner.base_url, inner.bucket);

        let response = inner
            .authorized(inner.client.post(&url))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(data)
            .send()
            .await?;
        check_status(response).await?;

        Ok(StoredObject {
            public_url: public_url(&inner.base_url, &inner.bucket, &path),
            path,
        })
    }

    /// Remove objects by path. An empty list is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotConfigured` without credentials, or the
    /// HTTP/upstream error of the removal.
    #[instrument(skip(self))]
    pub async fn remove(&self, paths: &[String]) -> Result<(), StorageError> {
        if paths.is_empty() {
            return Ok(());
        }
        let inner = self.inner()?;
        let url = format!("{}/object/{}", inner.base_url, inner.bucket);

        let response = inner
            .authorized(inner.client.delete(&url))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        check_status(response).await
    }
}

impl StorageClientInner {
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.service_key.expose_secret();
        request
            .bearer_auth(key)
            .header("apikey", key)
            .timeout(Duration::from_secs(30))
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!(
        status = %status,
        body = %body.chars().take(500).collect::<String>(),
        "Storage returned non-success status"
    );
    Err(StorageError::Upstream {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}

/// File extension for an accepted image content type.
#[must_use]
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

fn object_path(listing_id: ListingId, name: Uuid, extension: &str) -> String {
    format!("listings/{listing_id}/{name}.{extension}")
}

fn public_url(base_url: &str, bucket: &str, path: &str) -> String {
    format!("{base_url}/object/public/{bucket}/{path}")
}
