//! Blob storage for uploaded resumes and avatars.
//!
//! Rows persist the reference returned by [`BlobStore::store`]; bytes are only
//! ever read back through [`BlobStore::retrieve`] after an ownership-checked
//! lookup of that row.

use async_trait::async_trait;
use bytes::Bytes;
use mime_guess::mime::{self, Mime};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

pub mod local;
pub mod s3;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("invalid blob reference: {0}")]
    InvalidReference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `prefix` and returns the reference to persist.
    async fn store(
        &self,
        prefix: &str,
        suggested_name: &str,
        bytes: Bytes,
    ) -> Result<String, StorageError>;

    async fn retrieve(&self, reference: &str) -> Result<Bytes, StorageError>;

    /// Removing a reference that no longer exists is not an error.
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;
}

/// A file received in a multipart upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original name as sent by the client, reduced to its last path component.
    pub file_name: String,
    pub bytes: Bytes,
}

/// Deletes a blob that is no longer referenced. Failures are logged, not returned:
/// the row change that orphaned the blob has already been committed.
pub async fn discard(blobs: &dyn BlobStore, reference: &str) {
    if let Err(e) = blobs.delete(reference).await {
        warn!("Failed to delete blob {reference}: {e}");
    }
}

/// Last path component of a storage key, used as the download file name.
pub fn key_file_name(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Builds a unique storage key: `<prefix>/<uuid>/<sanitized name>`.
pub fn blob_key(prefix: &str, suggested_name: &str) -> String {
    format!("{prefix}/{}/{}", Uuid::new_v4(), sanitize_name(suggested_name))
}

/// Keeps ASCII letters, digits, `.`, `-` and `_`; everything else becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .take(100)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Best-guess `Content-Type` from a file name's extension.
pub fn content_type_for(file_name: &str) -> Mime {
    mime_guess::from_path(file_name).first_or_octet_stream()
}

/// Whether the extension names an image type.
pub fn is_image_name(file_name: &str) -> bool {
    content_type_for(file_name).type_() == mime::IMAGE
}
