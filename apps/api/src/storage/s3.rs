use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use crate::config::S3Settings;
use crate::storage::{blob_key, content_type_for, BlobStore, StorageError};

/// S3 / MinIO backed blob storage. References are object keys in one bucket.
#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        S3BlobStore {
            client,
            bucket: bucket.into(),
        }
    }

    /// Constructs a client configured for MinIO (local) or AWS (production).
    pub async fn from_settings(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "applytrack-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        let client = aws_sdk_s3::Client::new(&s3_config);
        info!("S3 client initialized (bucket: {})", settings.bucket);
        S3BlobStore::new(client, settings.bucket.clone())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store(
        &self,
        prefix: &str,
        suggested_name: &str,
        bytes: Bytes,
    ) -> Result<String, StorageError> {
        let key = blob_key(prefix, suggested_name);
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type_for(suggested_name).to_string())
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("upload failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(key)
    }

    async fn retrieve(&self, reference: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(reference)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    StorageError::NotFound(reference.to_string())
                } else {
                    StorageError::S3(format!("download failed: {service_error}"))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::S3(format!("reading object body failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(reference)
            .send()
            .await
            .map_err(|e| StorageError::S3(format!("delete failed: {e}")))?;
        Ok(())
    }
}
