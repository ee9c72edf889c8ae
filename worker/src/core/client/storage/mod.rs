pub mod error;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
pub use error::StorageError;

/// Trait defining object storage operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Put the data into the bucket under `key`, served with `content_type`
    async fn put_data(&self, data: Bytes, key: &str, content_type: &str) -> Result<(), StorageError>;

    /// Perform a health check on the storage service
    ///
    /// This method verifies that the storage service (e.g., AWS S3) is accessible
    /// and the necessary permissions are in place.
    ///
    /// # Returns
    /// * `Ok(())` - If the storage service is healthy and accessible
    /// * `Err(StorageError)` - If the health check fails
    async fn health_check(&self) -> Result<(), StorageError>;
}
