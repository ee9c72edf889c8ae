use crate::core::client::storage::{StorageClient, StorageError};
use crate::types::params::StorageArgs;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug)]
pub struct AWSS3 {
    pub(crate) client: Arc<Client>,
    bucket_name: String,
}

impl AWSS3 {
    /// Creates a new instance of AWSS3 with the provided AWS configuration.
    /// # Arguments
    /// * `aws_config` - The AWS configuration, carrying the bucket region.
    /// * `args` - The storage arguments with the bucket name.
    pub fn new(aws_config: &SdkConfig, args: &StorageArgs) -> Self {
        let client = Client::new(aws_config);
        Self { client: Arc::new(client), bucket_name: args.bucket_name.clone() }
    }
}

#[async_trait]
impl StorageClient for AWSS3 {
    /// Put the data into the bucket with the specified key.
    ///
    /// # Arguments
    /// * `data` - The data to put into the bucket.
    /// * `key` - The key of the object to put.
    /// * `content_type` - The content type the object is served with.
    async fn put_data(&self, data: Bytes, key: &str, content_type: &str) -> Result<(), StorageError> {
        let size = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(data.into())
            .send()
            .await?;
        debug!(key = %key, size = size, "Uploaded object");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StorageError> {
        self.client.head_bucket().bucket(&self.bucket_name).send().await?;
        Ok(())
    }
}
