pub mod error;
pub mod redis;

use crate::types::jobs::types::JobField;
use crate::types::queue::QueueType;
use async_trait::async_trait;
pub use error::QueueError;

/// Key of a job field in the shared store: `jobs:<token>:<field>`
pub fn job_field_key(token: &str, field: JobField) -> String {
    format!("jobs:{}:{}", token, field)
}

/// Trait defining queue operations
///
/// The queue is a shared key-value store with list semantics. Popping is destructive
/// and is the only admission control between workers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Destructively pops one token. `None` when the list is empty.
    async fn pop_job(&self, queue: QueueType) -> Result<Option<String>, QueueError>;

    async fn push_job(&self, queue: QueueType, token: &str) -> Result<(), QueueError>;

    async fn set_field(&self, token: &str, field: JobField, value: &str) -> Result<(), QueueError>;

    async fn get_field(&self, token: &str, field: JobField) -> Result<Option<String>, QueueError>;

    /// Perform a health check on the queue service
    ///
    /// # Returns
    /// * `Ok(())` - If the store answers
    /// * `Err(QueueError)` - If the health check fails
    async fn health_check(&self) -> Result<(), QueueError>;
}
