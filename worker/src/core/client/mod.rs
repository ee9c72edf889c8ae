// Client abstractions module - contains all client interface traits

pub mod command;
pub mod queue;
pub mod storage;

// Re-export commonly used types
pub use command::{local::LocalCommandRunner, CommandRunner};
pub use queue::{redis::RedisQueue, QueueClient};
pub use storage::{s3::AWSS3, StorageClient};
