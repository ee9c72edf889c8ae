use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to connect to redis at {url}: {source}")]
    Connection { url: String, source: redis::RedisError },

    #[error("Failed to pop from queue {queue}: {source}")]
    Pop { queue: String, source: redis::RedisError },

    #[error("Failed to push {token} to queue {queue}: {source}")]
    Push { queue: String, token: String, source: redis::RedisError },

    #[error("Failed to write {key}: {source}")]
    SetField { key: String, source: redis::RedisError },

    #[error("Failed to read {key}: {source}")]
    GetField { key: String, source: redis::RedisError },

    #[error("Queue health check failed: {0}")]
    HealthCheck(String),
}
