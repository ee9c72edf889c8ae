use crate::core::client::queue::{job_field_key, QueueClient, QueueError};
use crate::types::jobs::types::JobField;
use crate::types::params::QueueArgs;
use crate::types::queue::QueueType;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, trace};

/// Redis backed queue. Tokens are pushed at the head (LPUSH) and popped at the tail (RPOP).
#[derive(Clone)]
pub struct RedisQueue {
    connection: ConnectionManager,
}

impl RedisQueue {
    pub async fn create(args: &QueueArgs) -> Result<Self, QueueError> {
        let connection_error = |source| QueueError::Connection { url: args.redis_url.clone(), source };
        let client = redis::Client::open(args.redis_url.as_str()).map_err(connection_error)?;
        let connection = ConnectionManager::new(client).await.map_err(connection_error)?;
        debug!(url = %args.redis_url, "Connected to redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl QueueClient for RedisQueue {
    async fn pop_job(&self, queue: QueueType) -> Result<Option<String>, QueueError> {
        let mut connection = self.connection.clone();
        let token: Option<String> = connection
            .rpop(queue.to_string(), None)
            .await
            .map_err(|source| QueueError::Pop { queue: queue.to_string(), source })?;
        trace!(queue = %queue, popped = token.is_some(), "Polled queue");
        Ok(token)
    }

    async fn push_job(&self, queue: QueueType, token: &str) -> Result<(), QueueError> {
        let mut connection = self.connection.clone();
        connection.lpush::<_, _, ()>(queue.to_string(), token).await.map_err(|source| QueueError::Push {
            queue: queue.to_string(),
            token: token.to_string(),
            source,
        })
    }

    async fn set_field(&self, token: &str, field: JobField, value: &str) -> Result<(), QueueError> {
        let key = job_field_key(token, field);
        let mut connection = self.connection.clone();
        connection.set::<_, _, ()>(&key, value).await.map_err(|source| QueueError::SetField { key, source })
    }

    async fn get_field(&self, token: &str, field: JobField) -> Result<Option<String>, QueueError> {
        let key = job_field_key(token, field);
        let mut connection = self.connection.clone();
        connection.get(&key).await.map_err(|source| QueueError::GetField { key, source })
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        let mut connection = self.connection.clone();
        let pong: String = redis::cmd("PING")
            .query_async(&mut connection)
            .await
            .map_err(|e| QueueError::HealthCheck(e.to_string()))?;
        if pong != "PONG" {
            return Err(QueueError::HealthCheck(format!("unexpected PING reply {}", pong)));
        }
        Ok(())
    }
}
