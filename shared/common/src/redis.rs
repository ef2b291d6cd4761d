use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::Serialize;
use crate::{AppError, RedisConfig};

#[derive(Clone)]
pub struct RedisService {
    manager: ConnectionManager,
}

impl RedisService {
    pub async fn new(config: &RedisConfig) -> Result<Self, AppError> {
        let client = Client::open(config.connection_string())?;
        let manager = ConnectionManager::new(client).await?;

        // Test connection
        let mut conn = manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        tracing::info!("Redis connection established");

        Ok(Self { manager })
    }

    // Pub/Sub for audit fan-out
    pub async fn publish(&self, channel: &str, message: &str) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: i64 = conn.publish(channel, message).await?;
        Ok(())
    }

    pub async fn publish_json<T>(&self, channel: &str, message: &T) -> Result<(), AppError>
    where
        T: Serialize,
    {
        let serialized = serde_json::to_string(message)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;
        self.publish(channel, &serialized).await
    }

    // Health check
    pub async fn health_check(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// Redis key builders
pub struct RedisKeys;

impl RedisKeys {
    pub fn audit_channel(prefix: &str, event_kind: &str) -> String {
        format!("{}:{}", prefix, event_kind)
    }
}
