use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient, aio::ConnectionManager};

use super::Cache;
use crate::error::AppResult;

/// 基于 Redis 的缓存实现，键不设置过期时间
///
/// 持有一个断线自动重连的多路复用连接，每次调用克隆句柄
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn connect(redis: &RedisClient) -> AppResult<Self> {
        let conn = redis.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
