// 缓存模块
// 缓存接口、Redis/内存实现以及用户缓存操作

use async_trait::async_trait;

use crate::error::AppResult;

pub mod keys;
pub mod memory;
pub mod operations;
pub mod redis_cache;

pub use memory::MemoryCache;
pub use operations::user::UserCacheOperations;
pub use redis_cache::RedisCache;

/// 键值缓存接口，值为 JSON 字符串。无过期时间，由写操作显式失效
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;
}
