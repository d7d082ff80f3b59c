use serde::{Serialize, de::DeserializeOwned};

use crate::cache::Cache;
use crate::cache::keys::user_keys::{USERS_KEY, user_key};
use crate::database::models::UserEntity;

/// 用户缓存操作
///
/// 缓存只是尽力而为的镜像：读取失败按未命中处理，写入和删除失败只记录日志
pub struct UserCacheOperations;

impl UserCacheOperations {
    async fn read<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
        match cache.get(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    tracing::debug!("Cache hit: {}", key);
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!("Discarding undecodable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                tracing::debug!("Cache miss: {}", key);
                None
            }
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn write<T: Serialize + ?Sized>(cache: &dyn Cache, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry {}: {}", key, e);
                return;
            }
        };

        match cache.set(key, &json).await {
            Ok(()) => tracing::debug!("Set cache: {}", key),
            Err(e) => tracing::warn!("Cache write failed for {}: {}", key, e),
        }
    }

    async fn remove(cache: &dyn Cache, key: &str) {
        match cache.delete(key).await {
            Ok(()) => tracing::debug!("Invalidated cache: {}", key),
            Err(e) => tracing::warn!("Cache invalidation failed for {}: {}", key, e),
        }
    }

    /// 读取单个用户缓存
    pub async fn get_cached_user(cache: &dyn Cache, user_id: i32) -> Option<UserEntity> {
        Self::read(cache, &user_key(user_id)).await
    }

    /// 缓存单个用户
    pub async fn cache_user(cache: &dyn Cache, user: &UserEntity) {
        Self::write(cache, &user_key(user.id), user).await
    }

    /// 删除单个用户缓存
    pub async fn remove_user(cache: &dyn Cache, user_id: i32) {
        Self::remove(cache, &user_key(user_id)).await
    }

    /// 读取用户列表缓存
    pub async fn get_cached_users(cache: &dyn Cache) -> Option<Vec<UserEntity>> {
        Self::read(cache, USERS_KEY).await
    }

    /// 缓存用户列表
    pub async fn cache_users(cache: &dyn Cache, users: &[UserEntity]) {
        Self::write(cache, USERS_KEY, users).await
    }

    /// 删除用户列表缓存
    pub async fn remove_users(cache: &dyn Cache) {
        Self::remove(cache, USERS_KEY).await
    }
}
