/// 数据库操作
/// 用户存储接口及其实现
use async_trait::async_trait;

use crate::database::models::{NewUser, UserEntity, UserPatch, UserQuery};
use crate::error::AppResult;

pub mod memory;
pub mod user;

pub use memory::MemoryUserStore;
pub use user::PgUserStore;

/// 用户存储接口。每次调用相互独立，不包裹事务
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 插入新用户并返回带ID的记录；存储层唯一约束冲突时返回 `Conflict`
    async fn insert(&self, user: NewUser) -> AppResult<UserEntity>;

    async fn get_by_id(&self, id: i32) -> AppResult<Option<UserEntity>>;

    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserEntity>>;

    /// 全部用户，按ID升序
    async fn get_all(&self) -> AppResult<Vec<UserEntity>>;

    async fn update_fields(&self, id: i32, patch: UserPatch) -> AppResult<()>;

    /// 返回受影响的行数
    async fn delete_by_id(&self, id: i32) -> AppResult<u64>;

    async fn query(&self, query: &UserQuery) -> AppResult<Vec<UserEntity>>;
}
