// 进程内用户存储，行为与 Postgres 实现保持一致，供测试使用

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::UserStore;
use crate::database::models::{NewUser, UserEntity, UserPatch, UserQuery};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Table {
    next_id: i32,
    rows: BTreeMap<i32, UserEntity>,
}

impl Table {
    fn username_taken(&self, username: &str, except: Option<i32>) -> bool {
        self.rows
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    table: RwLock<Table>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前行数
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> AppResult<UserEntity> {
        let mut table = self.table.write().await;
        if table.username_taken(&user.username, None) {
            return Err(AppError::Conflict(format!(
                "Username {} already exists",
                user.username
            )));
        }

        table.next_id += 1;
        let entity = UserEntity {
            id: table.next_id,
            username: user.username,
            name: user.name,
            surname: user.surname,
            birthdate: user.birthdate,
            blocked_users: Vec::new(),
        };
        table.rows.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<UserEntity>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserEntity>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_all(&self) -> AppResult<Vec<UserEntity>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn update_fields(&self, id: i32, patch: UserPatch) -> AppResult<()> {
        let mut table = self.table.write().await;
        if let Some(username) = &patch.username {
            if table.username_taken(username, Some(id)) {
                return Err(AppError::Conflict(format!(
                    "Username {} already exists",
                    username
                )));
            }
        }

        // 与 UPDATE 语义一致：目标行不存在时静默成功
        if let Some(user) = table.rows.get_mut(&id) {
            patch.apply_to(user);
        }
        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<u64> {
        let removed = self.table.write().await.rows.remove(&id);
        Ok(u64::from(removed.is_some()))
    }

    async fn query(&self, query: &UserQuery) -> AppResult<Vec<UserEntity>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|u| query.matches(u))
            .cloned()
            .collect())
    }
}
