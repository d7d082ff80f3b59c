// 用户存储
// 基于 Postgres 的用户表操作

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::UserStore;
use crate::database::models::{NewUser, UserEntity, UserPatch, UserQuery};
use crate::error::{AppError, AppResult};

const SCHEMA: &str = include_str!("../sql/schema.sql");

const USER_COLUMNS: &str = "id, username, name, surname, birthdate, blocked_users";

/// 用户存储库，处理所有与用户表相关的数据库操作
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 建表（已存在时跳过）
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        sqlx::raw_sql(SCHEMA).execute(&self.db).await?;
        tracing::info!("Users schema ready");
        Ok(())
    }
}

/// 唯一约束冲突转为业务冲突，其余保持数据库错误
fn map_write_error(err: sqlx::Error, username: Option<&str>) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AppError::Conflict(
            format!("Username {} already exists", username.unwrap_or_default()),
        ),
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> AppResult<UserEntity> {
        let sql = format!(
            "INSERT INTO users (username, name, surname, birthdate) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, UserEntity>(&sql)
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.surname)
            .bind(user.birthdate)
            .fetch_one(&self.db)
            .await
            .map_err(|e| map_write_error(e, Some(&user.username)))
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Option<UserEntity>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<UserEntity>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn get_all(&self) -> AppResult<Vec<UserEntity>> {
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let users = sqlx::query_as::<_, UserEntity>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }

    async fn update_fields(&self, id: i32, patch: UserPatch) -> AppResult<()> {
        let username = patch.username.clone();
        let Some(mut builder) = update_query(id, patch) else {
            return Ok(());
        };

        builder
            .build()
            .execute(&self.db)
            .await
            .map_err(|e| map_write_error(e, username.as_deref()))?;

        Ok(())
    }

    async fn delete_by_id(&self, id: i32) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, query: &UserQuery) -> AppResult<Vec<UserEntity>> {
        let mut builder = search_query(query);
        let users = builder
            .build_query_as::<UserEntity>()
            .fetch_all(&self.db)
            .await?;
        Ok(users)
    }
}

/// 部分更新语句，补丁为空时返回 None
fn update_query(id: i32, patch: UserPatch) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET ");
    {
        let mut set = builder.separated(", ");
        if let Some(username) = patch.username {
            set.push("username = ").push_bind_unseparated(username);
        }
        if let Some(name) = patch.name {
            set.push("name = ").push_bind_unseparated(name);
        }
        if let Some(surname) = patch.surname {
            set.push("surname = ").push_bind_unseparated(surname);
        }
        if let Some(birthdate) = patch.birthdate {
            set.push("birthdate = ").push_bind_unseparated(birthdate);
        }
        if let Some(blocked_users) = patch.blocked_users {
            set.push("blocked_users = ").push_bind_unseparated(blocked_users);
        }
    }
    builder.push(" WHERE id = ").push_bind(id);
    Some(builder)
}

// 用户名按字面子串匹配，strpos 不解释 % 和 _
fn search_query(query: &UserQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM users WHERE TRUE",
        USER_COLUMNS
    ));

    if let Some(fragment) = &query.username_contains {
        builder
            .push(" AND strpos(username, ")
            .push_bind(fragment.clone())
            .push(") > 0");
    }
    if let Some(upper) = query.born_on_or_before {
        builder.push(" AND birthdate <= ").push_bind(upper);
    }
    if let Some(lower) = query.born_on_or_after {
        builder.push(" AND birthdate >= ").push_bind(lower);
    }
    if !query.exclude_ids.is_empty() {
        builder
            .push(" AND id <> ALL(")
            .push_bind(query.exclude_ids.clone())
            .push(")");
    }
    builder.push(" ORDER BY id");
    builder
}
