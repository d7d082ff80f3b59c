//! 用户目录服务：增删改查、搜索与屏蔽名单
//!
//! 所有读取先查缓存，未命中再查存储并回填；所有写操作在同一次调用中
//! 删除或覆盖相关缓存键（`"users"` 与 `"user-<id>"`）。

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::cache::{Cache, UserCacheOperations};
use crate::database::{NewUser, UserEntity, UserPatch, UserQuery, UserStore};
use crate::error::{AppError, AppResult};
use crate::utils::birthdate_for_age;

/// 搜索条件
#[derive(Debug, Clone, Default)]
pub struct SearchCriteria {
    pub username: Option<String>,
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
}

pub struct UserService {
    store: Arc<dyn UserStore>,
    cache: Arc<dyn Cache>,
}

fn validate_username(username: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::BadRequest("Username must not be empty".to_string()));
    }
    Ok(())
}

fn age_threshold(today: NaiveDate, age: u32) -> AppResult<NaiveDate> {
    birthdate_for_age(today, age)
        .ok_or_else(|| AppError::BadRequest(format!("Age {} is out of range", age)))
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, cache: Arc<dyn Cache>) -> Self {
        Self { store, cache }
    }

    pub async fn create(&self, new_user: NewUser) -> AppResult<UserEntity> {
        validate_username(&new_user.username)?;

        if self
            .store
            .get_by_username(&new_user.username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "Username {} already exists",
                new_user.username
            )));
        }

        let user = self.store.insert(new_user).await?;
        UserCacheOperations::remove_users(self.cache.as_ref()).await;

        info!("Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn find_all(&self) -> AppResult<Vec<UserEntity>> {
        if let Some(users) = UserCacheOperations::get_cached_users(self.cache.as_ref()).await {
            return Ok(users);
        }

        let users = self.store.get_all().await?;
        UserCacheOperations::cache_users(self.cache.as_ref(), &users).await;
        Ok(users)
    }

    pub async fn find_one(&self, id: i32) -> AppResult<UserEntity> {
        if let Some(user) = UserCacheOperations::get_cached_user(self.cache.as_ref(), id).await {
            return Ok(user);
        }

        let user = self
            .store
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::user_not_found(id))?;

        UserCacheOperations::cache_user(self.cache.as_ref(), &user).await;
        Ok(user)
    }

    pub async fn update(&self, id: i32, patch: UserPatch) -> AppResult<UserEntity> {
        let current = self.find_one(id).await?;

        if let Some(username) = &patch.username {
            validate_username(username)?;
            if *username != current.username {
                if let Some(existing) = self.store.get_by_username(username).await? {
                    if existing.id != id {
                        return Err(AppError::Conflict(format!(
                            "Username {} already exists",
                            username
                        )));
                    }
                }
            }
        }

        self.store.update_fields(id, patch).await?;
        let updated = self.reload(id).await?;

        info!("Updated user {}", id);
        Ok(updated)
    }

    pub async fn remove(&self, id: i32) -> AppResult<()> {
        let affected = self.store.delete_by_id(id).await?;
        if affected == 0 {
            return Err(AppError::user_not_found(id));
        }

        UserCacheOperations::remove_user(self.cache.as_ref(), id).await;
        UserCacheOperations::remove_users(self.cache.as_ref()).await;

        info!("Removed user {}", id);
        Ok(())
    }

    pub async fn search(
        &self,
        requester_id: i32,
        criteria: SearchCriteria,
    ) -> AppResult<Vec<UserEntity>> {
        self.search_at(Utc::now().date_naive(), requester_id, criteria)
            .await
    }

    /// 以指定日期为“今天”执行搜索
    pub async fn search_at(
        &self,
        today: NaiveDate,
        requester_id: i32,
        criteria: SearchCriteria,
    ) -> AppResult<Vec<UserEntity>> {
        let requester = self.find_one(requester_id).await?;

        let query = UserQuery {
            username_contains: criteria.username.filter(|u| !u.is_empty()),
            born_on_or_before: criteria
                .min_age
                .map(|age| age_threshold(today, age))
                .transpose()?,
            born_on_or_after: criteria
                .max_age
                .map(|age| age_threshold(today, age))
                .transpose()?,
            exclude_ids: requester.blocked_users,
        };

        debug!("User {} searching with {:?}", requester_id, query);
        self.store.query(&query).await
    }

    pub async fn block_user(&self, user_id: i32, blocked_user_id: i32) -> AppResult<UserEntity> {
        if user_id == blocked_user_id {
            return Err(AppError::BadRequest("You cannot block yourself".to_string()));
        }

        self.find_one(blocked_user_id).await?;
        let user = self.find_one(user_id).await?;

        if user.blocked_users.contains(&blocked_user_id) {
            return Err(AppError::AlreadyBlocked(format!(
                "User with ID {} is already blocked",
                blocked_user_id
            )));
        }

        let mut blocked_users = user.blocked_users;
        blocked_users.push(blocked_user_id);
        self.store
            .update_fields(user_id, UserPatch::blocked_users(blocked_users))
            .await?;
        let updated = self.reload(user_id).await?;

        info!("User {} blocked user {}", user_id, blocked_user_id);
        Ok(updated)
    }

    pub async fn unblock_user(&self, user_id: i32, blocked_user_id: i32) -> AppResult<UserEntity> {
        let user = self.find_one(user_id).await?;

        if !user.blocked_users.contains(&blocked_user_id) {
            return Err(AppError::NotFound(format!(
                "User with ID {} is not blocked",
                blocked_user_id
            )));
        }

        let blocked_users = user
            .blocked_users
            .into_iter()
            .filter(|id| *id != blocked_user_id)
            .collect();
        self.store
            .update_fields(user_id, UserPatch::blocked_users(blocked_users))
            .await?;
        let updated = self.reload(user_id).await?;

        info!("User {} unblocked user {}", user_id, blocked_user_id);
        Ok(updated)
    }

    /// 写入后从存储重新读取，覆盖单个用户缓存并删除列表缓存
    async fn reload(&self, id: i32) -> AppResult<UserEntity> {
        UserCacheOperations::remove_users(self.cache.as_ref()).await;

        match self.store.get_by_id(id).await? {
            Some(user) => {
                UserCacheOperations::cache_user(self.cache.as_ref(), &user).await;
                Ok(user)
            }
            None => {
                UserCacheOperations::remove_user(self.cache.as_ref(), id).await;
                Err(AppError::user_not_found(id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::database::MemoryUserStore;

    struct Fixture {
        service: UserService,
        store: Arc<MemoryUserStore>,
        cache: Arc<MemoryCache>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryUserStore::new());
        let cache = Arc::new(MemoryCache::new());
        let service = UserService::new(store.clone(), cache.clone());
        Fixture {
            service,
            store,
            cache,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn new_user(username: &str, birthdate: NaiveDate) -> NewUser {
        NewUser {
            username: username.to_string(),
            name: "Test".to_string(),
            surname: "User".to_string(),
            birthdate,
        }
    }

    fn ids(users: &[UserEntity]) -> Vec<i32> {
        users.iter().map(|u| u.id).collect()
    }

    #[tokio::test]
    async fn test_create_then_find_one() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();

        let found = f.service.find_one(alice.id).await.unwrap();
        assert_eq!(found, alice);
    }

    #[tokio::test]
    async fn test_create_duplicate_username_conflicts() {
        let f = fixture();
        f.service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();

        let result = f.service.create(new_user("alice", date(1991, 1, 1))).await;
        match result.unwrap_err() {
            AppError::Conflict(msg) => assert!(msg.contains("alice")),
            other => panic!("Expected Conflict, got {:?}", other),
        }
        assert_eq!(f.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_username() {
        let f = fixture();
        let result = f.service.create(new_user("  ", date(1990, 1, 1))).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_create_invalidates_listing() {
        let f = fixture();
        f.service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        assert_eq!(f.service.find_all().await.unwrap().len(), 1);
        assert!(f.cache.contains_key("users").await);

        f.service
            .create(new_user("bob", date(2000, 1, 1)))
            .await
            .unwrap();
        assert!(!f.cache.contains_key("users").await);
        assert_eq!(f.service.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_one_missing_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.service.find_one(404).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_one_populates_cache() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        assert!(!f.cache.contains_key("user-1").await);

        f.service.find_one(alice.id).await.unwrap();
        assert!(f.cache.contains_key("user-1").await);
    }

    #[tokio::test]
    async fn test_remove_then_find_one_is_not_found() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        f.service.find_one(alice.id).await.unwrap();
        f.service.find_all().await.unwrap();

        f.service.remove(alice.id).await.unwrap();

        assert!(matches!(
            f.service.find_one(alice.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(f.service.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_is_not_found() {
        let f = fixture();
        assert!(matches!(f.service.remove(9).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_update_username_is_visible_immediately() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        // 预热缓存
        f.service.find_one(alice.id).await.unwrap();
        f.service.find_all().await.unwrap();

        let patch = UserPatch {
            username: Some("alicia".to_string()),
            ..UserPatch::default()
        };
        let updated = f.service.update(alice.id, patch).await.unwrap();
        assert_eq!(updated.username, "alicia");

        assert_eq!(f.service.find_one(alice.id).await.unwrap().username, "alicia");
        assert_eq!(f.service.find_all().await.unwrap()[0].username, "alicia");
    }

    #[tokio::test]
    async fn test_update_to_taken_username_conflicts_and_keeps_record() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        f.service
            .create(new_user("bob", date(2000, 1, 1)))
            .await
            .unwrap();

        let patch = UserPatch {
            username: Some("bob".to_string()),
            name: Some("Changed".to_string()),
            ..UserPatch::default()
        };
        let result = f.service.update(alice.id, patch).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let unchanged = f.service.find_one(alice.id).await.unwrap();
        assert_eq!(unchanged, alice);
    }

    #[tokio::test]
    async fn test_update_keeping_same_username_is_allowed() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();

        let patch = UserPatch {
            username: Some("alice".to_string()),
            surname: Some("Liddell".to_string()),
            ..UserPatch::default()
        };
        let updated = f.service.update(alice.id, patch).await.unwrap();
        assert_eq!(updated.surname, "Liddell");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let f = fixture();
        let result = f.service.update(3, UserPatch::default()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_block_self_is_bad_request_even_when_missing() {
        let f = fixture();
        assert!(matches!(
            f.service.block_user(8, 8).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_block_missing_target_is_not_found() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();

        assert!(matches!(
            f.service.block_user(alice.id, 99).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_block_twice_is_already_blocked() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        let bob = f
            .service
            .create(new_user("bob", date(2000, 1, 1)))
            .await
            .unwrap();

        f.service.block_user(alice.id, bob.id).await.unwrap();
        assert!(matches!(
            f.service.block_user(alice.id, bob.id).await,
            Err(AppError::AlreadyBlocked(_))
        ));
    }

    #[tokio::test]
    async fn test_block_then_unblock_restores_block_list() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        let bob = f
            .service
            .create(new_user("bob", date(2000, 1, 1)))
            .await
            .unwrap();
        let carol = f
            .service
            .create(new_user("carol", date(1985, 3, 3)))
            .await
            .unwrap();
        f.service.block_user(alice.id, carol.id).await.unwrap();
        let before = f.service.find_one(alice.id).await.unwrap().blocked_users;

        let blocked = f.service.block_user(alice.id, bob.id).await.unwrap();
        assert_eq!(blocked.blocked_users, vec![carol.id, bob.id]);
        assert_eq!(
            f.service.find_one(alice.id).await.unwrap().blocked_users,
            vec![carol.id, bob.id]
        );

        let unblocked = f.service.unblock_user(alice.id, bob.id).await.unwrap();
        assert_eq!(unblocked.blocked_users, before);
        assert_eq!(f.service.find_one(alice.id).await.unwrap().blocked_users, before);
    }

    #[tokio::test]
    async fn test_unblock_not_blocked_is_not_found() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();

        assert!(matches!(
            f.service.unblock_user(alice.id, 2).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_block_refreshes_listing() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        let bob = f
            .service
            .create(new_user("bob", date(2000, 1, 1)))
            .await
            .unwrap();
        f.service.find_all().await.unwrap();

        f.service.block_user(alice.id, bob.id).await.unwrap();

        let listing = f.service.find_all().await.unwrap();
        let cached_alice = listing.iter().find(|u| u.id == alice.id).unwrap();
        assert_eq!(cached_alice.blocked_users, vec![bob.id]);
    }

    #[tokio::test]
    async fn test_search_by_age_and_block_list() {
        let f = fixture();
        let today = date(2024, 6, 1);
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        let bob = f
            .service
            .create(new_user("bob", date(2000, 1, 1)))
            .await
            .unwrap();

        let criteria = SearchCriteria {
            min_age: Some(30),
            ..SearchCriteria::default()
        };
        let found = f
            .service
            .search_at(today, bob.id, criteria)
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![alice.id]);

        f.service.block_user(alice.id, bob.id).await.unwrap();
        let found = f
            .service
            .search_at(today, alice.id, SearchCriteria::default())
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![alice.id]);
    }

    #[tokio::test]
    async fn test_search_max_age_and_username_fragment() {
        let f = fixture();
        let today = date(2024, 6, 1);
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        let alina = f
            .service
            .create(new_user("alina", date(2005, 1, 1)))
            .await
            .unwrap();
        f.service
            .create(new_user("bob", date(2004, 1, 1)))
            .await
            .unwrap();

        let criteria = SearchCriteria {
            username: Some("ali".to_string()),
            max_age: Some(25),
            ..SearchCriteria::default()
        };
        let found = f
            .service
            .search_at(today, alice.id, criteria)
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![alina.id]);
    }

    #[tokio::test]
    async fn test_search_empty_username_means_no_filter() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();
        f.service
            .create(new_user("bob", date(2000, 1, 1)))
            .await
            .unwrap();

        let criteria = SearchCriteria {
            username: Some(String::new()),
            ..SearchCriteria::default()
        };
        let found = f.service.search(alice.id, criteria).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_search_unknown_requester_is_not_found() {
        let f = fixture();
        let result = f.service.search(1, SearchCriteria::default()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_absurd_age_is_bad_request() {
        let f = fixture();
        let alice = f
            .service
            .create(new_user("alice", date(1990, 1, 1)))
            .await
            .unwrap();

        let criteria = SearchCriteria {
            min_age: Some(u32::MAX),
            ..SearchCriteria::default()
        };
        let result = f.service.search(alice.id, criteria).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
