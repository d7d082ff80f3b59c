use std::sync::Arc;

use crate::config::TokenSettings;
use crate::error::AppResult;
use crate::services::UserService;
use crate::utils::{Claims, decode_token, generate_token};

/// 令牌签发与解析
pub struct AuthService {
    users: Arc<UserService>,
    settings: TokenSettings,
}

impl AuthService {
    pub fn new(users: Arc<UserService>, settings: TokenSettings) -> Self {
        Self { users, settings }
    }

    /// 为已存在的用户签发令牌，返回令牌和过期时间戳
    pub async fn generate_token(&self, user_id: i32) -> AppResult<(String, i64)> {
        let user = self.users.find_one(user_id).await?;
        let token = generate_token(user.id, &self.settings)?;
        tracing::info!("Issued token for user {}", user.id);
        Ok(token)
    }

    pub fn decode(&self, token: &str) -> AppResult<Claims> {
        Ok(decode_token(token, &self.settings)?)
    }
}
