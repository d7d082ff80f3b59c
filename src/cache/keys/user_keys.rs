/// 全部用户列表缓存键
pub const USERS_KEY: &str = "users";

/// 单个用户缓存键前缀
const USER_PREFIX: &str = "user-";

/// 生成单个用户缓存键
pub fn user_key(user_id: i32) -> String {
    format!("{}{}", USER_PREFIX, user_id)
}
