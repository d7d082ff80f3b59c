/// 缓存键模块
/// 提供缓存键生成函数
pub mod user_keys;

pub use user_keys::{USERS_KEY, user_key};
