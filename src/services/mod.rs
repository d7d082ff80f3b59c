// 业务服务
pub mod auth;
pub mod user;

pub use auth::AuthService;
pub use user::{SearchCriteria, UserService};
