use config::Config;
use std::sync::Arc;

use services::{AuthService, UserService};

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod services;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    /// 由已装配好的存储与缓存构建应用状态
    pub fn new(
        config: Config,
        store: Arc<dyn database::UserStore>,
        cache: Arc<dyn cache::Cache>,
    ) -> Self {
        let users = Arc::new(UserService::new(store, cache));
        let auth = Arc::new(AuthService::new(users.clone(), config.token_settings()));
        Self {
            config,
            users,
            auth,
        }
    }
}
