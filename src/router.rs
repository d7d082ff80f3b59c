use axum::{
    Router,
    routing::{get, put},
};

use crate::{
    AppState,
    middleware::{identity_middleware, log_errors},
    routes,
};

// 用户相关的路由
fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users",
            get(routes::user::find_all).post(routes::user::create_user),
        )
        .route("/users/search", get(routes::user::search))
        .route(
            "/users/{id}",
            get(routes::user::find_one)
                .put(routes::user::update_user)
                .delete(routes::user::remove_user),
        )
}

// 屏蔽相关的路由，操作者来自令牌
fn block_routes() -> Router<AppState> {
    Router::new()
        .route("/block/{blocked_user_id}", put(routes::block::block_user))
        .route(
            "/block/{blocked_user_id}/unblock",
            put(routes::block::unblock_user),
        )
}

fn auth_routes() -> Router<AppState> {
    Router::new().route("/auth/token", get(routes::auth::get_token))
}

/// 创建主路由：身份中间件作用于所有路由，从不拒绝请求
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(user_routes())
        .merge(block_routes())
        .merge(auth_routes())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            identity_middleware,
        ));

    let base_uri = state.config.api_base_uri.trim_matches('/');
    let router = if base_uri.is_empty() {
        api
    } else {
        Router::new().nest(&format!("/{}", base_uri), api)
    };

    router
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
