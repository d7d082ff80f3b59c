use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;
use user_directory::{
    AppState, cache::MemoryCache, config::Config, database::MemoryUserStore, router,
};

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        redis_url: None,
        jwt_secret: "integration-secret".to_string(),
        jwt_expiration_secs: 3600,
        jwt_verify_signature: true,
        rate_limit_window_secs: 60,
        rate_limit_requests: 0,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        api_base_uri: String::new(),
    }
}

/// 基于内存存储和内存缓存构建完整路由
pub fn test_app_with(config: Config) -> Router {
    let state = AppState::new(
        config,
        Arc::new(MemoryUserStore::new()),
        Arc::new(MemoryCache::new()),
    );
    router::create_router(state)
}

pub fn test_app() -> Router {
    test_app_with(test_config())
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    read_json(response).await
}

async fn read_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// 创建用户并返回其ID
pub async fn create_user(app: &Router, username: &str, birthdate: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/users",
        None,
        Some(serde_json::json!({
            "username": username,
            "name": "Test",
            "surname": "User",
            "birthdate": birthdate,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create {} failed: {}", username, body);
    body["resp_data"]["id"].as_i64().unwrap()
}

pub async fn token_for(app: &Router, user_id: i64) -> String {
    let (status, body) = send(
        app,
        "GET",
        &format!("/auth/token?userId={}", user_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["resp_data"]["token"].as_str().unwrap().to_string()
}
