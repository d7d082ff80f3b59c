use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user_directory::{
    AppState,
    cache::{Cache, MemoryCache, RedisCache},
    config::Config,
    database::PgUserStore,
    middleware::{RateLimiter, rate_limit},
    router,
};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    if !config.jwt_verify_signature {
        tracing::warn!("JWT signature verification is disabled; bearer tokens are trusted as-is");
    }

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'user_directory';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let store = PgUserStore::new(pool);
    store
        .ensure_schema()
        .await
        .expect("Failed to prepare users schema");

    // 未配置 Redis 时退回进程内缓存，且不启用限流
    let redis_client = config.redis_url.as_ref().map(|url| {
        Arc::new(redis::Client::open(url.as_str()).expect("Failed to create Redis client"))
    });
    let cache: Arc<dyn Cache> = match &redis_client {
        Some(client) => Arc::new(
            RedisCache::connect(client)
                .await
                .expect("Failed to connect to Redis"),
        ),
        None => {
            tracing::info!("REDIS_URL not set, using in-process cache");
            Arc::new(MemoryCache::new())
        }
    };

    let state = AppState::new(config.clone(), Arc::new(store), cache);
    let router = router::create_router(state);

    let router = match redis_client {
        Some(client) if config.rate_limit_requests > 0 => {
            let limiter = Arc::new(RateLimiter::new(
                client,
                config.rate_limit_requests,
                config.rate_limit_window(),
            ));
            router.layer(axum::middleware::from_fn_with_state(limiter, rate_limit))
        }
        _ => router,
    };

    // 开发模式允许所有来源
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
