use std::env;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub jwt_verify_signature: bool,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

/// 令牌签发与解析所需的参数
#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub expiration: Duration,
    pub verify_signature: bool,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        // 过期时间以小时计，允许 "24h" 形式
        let jwt_expiration = match optional("JWT_EXPIRATION") {
            Some(value) => value
                .trim()
                .trim_end_matches('h')
                .parse::<u64>()
                .map_err(|_| ConfigError::Invalid {
                    name: "JWT_EXPIRATION",
                    value,
                })?,
            None => 1,
        };

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            redis_url: optional("REDIS_URL"),
            jwt_secret: required("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            jwt_verify_signature: parsed_or("JWT_VERIFY_SIGNATURE", true)?,
            rate_limit_window_secs: parsed_or("RATE_LIMIT_WINDOW", 60)?,
            rate_limit_requests: parsed_or("RATE_LIMIT_REQUESTS", 100)?,
            server_host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parsed_or("SERVER_PORT", 5000)?,
            api_base_uri: optional("API_BASE_URI").unwrap_or_default(),
        })
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.jwt_secret.clone(),
            expiration: self.jwt_expiration(),
            verify_signature: self.jwt_verify_signature,
        }
    }
}

#[cfg(test)]
impl Config {
    /// 测试用配置，不依赖环境变量
    pub fn for_tests() -> Self {
        Config {
            database_url: String::new(),
            redis_url: None,
            jwt_secret: "test-secret".to_string(),
            jwt_expiration_secs: 3600,
            jwt_verify_signature: true,
            rate_limit_window_secs: 60,
            rate_limit_requests: 0,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            api_base_uri: String::new(),
        }
    }
}
