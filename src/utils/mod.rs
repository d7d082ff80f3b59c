use axum::Json;
use chrono::{Months, NaiveDate, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Deserializer, Serialize};

use crate::config::TokenSettings;

/// 统一响应结构
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// 错误码，0表示成功
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resp_data: Option<T>,
}

pub fn success_to_api_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code: error_codes::SUCCESS,
        msg: "success".into(),
        resp_data: Some(data),
    })
}

pub fn error_to_api_response<T>(code: i32, msg: String) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        code,
        msg,
        resp_data: None,
    })
}

pub mod error_codes {
    pub const SUCCESS: i32 = 0;
    pub const VALIDATION_ERROR: i32 = 1000;
    pub const USER_EXISTS: i32 = 1001;
    pub const AUTH_FAILED: i32 = 1002;
    pub const NOT_FOUND: i32 = 1004;
    pub const RATE_LIMIT: i32 = 1005;
    pub const ALREADY_BLOCKED: i32 = 1006;
    pub const INTERNAL_ERROR: i32 = 5000;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 用户ID，兼容字符串与数字两种写法
    #[serde(deserialize_with = "subject_from_any")]
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    pub fn caller_id(&self) -> Option<i32> {
        self.sub.trim().parse().ok()
    }
}

fn subject_from_any<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawSubject {
        Text(String),
        Number(i64),
    }

    Ok(match RawSubject::deserialize(deserializer)? {
        RawSubject::Text(text) => text,
        RawSubject::Number(number) => number.to_string(),
    })
}

pub fn generate_token(
    user_id: i32,
    settings: &TokenSettings,
) -> Result<(String, i64), jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let expiration = now + settings.expiration.as_secs() as i64;

    let claims = Claims {
        sub: user_id.to_string(),
        exp: Some(expiration),
        iat: Some(now),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.secret.as_bytes()),
    )?;

    Ok((token, expiration))
}

/// 解析令牌。关闭签名校验时只解码载荷，不校验签名与过期时间
pub fn decode_token(
    token: &str,
    settings: &TokenSettings,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    if !settings.verify_signature {
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
    }

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// 年龄换算出生日期阈值：按日历年相减，2月29日落到平年时取2月28日
pub fn birthdate_for_age(today: NaiveDate, age: u32) -> Option<NaiveDate> {
    today.checked_sub_months(Months::new(age.checked_mul(12)?))
}
