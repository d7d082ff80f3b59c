use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, error::AppError, services::AuthService};

/// 请求方的用户ID，由身份中间件写入请求扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub i32);

/// 从 `Authorization: Bearer <token>` 中解析调用方。
/// 缺失或无法解析时返回 `None`，只记录日志
pub fn resolve_caller(headers: &HeaderMap, auth: &AuthService) -> Option<CallerId> {
    let bearer = match headers.typed_try_get::<Authorization<Bearer>>() {
        Ok(Some(Authorization(bearer))) => bearer,
        Ok(None) => return None,
        Err(e) => {
            tracing::debug!("Ignoring malformed Authorization header: {}", e);
            return None;
        }
    };

    let claims = match auth.decode(bearer.token()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("Failed to decode JWT: {}", e);
            return None;
        }
    };

    match claims.caller_id() {
        Some(id) => Some(CallerId(id)),
        None => {
            tracing::warn!("JWT subject is not a user id: {}", claims.sub);
            None
        }
    }
}

/// 身份中间件：从不拒绝请求，解析成功时附加 `CallerId`
pub async fn identity_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(caller) = resolve_caller(request.headers(), &state.auth) {
        tracing::debug!("Request from user {}", caller.0);
        request.extensions_mut().insert(caller);
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerId>()
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Missing or invalid bearer token".to_string()))
    }
}
