use axum::{extract::State, response::IntoResponse};

use crate::{
    AppState, error::AppResult, middleware::CallerId, routes::ApiPath,
    utils::success_to_api_response,
};

/// 以调用方身份屏蔽指定用户
#[axum::debug_handler]
pub async fn block_user(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(blocked_user_id): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.block_user(caller.0, blocked_user_id).await?;
    Ok(success_to_api_response(user))
}

#[axum::debug_handler]
pub async fn unblock_user(
    State(state): State<AppState>,
    caller: CallerId,
    ApiPath(blocked_user_id): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.unblock_user(caller.0, blocked_user_id).await?;
    Ok(success_to_api_response(user))
}
