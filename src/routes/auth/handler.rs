use axum::{extract::State, response::IntoResponse};

use crate::{AppState, error::AppResult, routes::ApiQuery, utils::success_to_api_response};

use super::model::{TokenQuery, TokenResponse};

#[axum::debug_handler]
pub async fn get_token(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<TokenQuery>,
) -> AppResult<impl IntoResponse> {
    let (token, expires_at) = state.auth.generate_token(query.user_id).await?;
    Ok(success_to_api_response(TokenResponse { token, expires_at }))
}
