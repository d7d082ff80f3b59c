use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::{
    AppState,
    error::AppResult,
    middleware::CallerId,
    routes::{ApiJson, ApiPath, ApiQuery},
    services::SearchCriteria,
    utils::success_to_api_response,
};

use super::model::{CreateUserRequest, DeleteUserResponse, SearchQuery, UpdateUserRequest};

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.create(req.into()).await?;
    Ok((StatusCode::CREATED, success_to_api_response(user)))
}

#[axum::debug_handler]
pub async fn find_all(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let users = state.users.find_all().await?;
    Ok(success_to_api_response(users))
}

#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    caller: CallerId,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> AppResult<impl IntoResponse> {
    let criteria = SearchCriteria::try_from(query)?;
    let users = state.users.search(caller.0, criteria).await?;
    Ok(success_to_api_response(users))
}

#[axum::debug_handler]
pub async fn find_one(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.find_one(id).await?;
    Ok(success_to_api_response(user))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.users.update(id, req.into()).await?;
    Ok(success_to_api_response(user))
}

#[axum::debug_handler]
pub async fn remove_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AppResult<impl IntoResponse> {
    state.users.remove(id).await?;
    Ok(success_to_api_response(DeleteUserResponse { id }))
}
