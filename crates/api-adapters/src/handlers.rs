//! JSON handlers. Each one unpacks the request, calls exactly one service
//! or identity operation, and shapes the reply.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use domains::{
    AgeGroup, CommentDraft, CommentId, DomainError, PostDraft, PostId, Registration, Role, User,
};

use crate::error::ApiError;
use crate::extract::{ApiJson, CurrentUser};
use crate::json::ThreadJson;
use crate::router::AppState;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub age_group: AgeGroup,
}

fn session(state: &AppState, user: &User) -> ApiResult<Json<LoginResponse>> {
    let token = state.tokens.issue_token(user)?;
    Ok(Json(LoginResponse {
        token,
        username: user.username.clone(),
        role: user.role,
        age_group: user.age_group,
    }))
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(registration): ApiJson<Registration>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state.identity.create_account(registration).await?;
    info!(user = %user.username, "account registered");
    session(&state, &user)
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .identity
        .verify_credentials(&request.username, &request.password)
        .await?;
    info!(user = %user.username, "login succeeded");
    session(&state, &user)
}

pub async fn list_posts(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
) -> ApiResult<Response> {
    let posts = state.content.list_posts(&requester).await?;
    Ok(ThreadJson(posts).into_response())
}

pub async fn get_post(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
    Path(id): Path<PostId>,
) -> ApiResult<Response> {
    let post = state.content.get_post(id, &requester).await?;
    Ok(ThreadJson(post).into_response())
}

pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
    ApiJson(draft): ApiJson<PostDraft>,
) -> ApiResult<Response> {
    let post = state.content.create_post(draft, &requester).await?;
    Ok((StatusCode::CREATED, ThreadJson(post)).into_response())
}

pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
    Path(id): Path<PostId>,
    ApiJson(draft): ApiJson<PostDraft>,
) -> ApiResult<Response> {
    let post = state.content.update_post(id, draft, &requester).await?;
    Ok(ThreadJson(post).into_response())
}

pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
    Path(id): Path<PostId>,
) -> ApiResult<StatusCode> {
    if state.content.delete_post(id, &requester).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DomainError::not_found("post", id).into())
    }
}

pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
    ApiJson(draft): ApiJson<CommentDraft>,
) -> ApiResult<Response> {
    let comment = state.comments.create_comment(draft, &requester).await?;
    Ok((StatusCode::CREATED, ThreadJson(comment)).into_response())
}

/// Not-found and not-allowed both answer 404.
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(requester): CurrentUser,
    Path(id): Path<CommentId>,
) -> ApiResult<StatusCode> {
    if state.comments.delete_comment(id, &requester).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(DomainError::not_found("comment", id).into())
    }
}
