//! User management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::users::{CreateUserRequest, ListUsersQuery, UpdateUserRequest, UserResponse};
use crate::models::CreateUser;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// `GET /users` — list users with optional substring search and active
/// filter.
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, AppError> {
    let users = state
        .db
        .list_users(params.search.as_deref(), params.is_active)
        .await?;

    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

/// `GET /users/{id}`.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", user_id)))?;

    Ok(Json(UserResponse::from(user)))
}

/// `POST /users`.
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = CreateUser::from(req);
    let user = state.db.create_user(&input).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// `PATCH /users/{id}` — the active flag is the only mutable field.
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .db
        .update_user(user_id, req.is_active)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User {} not found", user_id)))?;

    Ok(Json(UserResponse::from(user)))
}
