//! Access grant handlers.
//!
//! Every operation here goes through the store's transactional read/write
//! paths, which run the lazy expiry sweep before touching any grant.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::accesses::{
    AccessResponse, CreateAccessRequest, ListAccessesQuery, UpdateAccessRequest,
};
use crate::models::{AccessFilter, CreateAccess};
use crate::startup::AppState;
use crate::utils::ValidatedJson;
use crate::utils::time::parse_timestamp;

/// `GET /accesses` — search grants with conjunctive optional filters.
pub async fn list_accesses(
    State(state): State<AppState>,
    Query(params): Query<ListAccessesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let expires_before = params
        .expires_before
        .as_deref()
        .map(parse_timestamp)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let filter = AccessFilter {
        user_id: params.user_id,
        resource_id: params.resource_id,
        status: params.status,
        expires_before,
    };

    let accesses = state.db.list_accesses(&filter).await?;

    Ok(Json(
        accesses
            .into_iter()
            .map(AccessResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// `GET /accesses/{id}`.
pub async fn get_access(
    State(state): State<AppState>,
    Path(access_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let access = state
        .db
        .get_access(access_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Access {} not found", access_id)))?;

    Ok(Json(AccessResponse::from(access)))
}

/// `POST /accesses` — grant a user access to a resource until the given
/// expiry.
pub async fn create_access(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateAccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = CreateAccess::from(req);
    let access = state
        .db
        .create_access(&input, state.config.duplicate_grant_policy)
        .await?;

    Ok((StatusCode::CREATED, Json(AccessResponse::from(access))))
}

/// `PATCH /accesses/{id}` — request a lifecycle transition and/or update
/// expiry and comment.
pub async fn update_access(
    State(state): State<AppState>,
    Path(access_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateAccessRequest>,
) -> Result<impl IntoResponse, AppError> {
    let access = state
        .db
        .update_access(access_id, req.status, req.expires_at, req.comment.as_deref())
        .await?;

    Ok(Json(AccessResponse::from(access)))
}
