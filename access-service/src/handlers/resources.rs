//! Resource management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::resources::{
    CreateResourceRequest, ListResourcesQuery, ResourceResponse, UpdateResourceRequest,
};
use crate::models::CreateResource;
use crate::startup::AppState;
use crate::utils::ValidatedJson;

/// `GET /resources` — list resources with optional name substring and
/// enabled filters.
pub async fn list_resources(
    State(state): State<AppState>,
    Query(params): Query<ListResourcesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let resources = state
        .db
        .list_resources(params.name.as_deref(), params.is_enabled)
        .await?;

    Ok(Json(
        resources
            .into_iter()
            .map(ResourceResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// `GET /resources/{id}`.
pub async fn get_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state.db.get_resource(resource_id).await?.ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("Resource {} not found", resource_id))
    })?;

    Ok(Json(ResourceResponse::from(resource)))
}

/// `POST /resources`.
pub async fn create_resource(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let input = CreateResource::from(req);
    let resource = state.db.create_resource(&input).await?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))))
}

/// `PATCH /resources/{id}` — description and enabled flag are the only
/// mutable fields.
pub async fn update_resource(
    State(state): State<AppState>,
    Path(resource_id): Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateResourceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let resource = state
        .db
        .update_resource(resource_id, req.description.as_deref(), req.is_enabled)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Resource {} not found", resource_id))
        })?;

    Ok(Json(ResourceResponse::from(resource)))
}
