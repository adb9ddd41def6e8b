//! Configuration CRUD handlers: thin pass-through to the store.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use graphsync_db::Configuration;

use crate::models::ApiConfiguration;
use crate::router::ApiState;
use crate::ApiError;

/// List all configurations.
#[utoipa::path(
    get,
    path = "/v1/configs",
    responses((status = 200, description = "All configurations", body = Vec<ApiConfiguration>)),
    tag = "Configuration"
)]
pub async fn list(State(state): State<ApiState>) -> Result<Json<Vec<ApiConfiguration>>, ApiError> {
    let configs = Configuration::list(&state.pool).await?;
    Ok(Json(configs.into_iter().map(ApiConfiguration::from).collect()))
}

/// Fetch one configuration.
#[utoipa::path(
    get,
    path = "/v1/configs/{id}",
    params(("id" = i64, Path, description = "Configuration id")),
    responses(
        (status = 200, description = "The configuration", body = ApiConfiguration),
        (status = 404, description = "Unknown id"),
    ),
    tag = "Configuration"
)]
pub async fn get_one(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiConfiguration>, ApiError> {
    let config = Configuration::get(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("configuration {id} not found")))?;
    Ok(Json(config.into()))
}

/// Create a configuration.
#[utoipa::path(
    post,
    path = "/v1/configs",
    request_body = ApiConfiguration,
    responses((status = 201, description = "Created", body = ApiConfiguration)),
    tag = "Configuration"
)]
pub async fn create(
    State(state): State<ApiState>,
    Json(input): Json<ApiConfiguration>,
) -> Result<(StatusCode, Json<ApiConfiguration>), ApiError> {
    let created = Configuration::insert(&state.pool, input.into()).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Replace a configuration.
#[utoipa::path(
    put,
    path = "/v1/configs/{id}",
    params(("id" = i64, Path, description = "Configuration id")),
    request_body = ApiConfiguration,
    responses(
        (status = 200, description = "Updated", body = ApiConfiguration),
        (status = 404, description = "Unknown id"),
    ),
    tag = "Configuration"
)]
pub async fn update(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    Json(input): Json<ApiConfiguration>,
) -> Result<Json<ApiConfiguration>, ApiError> {
    let updated = Configuration::update(&state.pool, id, input.into())
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("configuration {id} not found")))?;
    Ok(Json(updated.into()))
}

/// Delete a configuration.
#[utoipa::path(
    delete,
    path = "/v1/configs/{id}",
    params(("id" = i64, Path, description = "Configuration id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Unknown id"),
    ),
    tag = "Configuration"
)]
pub async fn remove(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if Configuration::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("configuration {id} not found")))
    }
}
