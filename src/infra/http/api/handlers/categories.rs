//! Category handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::catalog::WriteMode;
use crate::domain::entities::CategoryRecord;

use super::{category_to_api, json_rejection_to_api, list_response, path_rejection_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::CategoryRequest;
use crate::infra::http::api::state::ApiState;

pub async fn list_categories(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let payload = state.categories.list().await.map_err(category_to_api)?;
    Ok(list_response(payload))
}

pub async fn get_category(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path.map_err(path_rejection_to_api)?;
    let category = state.categories.get(id).await.map_err(category_to_api)?;
    Ok(Json(category))
}

pub async fn create_category(
    State(state): State<ApiState>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let command = payload
        .into_command()
        .map_err(|violations| ApiError::invalid("Invalid category", violations))?;

    let category = state
        .categories
        .create(command)
        .await
        .map_err(category_to_api)?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn replace_category(
    state: State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    update_category(state, path, payload, WriteMode::Replace).await
}

pub async fn patch_category(
    state: State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    update_category(state, path, payload, WriteMode::Partial).await
}

async fn update_category(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
    mode: WriteMode,
) -> Result<Json<CategoryRecord>, ApiError> {
    let Path(id) = path.map_err(path_rejection_to_api)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let command = payload
        .into_command()
        .map_err(|violations| ApiError::invalid("Invalid category", violations))?;

    let category = state
        .categories
        .update(id, command, mode)
        .await
        .map_err(category_to_api)?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path.map_err(path_rejection_to_api)?;
    state.categories.delete(id).await.map_err(category_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
