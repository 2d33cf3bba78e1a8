//! Product handlers

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::catalog::WriteMode;
use crate::domain::entities::ProductRecord;

use super::{json_rejection_to_api, list_response, path_rejection_to_api, product_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::ProductRequest;
use crate::infra::http::api::state::ApiState;

pub async fn list_products(
    State(state): State<ApiState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let payload = state
        .products
        .list(query.as_deref())
        .await
        .map_err(product_to_api)?;
    Ok(list_response(payload))
}

pub async fn get_product(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path.map_err(path_rejection_to_api)?;
    let product = state.products.get(id).await.map_err(product_to_api)?;
    Ok(Json(product))
}

pub async fn create_product(
    State(state): State<ApiState>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let command = payload
        .into_command()
        .map_err(|violations| ApiError::invalid("Invalid product", violations))?;

    let product = state
        .products
        .create(command)
        .await
        .map_err(product_to_api)?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn replace_product(
    state: State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    update_product(state, path, payload, WriteMode::Replace).await
}

pub async fn patch_product(
    state: State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    update_product(state, path, payload, WriteMode::Partial).await
}

async fn update_product(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
    mode: WriteMode,
) -> Result<Json<ProductRecord>, ApiError> {
    let Path(id) = path.map_err(path_rejection_to_api)?;
    let Json(payload) = payload.map_err(json_rejection_to_api)?;
    let command = payload
        .into_command()
        .map_err(|violations| ApiError::invalid("Invalid product", violations))?;

    let product = state
        .products
        .update(id, command, mode)
        .await
        .map_err(product_to_api)?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<ApiState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = path.map_err(path_rejection_to_api)?;
    state.products.delete(id).await.map_err(product_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
