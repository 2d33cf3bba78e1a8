//! API handlers organized by resource type.
//!
//! Error conversion helpers shared by the resource modules live here.

mod categories;
mod products;

pub use categories::*;
pub use products::*;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;

use crate::application::catalog::{CategoryError, ListPayload, ProductError, Violations};
use crate::application::repos::RepoError;

use super::error::{ApiError, codes};

pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Serve a serialized list verbatim, tagged with its cache outcome.
pub(crate) fn list_response(payload: ListPayload) -> Response {
    let mut response = Response::new(Body::from(payload.body));
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(payload.cache.as_str()),
    );
    response
}

pub(crate) fn json_rejection_to_api(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("Malformed request body", Some(rejection.body_text()))
}

pub(crate) fn path_rejection_to_api(_rejection: PathRejection) -> ApiError {
    ApiError::not_found("Resource not found")
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

pub(crate) fn category_to_api(err: CategoryError) -> ApiError {
    match err {
        CategoryError::NotFound => ApiError::not_found("Category not found"),
        CategoryError::Invalid(violations) => ApiError::invalid("Invalid category", violations),
        CategoryError::InUse { count } => ApiError::new(
            StatusCode::CONFLICT,
            codes::CATEGORY_IN_USE,
            "Category is referenced by products",
            Some(format!("{count} products reference this category")),
        ),
        CategoryError::Encode(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Failed to encode response",
            Some(err.to_string()),
        ),
        CategoryError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn product_to_api(err: ProductError) -> ApiError {
    match err {
        ProductError::NotFound => ApiError::not_found("Product not found"),
        ProductError::Invalid(violations) => ApiError::invalid("Invalid product", violations),
        ProductError::Filter(err) => ApiError::invalid(
            "Invalid product filter",
            Violations::single(err.param, err.source.to_string()),
        ),
        ProductError::Encode(err) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Failed to encode response",
            Some(err.to_string()),
        ),
        ProductError::Repo(err) => repo_to_api(err),
    }
}
