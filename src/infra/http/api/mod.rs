pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{Router, routing::get};

/// Catalog resource routes. Only the trailing-slash forms are registered.
pub fn build_api_router(state: ApiState) -> Router {
    Router::new()
        .route(
            "/categories/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/{id}/",
            get(handlers::get_category)
                .put(handlers::replace_category)
                .patch(handlers::patch_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/products/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/products/{id}/",
            get(handlers::get_product)
                .put(handlers::replace_product)
                .patch(handlers::patch_product)
                .delete(handlers::delete_product),
        )
        .with_state(state)
}
