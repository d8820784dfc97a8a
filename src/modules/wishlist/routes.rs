use std::sync::Arc;

use super::repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::{
    modules::{auth::middleware::Auth, product},
    types::Context,
};

async fn get_wishlist(State(ctx): State<Arc<Context>>, auth: Auth) -> impl IntoResponse {
    match repository::find_products_by_user_id(&ctx.db_conn.pool, auth.user.id).await {
        Ok(products) => (StatusCode::OK, Json(json!({ "data": products }))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch wishlist" })),
        ),
    }
}

async fn add_to_wishlist(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    match product::repository::find_by_id(&ctx.db_conn.pool, product_id.clone()).await {
        Ok(Some(_)) => (),
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Product not found" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch product" })),
            )
        }
    };

    match repository::add(&ctx.db_conn.pool, auth.user.id, product_id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Added to wishlist" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to add to wishlist" })),
        ),
    }
}

async fn remove_from_wishlist(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    match repository::remove(&ctx.db_conn.pool, auth.user.id, product_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Removed from wishlist" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Product is not in your wishlist" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to remove from wishlist" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(get_wishlist))
        .route(
            "/:product_id",
            post(add_to_wishlist).delete(remove_from_wishlist),
        )
}
