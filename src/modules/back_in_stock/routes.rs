use std::sync::Arc;

use super::repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{modules::product, types::Context, utils::validation};

#[derive(Deserialize, Validate)]
struct NotifyMePayload {
    #[validate(email(code = "INVALID_EMAIL", message = "Invalid email address"))]
    email: String,
}

async fn notify_me(
    State(ctx): State<Arc<Context>>,
    Path(product_id): Path<String>,
    Json(payload): Json<NotifyMePayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    let product = match product::repository::find_by_id(&ctx.db_conn.pool, product_id).await {
        Ok(Some(product)) => product,
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

    if product.is_available() {
        return (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Product is already in stock" })),
        );
    }

    match repository::subscribe(&ctx.db_conn.pool, product.id, payload.email).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "We will email you when it is back in stock" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to subscribe" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/:id/notify-me", post(notify_me))
}
