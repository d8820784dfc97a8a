use std::sync::Arc;

use super::repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    modules::{auth::middleware::Auth, product},
    types::Context,
    utils::validation,
};

#[derive(Deserialize, Validate)]
struct CreateReviewPayload {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    rating: i32,
    #[validate(length(max = 2000, message = "Comment is too long"))]
    #[serde(default)]
    comment: String,
}

async fn list_reviews(
    State(ctx): State<Arc<Context>>,
    Path(product_id): Path<String>,
) -> impl IntoResponse {
    match repository::find_many_by_product_id(&ctx.db_conn.pool, product_id).await {
        Ok(reviews) => (
            StatusCode::OK,
            Json(json!({
                "average_rating": repository::average_rating(&reviews),
                "data": reviews,
            })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch reviews" })),
        ),
    }
}

async fn create_review(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(product_id): Path<String>,
    Json(payload): Json<CreateReviewPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

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

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateReviewPayload {
            product_id,
            user_id: auth.user.id,
            rating: payload.rating,
            comment: payload.comment,
        },
    )
    .await
    {
        Ok(review) => (StatusCode::CREATED, Json(json!(review))),
        Err(repository::Error::AlreadyReviewed) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "You have already reviewed this product" })),
        ),
        Err(repository::Error::UnexpectedError) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create review" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/:id/reviews", get(list_reviews).post(create_review))
}
