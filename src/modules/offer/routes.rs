use std::sync::Arc;

use super::repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    modules::auth::middleware::AdminAuth,
    types::Context,
    utils::{pagination::Pagination, validation},
};

async fn list_running_offers(State(ctx): State<Arc<Context>>) -> impl IntoResponse {
    let now = Utc::now().naive_utc();

    match repository::find_active(&ctx.db_conn.pool).await {
        Ok(offers) => {
            let offers = offers
                .into_iter()
                .filter(|offer| offer.is_running(now))
                .collect::<Vec<_>>();
            (StatusCode::OK, Json(json!({ "data": offers })))
        }
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch offers" })),
        ),
    }
}

async fn list_offers(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many(&ctx.db_conn.pool, pagination).await {
        Ok(paginated_offers) => (StatusCode::OK, Json(json!(paginated_offers))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch offers" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct CreateOfferPayload {
    #[validate(length(min = 1, message = "Title is required"))]
    title: String,
    subtitle: Option<String>,
    #[validate(url(message = "Image must be a valid url"))]
    image_url: String,
    link: Option<String>,
    starts_at: Option<NaiveDateTime>,
    ends_at: Option<NaiveDateTime>,
}

async fn create_offer(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Json(payload): Json<CreateOfferPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    if let (Some(starts_at), Some(ends_at)) = (payload.starts_at, payload.ends_at) {
        if ends_at <= starts_at {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Offer must end after it starts" })),
            );
        }
    }

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateOfferPayload {
            title: payload.title,
            subtitle: payload.subtitle,
            image_url: payload.image_url,
            link: payload.link,
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
        },
    )
    .await
    {
        Ok(offer) => (StatusCode::CREATED, Json(json!(offer))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create offer" })),
        ),
    }
}

#[derive(Deserialize)]
struct UpdateOfferPayload {
    title: Option<String>,
    subtitle: Option<String>,
    image_url: Option<String>,
    link: Option<String>,
    is_active: Option<bool>,
    starts_at: Option<NaiveDateTime>,
    ends_at: Option<NaiveDateTime>,
}

async fn update_offer(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateOfferPayload>,
) -> impl IntoResponse {
    match repository::update_by_id(
        &ctx.db_conn.pool,
        id,
        repository::UpdateOfferPayload {
            title: payload.title,
            subtitle: payload.subtitle,
            image_url: payload.image_url,
            link: payload.link,
            is_active: payload.is_active,
            starts_at: payload.starts_at,
            ends_at: payload.ends_at,
        },
    )
    .await
    {
        Ok(Some(offer)) => (StatusCode::OK, Json(json!(offer))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Offer not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update offer" })),
        ),
    }
}

async fn delete_offer(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::delete_by_id(&ctx.db_conn.pool, id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Offer deleted successfully" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Offer not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete offer" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/", get(list_running_offers))
}

pub fn get_admin_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list_offers).post(create_offer))
        .route("/:id", put(update_offer).delete(delete_offer))
}
