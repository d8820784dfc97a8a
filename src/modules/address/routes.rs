use std::sync::Arc;

use super::repository;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    modules::auth::middleware::Auth,
    types::Context,
    utils::validation::{self, validate_phone_number},
};

#[derive(Deserialize, Validate)]
struct CreateAddressPayload {
    #[validate(length(min = 1, message = "Full name is required"))]
    full_name: String,
    #[validate(custom(function = "validate_phone_number"))]
    phone_number: String,
    #[validate(length(min = 1, message = "Address line is required"))]
    line1: String,
    line2: Option<String>,
    #[validate(length(min = 1, message = "City is required"))]
    city: String,
    #[validate(length(min = 1, message = "State is required"))]
    state: String,
    #[validate(length(min = 1, message = "Country is required"))]
    country: String,
    postal_code: Option<String>,
}

async fn list_addresses(State(ctx): State<Arc<Context>>, auth: Auth) -> impl IntoResponse {
    match repository::find_many_by_user_id(&ctx.db_conn.pool, auth.user.id).await {
        Ok(addresses) => (StatusCode::OK, Json(json!({ "data": addresses }))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch addresses" })),
        ),
    }
}

async fn create_address(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Json(payload): Json<CreateAddressPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateAddressPayload {
            user_id: auth.user.id,
            full_name: payload.full_name,
            phone_number: payload.phone_number,
            line1: payload.line1,
            line2: payload.line2,
            city: payload.city,
            state: payload.state,
            country: payload.country,
            postal_code: payload.postal_code,
        },
    )
    .await
    {
        Ok(address) => (StatusCode::CREATED, Json(json!(address))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create address" })),
        ),
    }
}

async fn delete_address(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::delete_by_id_and_user_id(&ctx.db_conn.pool, id, auth.user.id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Address deleted successfully" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Address not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete address" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/:id", delete(delete_address))
}
