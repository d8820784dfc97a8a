use std::sync::Arc;

use super::repository::{self, DiscountKind};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use validator::{Validate, ValidationError};

use crate::{
    modules::auth::middleware::AdminAuth,
    types::Context,
    utils::{pagination::Pagination, validation},
};

fn validate_positive(value: &BigDecimal) -> Result<(), ValidationError> {
    match value > &BigDecimal::zero() {
        true => Ok(()),
        false => Err(ValidationError::new("MUST_BE_POSITIVE")),
    }
}

#[derive(Deserialize, Validate)]
struct ValidateDiscountPayload {
    #[validate(length(min = 1, message = "Code is required"))]
    code: String,
    subtotal: BigDecimal,
}

async fn validate_discount(
    State(ctx): State<Arc<Context>>,
    Json(payload): Json<ValidateDiscountPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    let discount = match repository::find_by_code(&ctx.db_conn.pool, payload.code).await {
        Ok(Some(discount)) => discount,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Invalid discount code" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to validate discount code" })),
            )
        }
    };

    if let Err(rejection) = discount.check(&payload.subtotal, Utc::now().naive_utc()) {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": rejection.to_string() })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({
            "code": discount.code,
            "kind": discount.kind,
            "value": discount.value,
            "discount_amount": discount.amount_for(&payload.subtotal),
        })),
    )
}

async fn list_discounts(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many(&ctx.db_conn.pool, pagination).await {
        Ok(paginated_discounts) => (StatusCode::OK, Json(json!(paginated_discounts))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch discount codes" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct CreateDiscountPayload {
    #[validate(length(min = 3, max = 32, message = "Code must be 3 to 32 characters"))]
    code: String,
    kind: DiscountKind,
    #[validate(custom(function = "validate_positive"))]
    value: BigDecimal,
    min_order_amount: Option<BigDecimal>,
    #[validate(range(min = 1, message = "Max uses must be at least 1"))]
    max_uses: Option<i32>,
    expires_at: Option<NaiveDateTime>,
}

async fn create_discount(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Json(payload): Json<CreateDiscountPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    match repository::find_by_code(&ctx.db_conn.pool, payload.code.clone()).await {
        Ok(None) => (),
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Discount code already exists" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create discount code" })),
            )
        }
    };

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateDiscountPayload {
            code: payload.code,
            kind: payload.kind,
            value: payload.value,
            min_order_amount: payload.min_order_amount,
            max_uses: payload.max_uses,
            expires_at: payload.expires_at,
        },
    )
    .await
    {
        Ok(discount) => (StatusCode::CREATED, Json(json!(discount))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create discount code" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct UpdateDiscountPayload {
    kind: Option<DiscountKind>,
    #[validate(custom(function = "validate_positive"))]
    value: Option<BigDecimal>,
    min_order_amount: Option<BigDecimal>,
    #[validate(range(min = 1, message = "Max uses must be at least 1"))]
    max_uses: Option<i32>,
    expires_at: Option<NaiveDateTime>,
    is_active: Option<bool>,
}

async fn update_discount(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDiscountPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    match repository::update_by_id(
        &ctx.db_conn.pool,
        id,
        repository::UpdateDiscountPayload {
            kind: payload.kind,
            value: payload.value,
            min_order_amount: payload.min_order_amount,
            max_uses: payload.max_uses,
            expires_at: payload.expires_at,
            is_active: payload.is_active,
        },
    )
    .await
    {
        Ok(Some(discount)) => (StatusCode::OK, Json(json!(discount))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Discount code not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update discount code" })),
        ),
    }
}

async fn delete_discount(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::delete_by_id(&ctx.db_conn.pool, id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Discount code deleted successfully" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Discount code not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to delete discount code" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/validate", post(validate_discount))
}

pub fn get_admin_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list_discounts).post(create_discount))
        .route("/:id", put(update_discount).delete(delete_discount))
}
