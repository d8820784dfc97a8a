use std::sync::Arc;

use super::repository;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use bigdecimal::{BigDecimal, Zero};
use serde::Deserialize;
use serde_json::json;
use validator::{Validate, ValidationError};

use crate::{
    modules::{auth::middleware::AdminAuth, back_in_stock, notification::service::Mailer},
    types::Context,
    utils::{
        pagination::Pagination,
        validation::{self, validate_slug},
    },
};

fn validate_price(price: &BigDecimal) -> Result<(), ValidationError> {
    match price > &BigDecimal::zero() {
        true => Ok(()),
        false => Err(ValidationError::new("INVALID_PRICE")),
    }
}

async fn list_products(
    State(ctx): State<Arc<Context>>,
    pagination: Pagination,
    Query(filters): Query<repository::Filters>,
) -> impl IntoResponse {
    match repository::find_many(&ctx.db_conn.pool, pagination, filters).await {
        Ok(paginated_products) => (StatusCode::OK, Json(json!(paginated_products))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch products" })),
        ),
    }
}

async fn get_product(
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let product = match repository::find_by_id(&ctx.db_conn.pool, id.clone()).await {
        Ok(None) => repository::find_by_slug(&ctx.db_conn.pool, id).await,
        result => result,
    };

    match product {
        Ok(Some(product)) if product.is_active => (StatusCode::OK, Json(json!(product))),
        Ok(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Product not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch product" })),
        ),
    }
}

async fn list_all_products(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
    Query(mut filters): Query<repository::Filters>,
) -> impl IntoResponse {
    filters.include_inactive = true;

    match repository::find_many(&ctx.db_conn.pool, pagination, filters).await {
        Ok(paginated_products) => (StatusCode::OK, Json(json!(paginated_products))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch products" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct CreateProductPayload {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    #[validate(custom(function = "validate_slug"))]
    slug: String,
    #[serde(default)]
    description: String,
    #[validate(length(min = 1, message = "Category is required"))]
    category: String,
    #[validate(custom(function = "validate_price"))]
    price: BigDecimal,
    bulk_price: Option<BigDecimal>,
    #[validate(range(min = 2, message = "Bulk pricing needs a minimum quantity of at least 2"))]
    bulk_min_quantity: Option<i32>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    #[serde(default)]
    stock: i32,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    sizes: Vec<String>,
}

async fn create_product(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Json(payload): Json<CreateProductPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    match repository::find_by_slug(&ctx.db_conn.pool, payload.slug.clone()).await {
        Ok(None) => (),
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Slug already in use" })),
            )
        }
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create product" })),
            )
        }
    };

    match repository::create(
        &ctx.db_conn.pool,
        repository::CreateProductPayload {
            name: payload.name,
            slug: payload.slug,
            description: payload.description,
            category: payload.category,
            price: payload.price,
            bulk_price: payload.bulk_price,
            bulk_min_quantity: payload.bulk_min_quantity,
            stock: payload.stock,
            images: payload.images,
            sizes: payload.sizes,
        },
    )
    .await
    {
        Ok(product) => (StatusCode::CREATED, Json(json!(product))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to create product" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct UpdateProductPayload {
    name: Option<String>,
    #[validate(custom(function = "validate_slug"))]
    slug: Option<String>,
    description: Option<String>,
    category: Option<String>,
    #[validate(custom(function = "validate_price"))]
    price: Option<BigDecimal>,
    bulk_price: Option<BigDecimal>,
    #[validate(range(min = 2, message = "Bulk pricing needs a minimum quantity of at least 2"))]
    bulk_min_quantity: Option<i32>,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    stock: Option<i32>,
    images: Option<Vec<String>>,
    sizes: Option<Vec<String>>,
    is_active: Option<bool>,
}

async fn update_product(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateProductPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    let previous = match repository::find_by_id(&ctx.db_conn.pool, id.clone()).await {
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
                Json(json!({ "error": "Failed to update product" })),
            )
        }
    };

    let product = match repository::update_by_id(
        &ctx.db_conn.pool,
        id,
        repository::UpdateProductPayload {
            name: payload.name,
            slug: payload.slug,
            description: payload.description,
            category: payload.category,
            price: payload.price,
            bulk_price: payload.bulk_price,
            bulk_min_quantity: payload.bulk_min_quantity,
            stock: payload.stock,
            images: payload.images,
            sizes: payload.sizes,
            is_active: payload.is_active,
        },
    )
    .await
    {
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
                Json(json!({ "error": "Failed to update product" })),
            )
        }
    };

    if product.is_restock_of(&previous) {
        let ctx = ctx.clone();
        let restocked = product.clone();
        tokio::spawn(async move {
            let mailer = Mailer::new(ctx.clone());
            back_in_stock::service::notify_subscribers(ctx, &mailer, restocked).await;
        });
    }

    (StatusCode::OK, Json(json!(product)))
}

async fn delete_product(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match repository::delete_by_id(&ctx.db_conn.pool, id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Product deleted successfully" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Product not found" })),
        ),
        Err(_) => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "Product could not be deleted, deactivate it instead" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

pub fn get_admin_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list_all_products).post(create_product))
        .route("/:id", put(update_product).delete(delete_product))
}
