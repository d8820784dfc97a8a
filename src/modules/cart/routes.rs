use std::{collections::HashMap, sync::Arc};

use super::repository;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::{
    modules::{
        auth::middleware::Auth,
        product::{self, repository::Product},
    },
    types::Context,
    utils::validation,
};

#[derive(Serialize)]
pub struct CartLine {
    pub product_id: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
    pub product: Product,
}

#[derive(Serialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub subtotal: BigDecimal,
}

/// Pairs cart rows with their products and prices each line. Rows whose
/// product has been deleted are dropped.
pub fn build_cart(items: Vec<repository::CartItem>, products: Vec<Product>) -> Cart {
    let products = products
        .into_iter()
        .map(|product| (product.id.clone(), product))
        .collect::<HashMap<_, _>>();

    let lines = items
        .into_iter()
        .filter_map(|item| {
            let product = products.get(&item.product_id)?.clone();
            let unit_price = product.unit_price_for(item.quantity);
            Some(CartLine {
                line_total: &unit_price * BigDecimal::from(item.quantity),
                unit_price,
                product_id: item.product_id,
                size: item.size,
                quantity: item.quantity,
                product,
            })
        })
        .collect::<Vec<_>>();

    let subtotal = lines
        .iter()
        .fold(BigDecimal::from(0), |acc, line| acc + &line.line_total);

    Cart {
        items: lines,
        subtotal,
    }
}

pub async fn load_cart(ctx: Arc<Context>, user_id: String) -> Result<Cart, repository::Error> {
    let items = repository::find_many_by_user_id(&ctx.db_conn.pool, user_id).await?;
    let product_ids = items
        .iter()
        .map(|item| item.product_id.clone())
        .collect::<Vec<_>>();
    let products = product::repository::find_many_by_ids(&ctx.db_conn.pool, product_ids)
        .await
        .map_err(|_| repository::Error::UnexpectedError)?;

    Ok(build_cart(items, products))
}

async fn get_cart(State(ctx): State<Arc<Context>>, auth: Auth) -> impl IntoResponse {
    match load_cart(ctx, auth.user.id).await {
        Ok(cart) => (StatusCode::OK, Json(json!(cart))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch cart" })),
        ),
    }
}

#[derive(Deserialize, Validate)]
struct SetCartItemPayload {
    #[validate(range(min = 0, max = 100, message = "Quantity must be between 0 and 100"))]
    quantity: i32,
    size: Option<String>,
}

async fn set_cart_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(product_id): Path<String>,
    Json(payload): Json<SetCartItemPayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    if payload.quantity == 0 {
        return match repository::delete_item(
            &ctx.db_conn.pool,
            auth.user.id,
            product_id,
            payload.size,
        )
        .await
        {
            Ok(_) => (
                StatusCode::OK,
                Json(json!({ "message": "Item removed from cart" })),
            ),
            Err(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to update cart" })),
            ),
        };
    }

    let product = match product::repository::find_by_id(&ctx.db_conn.pool, product_id).await {
        Ok(Some(product)) if product.is_active => product,
        Ok(_) => {
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

    if let Some(size) = &payload.size {
        if !product.sizes.contains(size) {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Size is not available for this product" })),
            );
        }
    }

    if payload.quantity > product.stock {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Not enough stock",
                "available": product.stock,
            })),
        );
    }

    match repository::set_item(
        &ctx.db_conn.pool,
        repository::SetCartItemPayload {
            user_id: auth.user.id,
            product_id: product.id,
            size: payload.size,
            quantity: payload.quantity,
        },
    )
    .await
    {
        Ok(item) => (StatusCode::OK, Json(json!(item))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update cart" })),
        ),
    }
}

#[derive(Deserialize)]
struct RemoveCartItemQuery {
    size: Option<String>,
}

async fn remove_cart_item(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Path(product_id): Path<String>,
    Query(query): Query<RemoveCartItemQuery>,
) -> impl IntoResponse {
    match repository::delete_item(&ctx.db_conn.pool, auth.user.id, product_id, query.size).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Item removed from cart" })),
        ),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Item is not in your cart" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update cart" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/", get(get_cart)).route(
        "/items/:product_id",
        put(set_cart_item).delete(remove_cart_item),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json as SqlJson;
    use std::str::FromStr;

    fn product(id: &str, price: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            slug: id.to_lowercase(),
            description: String::new(),
            category: "dresses".to_string(),
            price: BigDecimal::from_str(price).unwrap(),
            bulk_price: Some(BigDecimal::from_str("9000").unwrap()),
            bulk_min_quantity: Some(3),
            stock: 10,
            images: SqlJson(vec![]),
            sizes: SqlJson(vec![]),
            is_active: true,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    fn item(product_id: &str, quantity: i32) -> repository::CartItem {
        repository::CartItem {
            id: format!("item-{}", product_id),
            user_id: "01J9ZKUSER".to_string(),
            product_id: product_id.to_string(),
            size: None,
            quantity,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn prices_lines_with_bulk_tier_and_sums_subtotal() {
        let cart = build_cart(
            vec![item("A", 1), item("B", 3)],
            vec![product("A", "12000"), product("B", "10000")],
        );

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].line_total, BigDecimal::from(12000));
        assert_eq!(cart.items[1].unit_price, BigDecimal::from(9000));
        assert_eq!(cart.subtotal, BigDecimal::from(39000));
    }

    #[test]
    fn drops_rows_for_deleted_products() {
        let cart = build_cart(vec![item("A", 1), item("GONE", 2)], vec![product("A", "12000")]);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.subtotal, BigDecimal::from(12000));
    }
}
