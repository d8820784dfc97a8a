use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgExecutor;
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub price: BigDecimal,
    pub bulk_price: Option<BigDecimal>,
    pub bulk_min_quantity: Option<i32>,
    pub stock: i32,
    pub images: Json<Vec<String>>,
    pub sizes: Json<Vec<String>>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Product {
    /// Unit price for a line of `quantity`, switching to the bulk tier once it is reached.
    pub fn unit_price_for(&self, quantity: i32) -> BigDecimal {
        match (&self.bulk_price, self.bulk_min_quantity) {
            (Some(bulk_price), Some(min_quantity)) if min_quantity > 0 && quantity >= min_quantity => {
                bulk_price.clone()
            }
            _ => self.price.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.is_active && self.stock > 0
    }

    /// True when this version put a sold-out `previous` back on sale.
    pub fn is_restock_of(&self, previous: &Product) -> bool {
        previous.stock <= 0 && self.is_available()
    }
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

type Result<T> = std::result::Result<T, Error>;

pub struct CreateProductPayload {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
    pub price: BigDecimal,
    pub bulk_price: Option<BigDecimal>,
    pub bulk_min_quantity: Option<i32>,
    pub stock: i32,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: CreateProductPayload) -> Result<Product> {
    sqlx::query_as::<_, Product>(
        "
        INSERT INTO products (
            id,
            name,
            slug,
            description,
            category,
            price,
            bulk_price,
            bulk_min_quantity,
            stock,
            images,
            sizes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.name)
    .bind(payload.slug)
    .bind(payload.description)
    .bind(payload.category)
    .bind(payload.price)
    .bind(payload.bulk_price)
    .bind(payload.bulk_min_quantity)
    .bind(payload.stock)
    .bind(Json(payload.images))
    .bind(Json(payload.sizes))
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while creating a product: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching product {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn find_by_slug<'e, E: PgExecutor<'e>>(e: E, slug: String) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE slug = $1")
        .bind(slug.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching product by slug {}: {}", slug, err);
            Error::UnexpectedError
        })
}

pub async fn find_many_by_ids<'e, E: PgExecutor<'e>>(e: E, ids: Vec<String>) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching products by ids: {}", err);
            Error::UnexpectedError
        })
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Filters {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(skip)]
    pub include_inactive: bool,
}

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
    filters: Filters,
) -> Result<Paginated<Product>> {
    let search = filters.search.map(|search| format!("%{}%", search));

    let products = sqlx::query_as::<_, Product>(
        "
        SELECT * FROM products
        WHERE
            ($1::TEXT IS NULL OR name ILIKE $1 OR description ILIKE $1)
            AND ($2::TEXT IS NULL OR category = $2)
            AND ($3 OR is_active)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        ",
    )
    .bind(search.clone())
    .bind(filters.category.clone())
    .bind(filters.include_inactive)
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch many products: {}", err);
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>(
        "
        SELECT COUNT(id) FROM products
        WHERE
            ($1::TEXT IS NULL OR name ILIKE $1 OR description ILIKE $1)
            AND ($2::TEXT IS NULL OR category = $2)
            AND ($3 OR is_active)
        ",
    )
    .bind(search)
    .bind(filters.category)
    .bind(filters.include_inactive)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to count products: {}", err);
        Error::UnexpectedError
    })?;

    Ok(Paginated::new(products, total, &pagination))
}

#[derive(Default)]
pub struct UpdateProductPayload {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<BigDecimal>,
    pub bulk_price: Option<BigDecimal>,
    pub bulk_min_quantity: Option<i32>,
    pub stock: Option<i32>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateProductPayload,
) -> Result<Option<Product>> {
    sqlx::query_as::<_, Product>(
        "
        UPDATE products SET
            name = COALESCE($2, name),
            slug = COALESCE($3, slug),
            description = COALESCE($4, description),
            category = COALESCE($5, category),
            price = COALESCE($6, price),
            bulk_price = COALESCE($7, bulk_price),
            bulk_min_quantity = COALESCE($8, bulk_min_quantity),
            stock = COALESCE($9, stock),
            images = COALESCE($10, images),
            sizes = COALESCE($11, sizes),
            is_active = COALESCE($12, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(payload.name)
    .bind(payload.slug)
    .bind(payload.description)
    .bind(payload.category)
    .bind(payload.price)
    .bind(payload.bulk_price)
    .bind(payload.bulk_min_quantity)
    .bind(payload.stock)
    .bind(payload.images.map(Json))
    .bind(payload.sizes.map(Json))
    .bind(payload.is_active)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while updating product {}: {}", id, err);
        Error::UnexpectedError
    })
}

/// Takes `quantity` units out of stock; `false` when there is not enough left.
pub async fn decrement_stock<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    quantity: i32,
) -> Result<bool> {
    sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1 AND stock >= $2")
        .bind(id.clone())
        .bind(quantity)
        .execute(e)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while decrementing stock of product {}: {}", id, err);
            Error::UnexpectedError
        })
}

/// Puts the quantities of `order_id`'s items back on their products. Returns
/// the products that were sold out before and are on sale again.
pub async fn restore_stock_for_order<'e, E: PgExecutor<'e>>(
    e: E,
    order_id: String,
) -> Result<Vec<Product>> {
    sqlx::query_as::<_, Product>(
        "
        WITH restored AS (
            UPDATE products SET
                stock = products.stock + items.quantity,
                updated_at = NOW()
            FROM (
                SELECT product_id, SUM(quantity)::INT AS quantity
                FROM order_items
                WHERE order_id = $1
                GROUP BY product_id
            ) AS items
            WHERE products.id = items.product_id
            RETURNING products.*, items.quantity AS restored_quantity
        )
        SELECT * FROM restored WHERE stock = restored_quantity AND is_active
        ",
    )
    .bind(order_id.clone())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while restoring stock of order {}: {}", order_id, err);
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<bool> {
    sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id.clone())
        .execute(e)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while deleting product {}: {}", id, err);
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn product(bulk_price: Option<&str>, bulk_min_quantity: Option<i32>) -> Product {
        Product {
            id: "01J9ZKPRODUCT".to_string(),
            name: "Adire Kaftan".to_string(),
            slug: "adire-kaftan".to_string(),
            description: String::new(),
            category: "kaftans".to_string(),
            price: BigDecimal::from_str("25000").unwrap(),
            bulk_price: bulk_price.map(|price| BigDecimal::from_str(price).unwrap()),
            bulk_min_quantity,
            stock: 4,
            images: Json(vec![]),
            sizes: Json(vec!["M".to_string()]),
            is_active: true,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn bulk_tier_applies_from_the_minimum_quantity() {
        let product = product(Some("20000"), Some(5));

        assert_eq!(product.unit_price_for(4), BigDecimal::from_str("25000").unwrap());
        assert_eq!(product.unit_price_for(5), BigDecimal::from_str("20000").unwrap());
        assert_eq!(product.unit_price_for(12), BigDecimal::from_str("20000").unwrap());
    }

    #[test]
    fn incomplete_bulk_tier_is_ignored() {
        assert_eq!(
            product(Some("20000"), None).unit_price_for(50),
            BigDecimal::from_str("25000").unwrap()
        );
        assert_eq!(
            product(None, Some(2)).unit_price_for(50),
            BigDecimal::from_str("25000").unwrap()
        );
    }

    #[test]
    fn inactive_or_empty_products_are_unavailable() {
        let mut product = product(None, None);
        assert!(product.is_available());

        product.stock = 0;
        assert!(!product.is_available());

        product.stock = 3;
        product.is_active = false;
        assert!(!product.is_available());
    }

    #[test]
    fn restock_means_going_from_sold_out_to_available() {
        let mut previous = product(None, None);
        previous.stock = 0;
        let mut updated = previous.clone();
        updated.stock = 6;

        assert!(updated.is_restock_of(&previous));

        updated.is_active = false;
        assert!(!updated.is_restock_of(&previous));

        updated.is_active = true;
        previous.stock = 2;
        assert!(!updated.is_restock_of(&previous));

        previous.stock = 0;
        updated.stock = 0;
        assert!(!updated.is_restock_of(&previous));
    }
}
