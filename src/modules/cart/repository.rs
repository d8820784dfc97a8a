use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub struct SetCartItemPayload {
    pub user_id: String,
    pub product_id: String,
    pub size: Option<String>,
    pub quantity: i32,
}

pub async fn set_item<'e, E: PgExecutor<'e>>(
    e: E,
    payload: SetCartItemPayload,
) -> Result<CartItem, Error> {
    sqlx::query_as::<_, CartItem>(
        "
        INSERT INTO cart_items (id, user_id, product_id, size, quantity)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, product_id, (COALESCE(size, ''))) DO UPDATE SET
            quantity = EXCLUDED.quantity,
            updated_at = NOW()
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.user_id.clone())
    .bind(payload.product_id)
    .bind(payload.size)
    .bind(payload.quantity)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while setting cart item for user {}: {}",
            payload.user_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_many_by_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
) -> Result<Vec<CartItem>, Error> {
    sqlx::query_as::<_, CartItem>(
        "SELECT * FROM cart_items WHERE user_id = $1 ORDER BY created_at ASC",
    )
    .bind(user_id.clone())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching cart of user {}: {}", user_id, err);
        Error::UnexpectedError
    })
}

/// Removes one line. Each size of a product is its own line.
pub async fn delete_item<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
    product_id: String,
    size: Option<String>,
) -> Result<bool, Error> {
    sqlx::query(
        "DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2 AND size IS NOT DISTINCT FROM $3",
    )
    .bind(user_id.clone())
    .bind(product_id)
    .bind(size)
    .execute(e)
    .await
    .map(|result| result.rows_affected() > 0)
    .map_err(|err| {
        tracing::error!("Error occurred while removing cart item of user {}: {}", user_id, err);
        Error::UnexpectedError
    })
}

/// Empties one user's cart. Returns how many items were removed.
pub async fn delete_by_user_id<'e, E: PgExecutor<'e>>(e: E, user_id: String) -> Result<u64, Error> {
    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id.clone())
        .execute(e)
        .await
        .map(|result| result.rows_affected())
        .map_err(|err| {
            tracing::error!("Error occurred while clearing cart of user {}: {}", user_id, err);
            Error::UnexpectedError
        })
}
