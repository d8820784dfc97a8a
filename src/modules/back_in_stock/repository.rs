use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Subscription {
    pub id: String,
    pub product_id: String,
    pub email: String,
    pub notified_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// A second request for the same product and address while one is pending is ignored.
pub async fn subscribe<'e, E: PgExecutor<'e>>(
    e: E,
    product_id: String,
    email: String,
) -> Result<(), Error> {
    sqlx::query(
        "
        INSERT INTO back_in_stock_subscriptions (id, product_id, email)
        VALUES ($1, $2, LOWER($3))
        ON CONFLICT (product_id, email) WHERE notified_at IS NULL DO NOTHING
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(product_id.clone())
    .bind(email)
    .execute(e)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!(
            "Error occurred while subscribing to restock of product {}: {}",
            product_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_pending_by_product_id<'e, E: PgExecutor<'e>>(
    e: E,
    product_id: String,
) -> Result<Vec<Subscription>, Error> {
    sqlx::query_as::<_, Subscription>(
        "
        SELECT * FROM back_in_stock_subscriptions
        WHERE product_id = $1 AND notified_at IS NULL
        ORDER BY created_at ASC
        ",
    )
    .bind(product_id.clone())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while fetching restock subscriptions of product {}: {}",
            product_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn mark_notified<'e, E: PgExecutor<'e>>(e: E, ids: Vec<String>) -> Result<u64, Error> {
    sqlx::query(
        "UPDATE back_in_stock_subscriptions SET notified_at = NOW() WHERE id = ANY($1)",
    )
    .bind(ids)
    .execute(e)
    .await
    .map(|result| result.rows_affected())
    .map_err(|err| {
        tracing::error!("Error occurred while marking restock subscriptions notified: {}", err);
        Error::UnexpectedError
    })
}
