use sqlx::PgExecutor;
use ulid::Ulid;

use crate::modules::product::repository::Product;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub async fn add<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
    product_id: String,
) -> Result<(), Error> {
    sqlx::query(
        "
        INSERT INTO wishlist (id, user_id, product_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id) DO NOTHING
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(user_id.clone())
    .bind(product_id)
    .execute(e)
    .await
    .map(|_| ())
    .map_err(|err| {
        tracing::error!("Error occurred while adding to wishlist of user {}: {}", user_id, err);
        Error::UnexpectedError
    })
}

pub async fn remove<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
    product_id: String,
) -> Result<bool, Error> {
    sqlx::query("DELETE FROM wishlist WHERE user_id = $1 AND product_id = $2")
        .bind(user_id.clone())
        .bind(product_id)
        .execute(e)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!(
                "Error occurred while removing from wishlist of user {}: {}",
                user_id,
                err
            );
            Error::UnexpectedError
        })
}

pub async fn find_products_by_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
) -> Result<Vec<Product>, Error> {
    sqlx::query_as::<_, Product>(
        "
        SELECT products.* FROM wishlist
        INNER JOIN products ON products.id = wishlist.product_id
        WHERE wishlist.user_id = $1
        ORDER BY wishlist.created_at DESC
        ",
    )
    .bind(user_id.clone())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching wishlist of user {}: {}", user_id, err);
        Error::UnexpectedError
    })
}
