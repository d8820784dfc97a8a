use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Subscriber {
    pub id: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// Subscribing an existing address is a no-op. Returns whether a row was added.
pub async fn subscribe<'e, E: PgExecutor<'e>>(e: E, email: String) -> Result<bool, Error> {
    sqlx::query(
        "
        INSERT INTO newsletter_subscribers (id, email)
        VALUES ($1, LOWER($2))
        ON CONFLICT (email) DO NOTHING
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(email.clone())
    .execute(e)
    .await
    .map(|result| result.rows_affected() > 0)
    .map_err(|err| {
        tracing::error!("Error occurred while subscribing {} to the newsletter: {}", email, err);
        Error::UnexpectedError
    })
}

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
) -> Result<Paginated<Subscriber>, Error> {
    let subscribers = sqlx::query_as::<_, Subscriber>(
        "SELECT * FROM newsletter_subscribers ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching newsletter subscribers: {}", err);
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM newsletter_subscribers")
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting newsletter subscribers: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(subscribers, total, &pagination))
}
