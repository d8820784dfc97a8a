use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

use crate::modules::order::repository::ShippingAddress;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub full_name: String,
    pub phone_number: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<Address> for ShippingAddress {
    fn from(address: Address) -> Self {
        ShippingAddress {
            full_name: address.full_name,
            phone_number: address.phone_number,
            line1: address.line1,
            line2: address.line2,
            city: address.city,
            state: address.state,
            country: address.country,
            postal_code: address.postal_code,
        }
    }
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub struct CreateAddressPayload {
    pub user_id: String,
    pub full_name: String,
    pub phone_number: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: Option<String>,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateAddressPayload,
) -> Result<Address, Error> {
    sqlx::query_as::<_, Address>(
        "
        INSERT INTO addresses (
            id,
            user_id,
            full_name,
            phone_number,
            line1,
            line2,
            city,
            state,
            country,
            postal_code
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.user_id.clone())
    .bind(payload.full_name)
    .bind(payload.phone_number)
    .bind(payload.line1)
    .bind(payload.line2)
    .bind(payload.city)
    .bind(payload.state)
    .bind(payload.country)
    .bind(payload.postal_code)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while creating an address for user {}: {}",
            payload.user_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_many_by_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    user_id: String,
) -> Result<Vec<Address>, Error> {
    sqlx::query_as::<_, Address>(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id.clone())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching addresses of user {}: {}", user_id, err);
        Error::UnexpectedError
    })
}

pub async fn find_by_id_and_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    user_id: String,
) -> Result<Option<Address>, Error> {
    sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id.clone())
        .bind(user_id)
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching address {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn delete_by_id_and_user_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    user_id: String,
) -> Result<bool, Error> {
    sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id.clone())
        .bind(user_id)
        .execute(e)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while deleting address {}: {}", id, err);
            Error::UnexpectedError
        })
}
