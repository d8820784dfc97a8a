use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct SpecialOffer {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link: Option<String>,
    pub is_active: bool,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl SpecialOffer {
    pub fn is_running(&self, now: NaiveDateTime) -> bool {
        self.is_active
            && self.starts_at.map_or(true, |starts_at| starts_at <= now)
            && self.ends_at.map_or(true, |ends_at| now < ends_at)
    }
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub struct CreateOfferPayload {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link: Option<String>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateOfferPayload,
) -> Result<SpecialOffer, Error> {
    sqlx::query_as::<_, SpecialOffer>(
        "
        INSERT INTO special_offers (id, title, subtitle, image_url, link, starts_at, ends_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.title)
    .bind(payload.subtitle)
    .bind(payload.image_url)
    .bind(payload.link)
    .bind(payload.starts_at)
    .bind(payload.ends_at)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while creating a special offer: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_active<'e, E: PgExecutor<'e>>(e: E) -> Result<Vec<SpecialOffer>, Error> {
    sqlx::query_as::<_, SpecialOffer>(
        "SELECT * FROM special_offers WHERE is_active ORDER BY created_at DESC",
    )
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching active offers: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
) -> Result<Paginated<SpecialOffer>, Error> {
    let offers = sqlx::query_as::<_, SpecialOffer>(
        "SELECT * FROM special_offers ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching special offers: {}", err);
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM special_offers")
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting special offers: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(offers, total, &pagination))
}

#[derive(Default)]
pub struct UpdateOfferPayload {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub is_active: Option<bool>,
    pub starts_at: Option<NaiveDateTime>,
    pub ends_at: Option<NaiveDateTime>,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateOfferPayload,
) -> Result<Option<SpecialOffer>, Error> {
    sqlx::query_as::<_, SpecialOffer>(
        "
        UPDATE special_offers SET
            title = COALESCE($2, title),
            subtitle = COALESCE($3, subtitle),
            image_url = COALESCE($4, image_url),
            link = COALESCE($5, link),
            is_active = COALESCE($6, is_active),
            starts_at = COALESCE($7, starts_at),
            ends_at = COALESCE($8, ends_at),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(payload.title)
    .bind(payload.subtitle)
    .bind(payload.image_url)
    .bind(payload.link)
    .bind(payload.is_active)
    .bind(payload.starts_at)
    .bind(payload.ends_at)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while updating special offer {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<bool, Error> {
    sqlx::query("DELETE FROM special_offers WHERE id = $1")
        .bind(id.clone())
        .execute(e)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while deleting special offer {}: {}", id, err);
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn offer() -> SpecialOffer {
        SpecialOffer {
            id: "01J9ZKOFFER".to_string(),
            title: "Festive drop".to_string(),
            subtitle: None,
            image_url: "https://cdn.example.com/festive.jpg".to_string(),
            link: None,
            is_active: true,
            starts_at: None,
            ends_at: None,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn unscheduled_active_offers_are_always_running() {
        assert!(offer().is_running(Utc::now().naive_utc()));
    }

    #[test]
    fn schedule_window_is_start_inclusive_and_end_exclusive() {
        let now = Utc::now().naive_utc();
        let mut offer = offer();
        offer.starts_at = Some(now);
        offer.ends_at = Some(now + Duration::days(2));

        assert!(offer.is_running(now));
        assert!(!offer.is_running(now - Duration::seconds(1)));
        assert!(!offer.is_running(now + Duration::days(2)));
    }

    #[test]
    fn switched_off_offers_never_run() {
        let mut offer = offer();
        offer.is_active = false;
        assert!(!offer.is_running(Utc::now().naive_utc()));
    }
}
