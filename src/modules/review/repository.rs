use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use ulid::Ulid;

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Review {
    pub id: String,
    pub product_id: String,
    pub user_id: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: NaiveDateTime,
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct ReviewWithAuthor {
    pub id: String,
    pub product_id: String,
    pub rating: i32,
    pub comment: String,
    pub author: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug)]
pub enum Error {
    AlreadyReviewed,
    UnexpectedError,
}

pub struct CreateReviewPayload {
    pub product_id: String,
    pub user_id: String,
    pub rating: i32,
    pub comment: String,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateReviewPayload,
) -> Result<Review, Error> {
    sqlx::query_as::<_, Review>(
        "
        INSERT INTO reviews (id, product_id, user_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (product_id, user_id) DO NOTHING
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.product_id.clone())
    .bind(payload.user_id)
    .bind(payload.rating)
    .bind(payload.comment)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while reviewing product {}: {}",
            payload.product_id,
            err
        );
        Error::UnexpectedError
    })?
    .ok_or(Error::AlreadyReviewed)
}

pub async fn find_many_by_product_id<'e, E: PgExecutor<'e>>(
    e: E,
    product_id: String,
) -> Result<Vec<ReviewWithAuthor>, Error> {
    sqlx::query_as::<_, ReviewWithAuthor>(
        "
        SELECT
            reviews.id,
            reviews.product_id,
            reviews.rating,
            reviews.comment,
            profiles.first_name AS author,
            reviews.created_at
        FROM reviews
        INNER JOIN profiles ON profiles.id = reviews.user_id
        WHERE reviews.product_id = $1
        ORDER BY reviews.created_at DESC
        ",
    )
    .bind(product_id.clone())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching reviews of product {}: {}", product_id, err);
        Error::UnexpectedError
    })
}

/// Mean rating rounded to one decimal place, `None` without reviews.
pub fn average_rating(reviews: &[ReviewWithAuthor]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }

    let sum: i32 = reviews.iter().map(|review| review.rating).sum();
    let average = f64::from(sum) / reviews.len() as f64;
    Some((average * 10.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn review(rating: i32) -> ReviewWithAuthor {
        ReviewWithAuthor {
            id: Ulid::new().to_string(),
            product_id: "01J9ZKPRODUCT".to_string(),
            rating,
            comment: String::new(),
            author: "Ada".to_string(),
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn averages_to_one_decimal_place() {
        assert_eq!(average_rating(&[review(5), review(4), review(4)]), Some(4.3));
        assert_eq!(average_rating(&[]), None);
    }
}
