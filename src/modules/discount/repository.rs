use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use std::str::FromStr;
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum DiscountKind {
    #[serde(rename = "percentage")]
    Percentage,
    #[serde(rename = "fixed")]
    Fixed,
}

impl ToString for DiscountKind {
    fn to_string(&self) -> String {
        match self {
            DiscountKind::Percentage => String::from("percentage"),
            DiscountKind::Fixed => String::from("fixed"),
        }
    }
}

impl FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(DiscountKind::Percentage),
            "fixed" => Ok(DiscountKind::Fixed),
            _ => Err(format!("'{}' is not a valid DiscountKind", s)),
        }
    }
}

impl TryFrom<String> for DiscountKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct DiscountCode {
    pub id: String,
    pub code: String,
    #[sqlx(try_from = "String")]
    pub kind: DiscountKind,
    pub value: BigDecimal,
    pub min_order_amount: Option<BigDecimal>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<NaiveDateTime>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Debug, PartialEq)]
pub enum Rejection {
    Inactive,
    Expired,
    UsageLimitReached,
    BelowMinimumOrder(BigDecimal),
}

impl ToString for Rejection {
    fn to_string(&self) -> String {
        match self {
            Rejection::Inactive => String::from("Discount code is not active"),
            Rejection::Expired => String::from("Discount code has expired"),
            Rejection::UsageLimitReached => String::from("Discount code has been used up"),
            Rejection::BelowMinimumOrder(minimum) => {
                format!("Discount code requires a minimum order of {}", minimum)
            }
        }
    }
}

impl DiscountCode {
    /// Amount taken off `subtotal`, never more than the subtotal itself.
    pub fn amount_for(&self, subtotal: &BigDecimal) -> BigDecimal {
        let amount = match self.kind {
            DiscountKind::Percentage => {
                let hundred = BigDecimal::from(100);
                let percentage = if self.value > hundred {
                    hundred.clone()
                } else {
                    self.value.clone()
                };
                (subtotal * percentage / hundred).with_scale(2)
            }
            DiscountKind::Fixed => self.value.clone(),
        };

        if amount < BigDecimal::zero() {
            BigDecimal::zero()
        } else if &amount > subtotal {
            subtotal.clone()
        } else {
            amount
        }
    }

    pub fn check(&self, subtotal: &BigDecimal, now: NaiveDateTime) -> Result<(), Rejection> {
        if !self.is_active {
            return Err(Rejection::Inactive);
        }

        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(Rejection::Expired);
            }
        }

        if let Some(max_uses) = self.max_uses {
            if self.used_count >= max_uses {
                return Err(Rejection::UsageLimitReached);
            }
        }

        if let Some(minimum) = &self.min_order_amount {
            if subtotal < minimum {
                return Err(Rejection::BelowMinimumOrder(minimum.clone()));
            }
        }

        Ok(())
    }
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

pub struct CreateDiscountPayload {
    pub code: String,
    pub kind: DiscountKind,
    pub value: BigDecimal,
    pub min_order_amount: Option<BigDecimal>,
    pub max_uses: Option<i32>,
    pub expires_at: Option<NaiveDateTime>,
}

pub async fn create<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateDiscountPayload,
) -> Result<DiscountCode, Error> {
    sqlx::query_as::<_, DiscountCode>(
        "
        INSERT INTO discount_codes (id, code, kind, value, min_order_amount, max_uses, expires_at)
        VALUES ($1, UPPER($2), $3, $4, $5, $6, $7)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.code)
    .bind(payload.kind.to_string())
    .bind(payload.value)
    .bind(payload.min_order_amount)
    .bind(payload.max_uses)
    .bind(payload.expires_at)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while creating a discount code: {}", err);
        Error::UnexpectedError
    })
}

pub async fn find_by_code<'e, E: PgExecutor<'e>>(
    e: E,
    code: String,
) -> Result<Option<DiscountCode>, Error> {
    sqlx::query_as::<_, DiscountCode>("SELECT * FROM discount_codes WHERE code = UPPER($1)")
        .bind(code.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching discount code {}: {}", code, err);
            Error::UnexpectedError
        })
}

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
) -> Result<Paginated<DiscountCode>, Error> {
    let codes = sqlx::query_as::<_, DiscountCode>(
        "SELECT * FROM discount_codes ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching discount codes: {}", err);
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(id) FROM discount_codes")
        .fetch_one(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while counting discount codes: {}", err);
            Error::UnexpectedError
        })?;

    Ok(Paginated::new(codes, total, &pagination))
}

#[derive(Default)]
pub struct UpdateDiscountPayload {
    pub kind: Option<DiscountKind>,
    pub value: Option<BigDecimal>,
    pub min_order_amount: Option<BigDecimal>,
    pub max_uses: Option<i32>,
    pub expires_at: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
}

pub async fn update_by_id<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateDiscountPayload,
) -> Result<Option<DiscountCode>, Error> {
    sqlx::query_as::<_, DiscountCode>(
        "
        UPDATE discount_codes SET
            kind = COALESCE($2, kind),
            value = COALESCE($3, value),
            min_order_amount = COALESCE($4, min_order_amount),
            max_uses = COALESCE($5, max_uses),
            expires_at = COALESCE($6, expires_at),
            is_active = COALESCE($7, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(payload.kind.map(|kind| kind.to_string()))
    .bind(payload.value)
    .bind(payload.min_order_amount)
    .bind(payload.max_uses)
    .bind(payload.expires_at)
    .bind(payload.is_active)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while updating discount code {}: {}", id, err);
        Error::UnexpectedError
    })
}

/// Counts one use of the code; `false` when the usage limit was hit in the meantime.
pub async fn increment_usage<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<bool, Error> {
    sqlx::query(
        "
        UPDATE discount_codes SET used_count = used_count + 1, updated_at = NOW()
        WHERE id = $1 AND (max_uses IS NULL OR used_count < max_uses)
        ",
    )
    .bind(id.clone())
    .execute(e)
    .await
    .map(|result| result.rows_affected() > 0)
    .map_err(|err| {
        tracing::error!("Error occurred while counting usage of discount code {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn delete_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<bool, Error> {
    sqlx::query("DELETE FROM discount_codes WHERE id = $1")
        .bind(id.clone())
        .execute(e)
        .await
        .map(|result| result.rows_affected() > 0)
        .map_err(|err| {
            tracing::error!("Error occurred while deleting discount code {}: {}", id, err);
            Error::UnexpectedError
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn decimal(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn code(kind: DiscountKind, value: &str) -> DiscountCode {
        DiscountCode {
            id: "01J9ZKDISCOUNT".to_string(),
            code: "WELCOME10".to_string(),
            kind,
            value: decimal(value),
            min_order_amount: None,
            max_uses: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
            created_at: Utc::now().naive_utc(),
            updated_at: None,
        }
    }

    #[test]
    fn percentage_discount_is_taken_from_the_subtotal() {
        let discount = code(DiscountKind::Percentage, "10");
        assert_eq!(discount.amount_for(&decimal("45000")), decimal("4500.00"));
    }

    #[test]
    fn percentage_is_capped_at_the_whole_subtotal() {
        let discount = code(DiscountKind::Percentage, "150");
        assert_eq!(discount.amount_for(&decimal("8000")), decimal("8000"));
    }

    #[test]
    fn fixed_discount_never_exceeds_the_subtotal() {
        let discount = code(DiscountKind::Fixed, "5000");
        assert_eq!(discount.amount_for(&decimal("12000")), decimal("5000"));
        assert_eq!(discount.amount_for(&decimal("3000")), decimal("3000"));
    }

    #[test]
    fn rejects_codes_that_cannot_be_used() {
        let now = Utc::now().naive_utc();
        let subtotal = decimal("10000");

        let mut discount = code(DiscountKind::Fixed, "500");
        assert_eq!(discount.check(&subtotal, now), Ok(()));

        discount.is_active = false;
        assert_eq!(discount.check(&subtotal, now), Err(Rejection::Inactive));

        let mut discount = code(DiscountKind::Fixed, "500");
        discount.expires_at = Some(now - Duration::hours(1));
        assert_eq!(discount.check(&subtotal, now), Err(Rejection::Expired));

        let mut discount = code(DiscountKind::Fixed, "500");
        discount.max_uses = Some(3);
        discount.used_count = 3;
        assert_eq!(discount.check(&subtotal, now), Err(Rejection::UsageLimitReached));

        let mut discount = code(DiscountKind::Fixed, "500");
        discount.min_order_amount = Some(decimal("20000"));
        assert_eq!(
            discount.check(&subtotal, now),
            Err(Rejection::BelowMinimumOrder(decimal("20000")))
        );
    }
}
