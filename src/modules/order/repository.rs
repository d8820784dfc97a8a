use bigdecimal::BigDecimal;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgExecutor;
use std::str::FromStr;
use ulid::Ulid;

use crate::utils::pagination::{Paginated, Pagination};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum OrderStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "confirmed")]
    Confirmed,
    #[serde(rename = "processing")]
    Processing,
    #[serde(rename = "shipped")]
    Shipped,
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl ToString for OrderStatus {
    fn to_string(&self) -> String {
        match self {
            OrderStatus::Pending => String::from("pending"),
            OrderStatus::Confirmed => String::from("confirmed"),
            OrderStatus::Processing => String::from("processing"),
            OrderStatus::Shipped => String::from("shipped"),
            OrderStatus::Delivered => String::from("delivered"),
            OrderStatus::Cancelled => String::from("cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("'{}' is not a valid OrderStatus", s)),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum PaymentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "failed")]
    Failed,
}

impl ToString for PaymentStatus {
    fn to_string(&self) -> String {
        match self {
            PaymentStatus::Pending => String::from("pending"),
            PaymentStatus::Paid => String::from("paid"),
            PaymentStatus::Failed => String::from("failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("'{}' is not a valid PaymentStatus", s)),
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentProvider {
    #[serde(rename = "paystack")]
    Paystack,
    #[serde(rename = "flutterwave")]
    Flutterwave,
}

impl ToString for PaymentProvider {
    fn to_string(&self) -> String {
        match self {
            PaymentProvider::Paystack => String::from("paystack"),
            PaymentProvider::Flutterwave => String::from("flutterwave"),
        }
    }
}

impl FromStr for PaymentProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paystack" => Ok(PaymentProvider::Paystack),
            "flutterwave" => Ok(PaymentProvider::Flutterwave),
            _ => Err(format!("'{}' is not a valid PaymentProvider", s)),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone_number: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub postal_code: Option<String>,
}

impl ShippingAddress {
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.line1.clone()];
        if let Some(line2) = self.line2.as_ref().filter(|line| !line.is_empty()) {
            parts.push(line2.clone());
        }
        parts.push(self.city.clone());
        parts.push(self.state.clone());
        parts.push(self.country.clone());
        parts.join(", ")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct Order {
    pub id: String,
    pub order_number: String,
    pub user_id: String,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
    pub discount_code: Option<String>,
    pub shipping_address: Json<ShippingAddress>,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub payment_provider: Option<String>,
    pub payment_reference: Option<String>,
    pub tracking_code: Option<String>,
    pub tracking_url: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: Option<NaiveDateTime>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, sqlx::FromRow)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub bulk_price: Option<BigDecimal>,
    pub bulk_min_quantity: Option<i32>,
    pub created_at: NaiveDateTime,
}

impl OrderItem {
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

/// `ORD-20241001-7QF3XA`: the order date plus the tail of a fresh ULID.
pub fn generate_order_number(now: NaiveDateTime) -> String {
    let id = Ulid::new().to_string();
    let suffix = &id[id.len() - 6..];
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

pub struct CreateOrderPayload {
    pub user_id: String,
    pub subtotal: BigDecimal,
    pub discount_amount: BigDecimal,
    pub shipping_fee: BigDecimal,
    pub total: BigDecimal,
    pub discount_code: Option<String>,
    pub shipping_address: ShippingAddress,
}

pub async fn create<'e, E: PgExecutor<'e>>(e: E, payload: CreateOrderPayload) -> Result<Order, Error> {
    sqlx::query_as::<_, Order>(
        "
        INSERT INTO orders (
            id,
            order_number,
            user_id,
            subtotal,
            discount_amount,
            shipping_fee,
            total,
            discount_code,
            shipping_address
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(generate_order_number(Utc::now().naive_utc()))
    .bind(payload.user_id.clone())
    .bind(payload.subtotal)
    .bind(payload.discount_amount)
    .bind(payload.shipping_fee)
    .bind(payload.total)
    .bind(payload.discount_code)
    .bind(Json(payload.shipping_address))
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while creating an order for user {}: {}",
            payload.user_id,
            err
        );
        Error::UnexpectedError
    })
}

pub struct CreateOrderItemPayload {
    pub order_id: String,
    pub product_id: String,
    pub product_name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub bulk_price: Option<BigDecimal>,
    pub bulk_min_quantity: Option<i32>,
}

pub async fn create_item<'e, E: PgExecutor<'e>>(
    e: E,
    payload: CreateOrderItemPayload,
) -> Result<OrderItem, Error> {
    sqlx::query_as::<_, OrderItem>(
        "
        INSERT INTO order_items (
            id,
            order_id,
            product_id,
            product_name,
            size,
            quantity,
            unit_price,
            bulk_price,
            bulk_min_quantity
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        ",
    )
    .bind(Ulid::new().to_string())
    .bind(payload.order_id.clone())
    .bind(payload.product_id)
    .bind(payload.product_name)
    .bind(payload.size)
    .bind(payload.quantity)
    .bind(payload.unit_price)
    .bind(payload.bulk_price)
    .bind(payload.bulk_min_quantity)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!(
            "Error occurred while adding an item to order {}: {}",
            payload.order_id,
            err
        );
        Error::UnexpectedError
    })
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<Order>, Error> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id.clone())
        .fetch_optional(e)
        .await
        .map_err(|err| {
            tracing::error!("Error occurred while fetching order {}: {}", id, err);
            Error::UnexpectedError
        })
}

pub async fn find_items_by_order_id<'e, E: PgExecutor<'e>>(
    e: E,
    order_id: String,
) -> Result<Vec<OrderItem>, Error> {
    sqlx::query_as::<_, OrderItem>(
        "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at ASC",
    )
    .bind(order_id.clone())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while fetching items of order {}: {}", order_id, err);
        Error::UnexpectedError
    })
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Filters {
    pub user_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

pub async fn find_many<'e, E: PgExecutor<'e> + Copy>(
    e: E,
    pagination: Pagination,
    filters: Filters,
) -> Result<Paginated<Order>, Error> {
    let status = filters.status.map(|status| status.to_string());
    let payment_status = filters.payment_status.map(|status| status.to_string());

    let orders = sqlx::query_as::<_, Order>(
        "
        SELECT * FROM orders
        WHERE
            ($1::TEXT IS NULL OR user_id = $1)
            AND ($2::TEXT IS NULL OR status = $2)
            AND ($3::TEXT IS NULL OR payment_status = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        ",
    )
    .bind(filters.user_id.clone())
    .bind(status.clone())
    .bind(payment_status.clone())
    .bind(pagination.limit())
    .bind(pagination.offset())
    .fetch_all(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch many orders: {}", err);
        Error::UnexpectedError
    })?;

    let total = sqlx::query_scalar::<_, i64>(
        "
        SELECT COUNT(id) FROM orders
        WHERE
            ($1::TEXT IS NULL OR user_id = $1)
            AND ($2::TEXT IS NULL OR status = $2)
            AND ($3::TEXT IS NULL OR payment_status = $3)
        ",
    )
    .bind(filters.user_id)
    .bind(status)
    .bind(payment_status)
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to count orders: {}", err);
        Error::UnexpectedError
    })?;

    Ok(Paginated::new(orders, total, &pagination))
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct MarkedPaid {
    #[sqlx(flatten)]
    pub order: Order,
    #[sqlx(try_from = "String")]
    pub previous_payment_status: PaymentStatus,
}

impl MarkedPaid {
    /// Whether this call moved the order out of an unpaid state.
    pub fn transitioned(&self) -> bool {
        self.previous_payment_status != PaymentStatus::Paid
    }
}

pub struct MarkPaidPayload {
    pub provider: PaymentProvider,
    pub reference: String,
}

/// Writes absolute values only, so replaying it leaves the same row behind.
/// `status` is only promoted from `pending`; an existing reference is kept.
pub async fn mark_paid<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: MarkPaidPayload,
) -> Result<Option<MarkedPaid>, Error> {
    sqlx::query_as::<_, MarkedPaid>(
        "
        WITH previous AS (
            SELECT id, payment_status FROM orders WHERE id = $1 FOR UPDATE
        )
        UPDATE orders SET
            payment_status = 'paid',
            status = CASE WHEN orders.status = 'pending' THEN 'confirmed' ELSE orders.status END,
            payment_provider = COALESCE(orders.payment_provider, $2),
            payment_reference = COALESCE(orders.payment_reference, $3),
            updated_at = NOW()
        FROM previous
        WHERE orders.id = previous.id
        RETURNING orders.*, previous.payment_status AS previous_payment_status
        ",
    )
    .bind(id.clone())
    .bind(payload.provider.to_string())
    .bind(payload.reference)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while marking order {} as paid: {}", id, err);
        Error::UnexpectedError
    })
}

/// Records a failed charge. A paid order is never downgraded.
pub async fn mark_failed<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<bool, Error> {
    sqlx::query(
        "
        UPDATE orders SET payment_status = 'failed', updated_at = NOW()
        WHERE id = $1 AND payment_status <> 'paid'
        ",
    )
    .bind(id.clone())
    .execute(e)
    .await
    .map(|result| result.rows_affected() > 0)
    .map_err(|err| {
        tracing::error!("Error occurred while marking order {} as failed: {}", id, err);
        Error::UnexpectedError
    })
}

pub struct UpdateStatusPayload {
    pub status: OrderStatus,
    pub tracking_code: Option<String>,
    pub tracking_url: Option<String>,
}

/// Cancels an order whose goods have not left yet. `None` when the order is
/// missing or already cancelled, shipped or delivered.
pub async fn cancel<'e, E: PgExecutor<'e>>(e: E, id: String) -> Result<Option<Order>, Error> {
    sqlx::query_as::<_, Order>(
        "
        UPDATE orders SET
            status = 'cancelled',
            updated_at = NOW()
        WHERE id = $1 AND status NOT IN ('cancelled', 'shipped', 'delivered')
        RETURNING *
        ",
    )
    .bind(id.clone())
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while cancelling order {}: {}", id, err);
        Error::UnexpectedError
    })
}

pub async fn update_status<'e, E: PgExecutor<'e>>(
    e: E,
    id: String,
    payload: UpdateStatusPayload,
) -> Result<Option<Order>, Error> {
    sqlx::query_as::<_, Order>(
        "
        UPDATE orders SET
            status = $2,
            tracking_code = COALESCE($3, tracking_code),
            tracking_url = COALESCE($4, tracking_url),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        ",
    )
    .bind(id.clone())
    .bind(payload.status.to_string())
    .bind(payload.tracking_code)
    .bind(payload.tracking_url)
    .fetch_optional(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while updating status of order {}: {}", id, err);
        Error::UnexpectedError
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn order_numbers_carry_the_order_date() {
        let now = NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let number = generate_order_number(now);

        assert!(number.starts_with("ORD-20241001-"));
        assert_eq!(number.len(), "ORD-20241001-".len() + 6);
    }

    #[test]
    fn unknown_payment_statuses_are_rejected() {
        assert_eq!(PaymentStatus::try_from("paid".to_string()), Ok(PaymentStatus::Paid));
        assert!(PaymentStatus::try_from("refunded".to_string()).is_err());
    }

    #[test]
    fn shipping_address_skips_empty_second_line() {
        let address = ShippingAddress {
            full_name: "Ada Obi".to_string(),
            phone_number: "+2348012345678".to_string(),
            line1: "12 Admiralty Way".to_string(),
            line2: Some(String::new()),
            city: "Lekki".to_string(),
            state: "Lagos".to_string(),
            country: "Nigeria".to_string(),
            postal_code: None,
        };

        assert_eq!(address.one_line(), "12 Admiralty Way, Lekki, Lagos, Nigeria");
    }
}
