use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::PgExecutor;

#[derive(Debug)]
pub enum Error {
    UnexpectedError,
}

#[derive(Serialize, Debug, sqlx::FromRow)]
pub struct Totals {
    pub products: i64,
    pub orders: i64,
    pub paid_orders: i64,
    pub awaiting_fulfilment: i64,
    pub customers: i64,
    pub newsletter_subscribers: i64,
    /// Sum of paid order totals.
    pub revenue: BigDecimal,
}

pub async fn get_totals<'e, E: PgExecutor<'e>>(e: E) -> Result<Totals, Error> {
    sqlx::query_as::<_, Totals>(
        "
        SELECT
            (SELECT COUNT(id) FROM products) AS products,
            (SELECT COUNT(id) FROM orders) AS orders,
            (SELECT COUNT(id) FROM orders WHERE payment_status = 'paid') AS paid_orders,
            (
                SELECT COUNT(id) FROM orders
                WHERE payment_status = 'paid' AND status IN ('confirmed', 'processing')
            ) AS awaiting_fulfilment,
            (SELECT COUNT(id) FROM profiles WHERE role = 'customer') AS customers,
            (SELECT COUNT(id) FROM newsletter_subscribers) AS newsletter_subscribers,
            (
                SELECT COALESCE(SUM(total), 0) FROM orders WHERE payment_status = 'paid'
            ) AS revenue
        ",
    )
    .fetch_one(e)
    .await
    .map_err(|err| {
        tracing::error!("Error occurred while trying to fetch dashboard totals: {}", err);
        Error::UnexpectedError
    })
}
