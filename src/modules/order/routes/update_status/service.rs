use super::types::{request, response};
use crate::{
    modules::{
        back_in_stock,
        notification::service::{self as notification, Mailer, Notification},
        order::repository::{self, Order, OrderStatus, UpdateStatusPayload},
        product, user,
    },
    types::Context,
};
use std::sync::Arc;
use validator::Validate;

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `shipped` needs a tracking code, either sent now or already on the order.
fn check_tracking(
    status: &OrderStatus,
    tracking_code: Option<&str>,
    existing: Option<&str>,
) -> Result<(), response::Error> {
    match (status, tracking_code.or(existing)) {
        (OrderStatus::Shipped, None) => Err(response::Error::TrackingCodeRequired),
        _ => Ok(()),
    }
}

/// Cancelling gives the stock back unless the goods have already left.
fn releases_stock(current: &OrderStatus, next: &OrderStatus) -> bool {
    *next == OrderStatus::Cancelled
        && !matches!(
            current,
            OrderStatus::Cancelled | OrderStatus::Shipped | OrderStatus::Delivered
        )
}

/// `None` when the order moved on in the meantime and nothing was cancelled.
async fn cancel_and_restock(ctx: Arc<Context>, id: String) -> Result<Option<Order>, response::Error> {
    let mut tx = ctx.db_conn.pool.begin().await.map_err(|err| {
        tracing::error!("Failed to start database transaction: {}", err);
        response::Error::FailedToUpdateOrderStatus
    })?;

    let Some(order) = repository::cancel(&mut *tx, id)
        .await
        .map_err(|_| response::Error::FailedToUpdateOrderStatus)?
    else {
        return Ok(None);
    };

    let restocked = product::repository::restore_stock_for_order(&mut *tx, order.id.clone())
        .await
        .map_err(|_| response::Error::FailedToUpdateOrderStatus)?;

    tx.commit().await.map_err(|err| {
        tracing::error!("Failed to commit cancellation of order {}: {}", order.id, err);
        response::Error::FailedToUpdateOrderStatus
    })?;

    tracing::info!("Returned the stock of cancelled order {}", order.id);

    if !restocked.is_empty() {
        tokio::spawn(async move {
            let mailer = Mailer::new(ctx.clone());
            for product in restocked {
                back_in_stock::service::notify_subscribers(ctx.clone(), &mailer, product).await;
            }
        });
    }

    Ok(Some(order))
}

async fn notify_customer(ctx: Arc<Context>, order: &Order) -> bool {
    if order.status == OrderStatus::Pending {
        return false;
    }

    let customer = match user::repository::find_by_id(&ctx.db_conn.pool, order.user_id.clone()).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            tracing::error!("Customer {} of order {} not found", order.user_id, order.id);
            return false;
        }
        Err(_) => return false,
    };

    match notification::send(ctx, Notification::order_status_updated(customer, order.clone())).await {
        Ok(_) => true,
        Err(err) => {
            tracing::error!(
                "Failed to send {} email for order {}: {:?}",
                order.status.to_string(),
                order.id,
                err
            );
            false
        }
    }
}

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload
        .body
        .validate()
        .map_err(response::Error::FailedToValidate)?;

    let order = repository::find_by_id(&ctx.db_conn.pool, payload.id.clone())
        .await
        .map_err(|_| response::Error::FailedToUpdateOrderStatus)?
        .ok_or(response::Error::OrderNotFound)?;

    let tracking_code = non_blank(payload.body.tracking_code);
    let tracking_url = non_blank(payload.body.tracking_url);
    check_tracking(
        &payload.body.status,
        tracking_code.as_deref(),
        order.tracking_code.as_deref(),
    )?;

    let cancelled = match releases_stock(&order.status, &payload.body.status) {
        true => cancel_and_restock(ctx.clone(), order.id.clone()).await?,
        false => None,
    };

    let order = match cancelled {
        Some(order) => order,
        None => repository::update_status(
            &ctx.db_conn.pool,
            order.id,
            UpdateStatusPayload {
                status: payload.body.status,
                tracking_code,
                tracking_url,
            },
        )
        .await
        .map_err(|_| response::Error::FailedToUpdateOrderStatus)?
        .ok_or(response::Error::OrderNotFound)?,
    };

    tracing::info!(
        "Order {} moved to {}",
        order.id,
        order.status.to_string()
    );

    let email_sent = notify_customer(ctx, &order).await;

    Ok(response::Success::StatusUpdated { order, email_sent })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shipping_without_a_tracking_code_is_refused() {
        assert!(matches!(
            check_tracking(&OrderStatus::Shipped, None, None),
            Err(response::Error::TrackingCodeRequired)
        ));
    }

    #[test]
    fn an_existing_tracking_code_is_enough_to_ship() {
        assert!(check_tracking(&OrderStatus::Shipped, None, Some("GIG-1234")).is_ok());
        assert!(check_tracking(&OrderStatus::Shipped, Some("GIG-5678"), None).is_ok());
    }

    #[test]
    fn other_statuses_need_no_tracking_code() {
        assert!(check_tracking(&OrderStatus::Delivered, None, None).is_ok());
        assert!(check_tracking(&OrderStatus::Cancelled, None, None).is_ok());
    }

    #[test]
    fn cancelling_before_dispatch_gives_stock_back() {
        for current in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
        ] {
            assert!(releases_stock(&current, &OrderStatus::Cancelled));
        }
    }

    #[test]
    fn goods_that_left_or_were_returned_already_keep_stock_as_is() {
        assert!(!releases_stock(&OrderStatus::Shipped, &OrderStatus::Cancelled));
        assert!(!releases_stock(&OrderStatus::Delivered, &OrderStatus::Cancelled));
        assert!(!releases_stock(&OrderStatus::Cancelled, &OrderStatus::Cancelled));
    }

    #[test]
    fn other_transitions_leave_stock_alone() {
        assert!(!releases_stock(&OrderStatus::Pending, &OrderStatus::Processing));
        assert!(!releases_stock(&OrderStatus::Confirmed, &OrderStatus::Shipped));
    }

    #[test]
    fn blank_tracking_codes_count_as_missing() {
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(Some(" GIG-1 ".to_string())), Some("GIG-1".to_string()));
    }
}
