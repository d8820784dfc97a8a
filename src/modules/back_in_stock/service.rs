use super::repository::{self, Subscription};
use crate::{
    modules::{
        notification::service::{self as notification, Notification, Notifier},
        product::repository::Product,
    },
    types::Context,
};
use futures::future::join_all;
use std::sync::Arc;

/// Ids of the subscriptions whose email went out, in subscription order.
pub fn delivered(
    product: &Product,
    subscriptions: Vec<Subscription>,
    results: Vec<notification::Result<()>>,
) -> Vec<String> {
    subscriptions
        .into_iter()
        .zip(results)
        .filter_map(|(subscription, result)| match result {
            Ok(_) => Some(subscription.id),
            Err(err) => {
                tracing::warn!(
                    "Failed to send restock email for product {} to {}: {:?}",
                    product.id,
                    subscription.email,
                    err
                );
                None
            }
        })
        .collect()
}

pub async fn send_restock_emails(
    notifier: &dyn Notifier,
    product: &Product,
    subscriptions: Vec<Subscription>,
) -> Vec<String> {
    let results = join_all(subscriptions.iter().map(|subscription| {
        notifier.send(Notification::back_in_stock(
            subscription.email.clone(),
            product.clone(),
        ))
    }))
    .await;

    delivered(product, subscriptions, results)
}

/// Emails every pending subscriber of `product` and marks the delivered ones.
/// Failures are logged; the caller's update has already happened.
pub async fn notify_subscribers(ctx: Arc<Context>, notifier: &dyn Notifier, product: Product) {
    let subscriptions =
        match repository::find_pending_by_product_id(&ctx.db_conn.pool, product.id.clone()).await
        {
            Ok(subscriptions) => subscriptions,
            Err(_) => return,
        };

    if subscriptions.is_empty() {
        return;
    }

    let delivered = send_restock_emails(notifier, &product, subscriptions).await;
    if delivered.is_empty() {
        tracing::warn!("No restock email for product {} could be delivered", product.id);
        return;
    }

    match repository::mark_notified(&ctx.db_conn.pool, delivered).await {
        Ok(marked) => tracing::info!(
            "Notified {} subscriber(s) that product {} is back in stock",
            marked,
            product.id
        ),
        Err(_) => tracing::error!(
            "Restock emails for product {} went out but the subscriptions were not marked",
            product.id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{
        notification::service::email::fixtures,
        payment::confirmation::testing::RecordingNotifier,
    };
    use chrono::Utc;

    fn subscription(id: &str, email: &str) -> Subscription {
        Subscription {
            id: id.to_string(),
            product_id: "01J9ZKPRODUCT".to_string(),
            email: email.to_string(),
            notified_at: None,
            created_at: Utc::now().naive_utc(),
        }
    }

    fn subscriptions() -> Vec<Subscription> {
        vec![
            subscription("S1", "ada@maison.test"),
            subscription("S2", "bayo@maison.test"),
            subscription("S3", "chi@maison.test"),
        ]
    }

    #[test]
    fn only_delivered_subscriptions_are_kept() {
        let product = fixtures::product("01J9ZKPRODUCT", 5);

        let ids = delivered(
            &product,
            subscriptions(),
            vec![Ok(()), Err(notification::Error::NotSent), Ok(())],
        );

        assert_eq!(ids, vec!["S1".to_string(), "S3".to_string()]);
    }

    #[tokio::test]
    async fn every_subscriber_is_emailed() {
        let product = fixtures::product("01J9ZKPRODUCT", 5);
        let notifier = RecordingNotifier::default();

        let ids = send_restock_emails(&notifier, &product, subscriptions()).await;

        assert_eq!(ids.len(), 3);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        assert!(sent
            .iter()
            .all(|notification| matches!(notification, Notification::BackInStock(_))));
    }

    #[tokio::test]
    async fn failed_sends_are_not_marked_delivered() {
        let product = fixtures::product("01J9ZKPRODUCT", 5);
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };

        let ids = send_restock_emails(&notifier, &product, subscriptions()).await;

        assert!(ids.is_empty());
    }
}
