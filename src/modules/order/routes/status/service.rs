use super::types::response;
use crate::modules::payment::confirmation::OrderStore;

/// Polled by the storefront while a payment is being confirmed.
pub async fn service(store: &dyn OrderStore, id: String) -> response::Response {
    store
        .find_order(&id)
        .await
        .map_err(|_| response::Error::FailedToFetchOrder)?
        .ok_or(response::Error::OrderNotFound)
        .map(|order| response::Success::Status {
            status: order.status,
            payment_status: order.payment_status,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{
        notification::service::email::fixtures,
        order::repository::{OrderStatus, PaymentStatus},
        payment::confirmation::testing::MemoryStore,
    };

    #[tokio::test]
    async fn unknown_orders_are_not_found() {
        let store = MemoryStore::default();

        let result = service(&store, "01J9ZKMISSING".to_string()).await;

        assert_eq!(result.err(), Some(response::Error::OrderNotFound));
    }

    #[tokio::test]
    async fn reports_both_statuses() {
        let store = MemoryStore::default();
        store
            .orders
            .lock()
            .unwrap()
            .insert("O1".to_string(), fixtures::order("O1", "U1"));

        match service(&store, "O1".to_string()).await {
            Ok(response::Success::Status {
                status,
                payment_status,
            }) => {
                assert_eq!(status, OrderStatus::Pending);
                assert_eq!(payment_status, PaymentStatus::Pending);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
