//! Stage two of checkout: a provider has confirmed a charge and the order is
//! brought up to date.
//!
//! Steps run in order and each is independent. Marking the order paid is the
//! only step whose failure aborts the confirmation; clearing the cart and
//! notifying the customer are best effort and only logged when they fail.
//! The cart is cleared on every confirmation, the email only on the one that
//! moved the order to paid.

use crate::{
    modules::{
        cart,
        notification::{
            service::{Notification, Notifier},
            whatsapp::{self, WhatsappMessage},
        },
        order::repository::{self as order_repository, MarkedPaid, Order, OrderItem, PaymentProvider},
        user::{self, repository::User},
    },
    types::StorefrontContext,
};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::PgPool;

/// Who is asking for the confirmation.
#[derive(Clone, Debug, PartialEq)]
pub enum Access {
    /// The signed-in customer coming back from the provider's checkout page.
    Owner(String),
    /// A provider webhook. There is no user session, so ownership is not checked.
    Service,
}

#[derive(Clone, Debug)]
pub struct ConfirmPayment {
    pub order_id: String,
    pub provider: PaymentProvider,
    pub reference: String,
    /// Amount the provider says was charged, in major units.
    pub amount: Option<BigDecimal>,
    /// Currency of `amount`, when the provider reports it.
    pub currency: Option<String>,
    pub access: Access,
}

#[derive(Serialize, Clone, Debug)]
pub struct Confirmation {
    pub order: Order,
    pub newly_paid: bool,
    pub cart_cleared: bool,
    pub email_sent: bool,
    pub whatsapp: Option<WhatsappMessage>,
}

#[derive(Debug, PartialEq)]
pub enum Error {
    OrderNotFound,
    NotOrderOwner,
    AmountMismatch,
    CurrencyMismatch,
    UnexpectedError,
}

#[derive(Debug)]
pub struct StoreError;

/// Persistence the pipeline needs, kept narrow so it can be swapped out.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError>;

    async fn mark_paid(
        &self,
        order_id: &str,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<MarkedPaid>, StoreError>;

    async fn find_items(&self, order_id: &str) -> Result<Vec<OrderItem>, StoreError>;

    /// Removes every cart item of `user_id` and no one else's.
    async fn clear_cart(&self, user_id: &str) -> Result<u64, StoreError>;

    async fn find_customer(&self, user_id: &str) -> Result<Option<User>, StoreError>;
}

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
        order_repository::find_by_id(&self.pool, order_id.to_string())
            .await
            .map_err(|_| StoreError)
    }

    async fn mark_paid(
        &self,
        order_id: &str,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<MarkedPaid>, StoreError> {
        order_repository::mark_paid(
            &self.pool,
            order_id.to_string(),
            order_repository::MarkPaidPayload {
                provider,
                reference: reference.to_string(),
            },
        )
        .await
        .map_err(|_| StoreError)
    }

    async fn find_items(&self, order_id: &str) -> Result<Vec<OrderItem>, StoreError> {
        order_repository::find_items_by_order_id(&self.pool, order_id.to_string())
            .await
            .map_err(|_| StoreError)
    }

    async fn clear_cart(&self, user_id: &str) -> Result<u64, StoreError> {
        cart::repository::delete_by_user_id(&self.pool, user_id.to_string())
            .await
            .map_err(|_| StoreError)
    }

    async fn find_customer(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        user::repository::find_by_id(&self.pool, user_id.to_string())
            .await
            .map_err(|_| StoreError)
    }
}

pub struct Pipeline<'a> {
    pub store: &'a dyn OrderStore,
    pub notifier: &'a dyn Notifier,
    pub storefront: &'a StorefrontContext,
    pub currency: &'a str,
}

impl<'a> Pipeline<'a> {
    pub async fn confirm_order_payment(&self, payload: ConfirmPayment) -> Result<Confirmation, Error> {
        let order = self
            .store
            .find_order(&payload.order_id)
            .await
            .map_err(|_| Error::UnexpectedError)?
            .ok_or(Error::OrderNotFound)?;

        if let Access::Owner(user_id) = &payload.access {
            if &order.user_id != user_id {
                tracing::warn!(
                    "User {} tried to confirm payment for order {} they do not own",
                    user_id,
                    order.id
                );
                return Err(Error::NotOrderOwner);
            }
        }

        if let Some(currency) = &payload.currency {
            if !currency.eq_ignore_ascii_case(self.currency) {
                tracing::warn!(
                    "Payment {} for order {} was made in {} instead of {}",
                    payload.reference,
                    order.id,
                    currency,
                    self.currency
                );
                return Err(Error::CurrencyMismatch);
            }
        }

        if let Some(amount) = &payload.amount {
            if amount < &order.total {
                tracing::warn!(
                    "Payment {} for order {} was {} but the order total is {}",
                    payload.reference,
                    order.id,
                    amount,
                    order.total
                );
                return Err(Error::AmountMismatch);
            }
        }

        let marked = self
            .store
            .mark_paid(&order.id, payload.provider, &payload.reference)
            .await
            .map_err(|_| Error::UnexpectedError)?
            .ok_or(Error::OrderNotFound)?;
        let newly_paid = marked.transitioned();
        let order = marked.order;

        if newly_paid {
            tracing::info!(
                "Order {} paid via {} ({})",
                order.id,
                payload.provider.to_string(),
                payload.reference
            );
        }

        // Runs on every confirmation so a retry can finish a clear that failed before.
        let cart_cleared = match self.store.clear_cart(&order.user_id).await {
            Ok(removed) => {
                tracing::debug!("Removed {} cart item(s) of user {}", removed, order.user_id);
                true
            }
            Err(_) => {
                tracing::error!("Failed to clear cart of user {} after payment", order.user_id);
                false
            }
        };

        let items = self.store.find_items(&order.id).await.unwrap_or_else(|_| {
            tracing::error!("Failed to load items of order {} for notifications", order.id);
            vec![]
        });
        let customer = self
            .store
            .find_customer(&order.user_id)
            .await
            .unwrap_or_else(|_| {
                tracing::error!("Failed to look up customer {}", order.user_id);
                None
            });

        let email_sent = match (&customer, newly_paid) {
            (Some(customer), true) => match self
                .notifier
                .send(Notification::order_confirmed(
                    customer.clone(),
                    order.clone(),
                    items.clone(),
                ))
                .await
            {
                Ok(_) => true,
                Err(err) => {
                    tracing::error!(
                        "Failed to send confirmation email for order {}: {:?}",
                        order.id,
                        err
                    );
                    false
                }
            },
            (None, true) => {
                tracing::error!("Customer {} of order {} not found", order.user_id, order.id);
                false
            }
            (_, false) => false,
        };

        let customer_name = customer
            .as_ref()
            .map(User::full_name)
            .unwrap_or_else(|| order.shipping_address.full_name.clone());
        let whatsapp = Some(whatsapp::order_confirmed(
            self.storefront.whatsapp_number.as_deref(),
            &self.storefront.name,
            self.currency,
            &order,
            &items,
            &customer_name,
        ));

        Ok(Confirmation {
            order,
            newly_paid,
            cart_cleared,
            email_sent,
            whatsapp,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::modules::{
        notification::service,
        order::repository::{OrderStatus, PaymentStatus},
    };
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MemoryStore {
        pub orders: Mutex<HashMap<String, Order>>,
        pub items: HashMap<String, Vec<OrderItem>>,
        /// user id -> product ids in the cart
        pub carts: Mutex<HashMap<String, Vec<String>>>,
        pub customers: HashMap<String, User>,
        pub fail_mark_paid: bool,
        pub fail_clear_cart: bool,
    }

    #[async_trait]
    impl OrderStore for MemoryStore {
        async fn find_order(&self, order_id: &str) -> Result<Option<Order>, StoreError> {
            Ok(self.orders.lock().unwrap().get(order_id).cloned())
        }

        async fn mark_paid(
            &self,
            order_id: &str,
            provider: PaymentProvider,
            reference: &str,
        ) -> Result<Option<MarkedPaid>, StoreError> {
            if self.fail_mark_paid {
                return Err(StoreError);
            }

            let mut orders = self.orders.lock().unwrap();
            let Some(order) = orders.get_mut(order_id) else {
                return Ok(None);
            };

            let previous_payment_status = order.payment_status.clone();
            order.payment_status = PaymentStatus::Paid;
            if order.status == OrderStatus::Pending {
                order.status = OrderStatus::Confirmed;
            }
            order.payment_provider.get_or_insert(provider.to_string());
            order.payment_reference.get_or_insert(reference.to_string());

            Ok(Some(MarkedPaid {
                order: order.clone(),
                previous_payment_status,
            }))
        }

        async fn find_items(&self, order_id: &str) -> Result<Vec<OrderItem>, StoreError> {
            Ok(self.items.get(order_id).cloned().unwrap_or_default())
        }

        async fn clear_cart(&self, user_id: &str) -> Result<u64, StoreError> {
            if self.fail_clear_cart {
                return Err(StoreError);
            }

            Ok(self
                .carts
                .lock()
                .unwrap()
                .remove(user_id)
                .map(|items| items.len() as u64)
                .unwrap_or(0))
        }

        async fn find_customer(&self, user_id: &str) -> Result<Option<User>, StoreError> {
            Ok(self.customers.get(user_id).cloned())
        }
    }

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Notification>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, notification: Notification) -> service::Result<()> {
            if self.fail {
                return Err(service::Error::NotSent);
            }
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{MemoryStore, RecordingNotifier};
    use super::*;
    use crate::modules::{
        notification::service::email::fixtures,
        order::repository::{OrderStatus, PaymentStatus},
    };
    use std::str::FromStr;

    const OWNER: &str = "01J9ZKOWNER";
    const OTHER: &str = "01J9ZKOTHER";
    const ORDER: &str = "01J9ZKORDER";

    fn store() -> MemoryStore {
        let store = MemoryStore::default();
        store
            .orders
            .lock()
            .unwrap()
            .insert(ORDER.to_string(), fixtures::order(ORDER, OWNER));
        store.carts.lock().unwrap().extend([
            (OWNER.to_string(), vec!["P1".to_string(), "P2".to_string()]),
            (OTHER.to_string(), vec!["P3".to_string()]),
        ]);

        MemoryStore {
            items: [(ORDER.to_string(), vec![fixtures::item(ORDER)])].into(),
            customers: [(OWNER.to_string(), fixtures::customer(OWNER))].into(),
            ..store
        }
    }

    fn payload(access: Access) -> ConfirmPayment {
        ConfirmPayment {
            order_id: ORDER.to_string(),
            provider: PaymentProvider::Paystack,
            reference: format!("{}-01J9ZKATTEMPT", ORDER),
            amount: Some(BigDecimal::from_str("47500").unwrap()),
            currency: Some("NGN".to_string()),
            access,
        }
    }

    async fn confirm(
        store: &MemoryStore,
        notifier: &RecordingNotifier,
        payload: ConfirmPayment,
    ) -> Result<Confirmation, Error> {
        let storefront = fixtures::storefront();
        Pipeline {
            store,
            notifier,
            storefront: &storefront,
            currency: "NGN",
        }
        .confirm_order_payment(payload)
        .await
    }

    #[tokio::test]
    async fn owner_confirmation_marks_paid_clears_cart_and_emails() {
        let store = store();
        let notifier = RecordingNotifier::default();

        let confirmation = confirm(&store, &notifier, payload(Access::Owner(OWNER.to_string())))
            .await
            .unwrap();

        assert!(confirmation.newly_paid);
        assert_eq!(confirmation.order.payment_status, PaymentStatus::Paid);
        assert_eq!(confirmation.order.status, OrderStatus::Confirmed);
        assert!(confirmation.cart_cleared);
        assert!(confirmation.email_sent);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
        assert!(confirmation.whatsapp.unwrap().link.is_some());
    }

    #[tokio::test]
    async fn marking_paid_twice_leaves_the_same_state() {
        let store = store();
        let notifier = RecordingNotifier::default();

        let first = confirm(&store, &notifier, payload(Access::Service))
            .await
            .unwrap();
        let after_first = store.orders.lock().unwrap().get(ORDER).cloned().unwrap();

        let second = confirm(&store, &notifier, payload(Access::Service))
            .await
            .unwrap();
        let after_second = store.orders.lock().unwrap().get(ORDER).cloned().unwrap();

        assert!(first.newly_paid);
        assert!(!second.newly_paid);
        assert_eq!(after_first.payment_status, after_second.payment_status);
        assert_eq!(after_first.status, after_second.status);
        assert_eq!(after_first.payment_reference, after_second.payment_reference);
        assert_eq!(after_first.payment_provider, after_second.payment_provider);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replay_with_a_new_reference_keeps_the_first_one() {
        let store = store();
        let notifier = RecordingNotifier::default();

        confirm(&store, &notifier, payload(Access::Service))
            .await
            .unwrap();
        let mut replay = payload(Access::Service);
        replay.reference = format!("{}-01J9ZKSECOND", ORDER);
        let confirmation = confirm(&store, &notifier, replay).await.unwrap();

        assert_eq!(
            confirmation.order.payment_reference,
            Some(format!("{}-01J9ZKATTEMPT", ORDER))
        );
    }

    #[tokio::test]
    async fn confirmation_by_someone_else_is_rejected() {
        let store = store();
        let notifier = RecordingNotifier::default();

        let result = confirm(&store, &notifier, payload(Access::Owner(OTHER.to_string()))).await;

        assert_eq!(result.err(), Some(Error::NotOrderOwner));
        let order = store.orders.lock().unwrap().get(ORDER).cloned().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(store.carts.lock().unwrap().len(), 2);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn webhook_confirmation_skips_the_ownership_check() {
        let store = store();
        let notifier = RecordingNotifier::default();

        let confirmation = confirm(&store, &notifier, payload(Access::Service))
            .await
            .unwrap();

        assert_eq!(confirmation.order.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn cart_clearing_only_touches_the_paying_user() {
        let store = store();
        let notifier = RecordingNotifier::default();

        confirm(&store, &notifier, payload(Access::Owner(OWNER.to_string())))
            .await
            .unwrap();

        let carts = store.carts.lock().unwrap();
        assert!(!carts.contains_key(OWNER));
        assert_eq!(carts.get(OTHER), Some(&vec!["P3".to_string()]));
    }

    #[tokio::test]
    async fn failed_email_does_not_revert_the_order() {
        let store = store();
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };

        let confirmation = confirm(&store, &notifier, payload(Access::Owner(OWNER.to_string())))
            .await
            .unwrap();

        assert!(!confirmation.email_sent);
        let order = store.orders.lock().unwrap().get(ORDER).cloned().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn failed_cart_clear_is_not_fatal() {
        let store = MemoryStore {
            fail_clear_cart: true,
            ..store()
        };
        let notifier = RecordingNotifier::default();

        let confirmation = confirm(&store, &notifier, payload(Access::Service))
            .await
            .unwrap();

        assert!(!confirmation.cart_cleared);
        assert!(confirmation.email_sent);
    }

    #[tokio::test]
    async fn a_retried_confirmation_clears_a_cart_left_behind() {
        let store = MemoryStore {
            fail_clear_cart: true,
            ..store()
        };
        let notifier = RecordingNotifier::default();

        let first = confirm(&store, &notifier, payload(Access::Service))
            .await
            .unwrap();
        assert!(!first.cart_cleared);
        assert!(store.carts.lock().unwrap().contains_key(OWNER));

        let store = MemoryStore {
            fail_clear_cart: false,
            ..store
        };
        let retry = confirm(&store, &notifier, payload(Access::Service))
            .await
            .unwrap();

        assert!(!retry.newly_paid);
        assert!(retry.cart_cleared);
        assert!(!store.carts.lock().unwrap().contains_key(OWNER));
        assert_eq!(store.carts.lock().unwrap().get(OTHER), Some(&vec!["P3".to_string()]));
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn database_failure_leaves_the_order_unchanged() {
        let store = MemoryStore {
            fail_mark_paid: true,
            ..store()
        };
        let notifier = RecordingNotifier::default();

        let result = confirm(&store, &notifier, payload(Access::Service)).await;

        assert_eq!(result.err(), Some(Error::UnexpectedError));
        let order = store.orders.lock().unwrap().get(ORDER).cloned().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(store.carts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn underpayment_is_rejected() {
        let store = store();
        let notifier = RecordingNotifier::default();
        let mut payload = payload(Access::Service);
        payload.amount = Some(BigDecimal::from_str("47499.99").unwrap());

        let result = confirm(&store, &notifier, payload).await;

        assert_eq!(result.err(), Some(Error::AmountMismatch));
    }

    #[tokio::test]
    async fn payment_in_another_currency_is_rejected() {
        let store = store();
        let notifier = RecordingNotifier::default();
        let mut payload = payload(Access::Service);
        payload.currency = Some("UGX".to_string());

        let result = confirm(&store, &notifier, payload).await;

        assert_eq!(result.err(), Some(Error::CurrencyMismatch));
        let order = store.orders.lock().unwrap().get(ORDER).cloned().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn currency_codes_are_compared_case_insensitively() {
        let store = store();
        let notifier = RecordingNotifier::default();
        let mut payload = payload(Access::Service);
        payload.currency = Some("ngn".to_string());

        let confirmation = confirm(&store, &notifier, payload).await.unwrap();

        assert_eq!(confirmation.order.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn unknown_order_is_not_found() {
        let store = store();
        let notifier = RecordingNotifier::default();
        let mut payload = payload(Access::Service);
        payload.order_id = "01J9ZKMISSING".to_string();

        let result = confirm(&store, &notifier, payload).await;

        assert_eq!(result.err(), Some(Error::OrderNotFound));
    }
}
