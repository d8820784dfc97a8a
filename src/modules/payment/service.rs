use super::{
    confirmation::{self, Access, ConfirmPayment, Confirmation, PgOrderStore, Pipeline},
    gateway::VerifiedPayment,
};
use crate::{
    modules::{notification::service::Mailer, order::repository::PaymentProvider},
    types::Context,
};
use std::sync::Arc;

/// Runs the confirmation pipeline against Postgres and the SMTP mailer.
pub async fn confirm_order_payment(
    ctx: Arc<Context>,
    payload: ConfirmPayment,
) -> Result<Confirmation, confirmation::Error> {
    let store = PgOrderStore::new(ctx.db_conn.pool.clone());
    let mailer = Mailer::new(ctx.clone());

    Pipeline {
        store: &store,
        notifier: &mailer,
        storefront: &ctx.storefront,
        currency: &ctx.payment.currency,
    }
    .confirm_order_payment(payload)
    .await
}

impl ConfirmPayment {
    pub fn from_verified(
        order_id: String,
        provider: PaymentProvider,
        payment: VerifiedPayment,
        access: Access,
    ) -> Self {
        Self {
            order_id,
            provider,
            reference: payment.reference,
            amount: payment.amount,
            currency: payment.currency,
            access,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::{
        notification::service::email::fixtures,
        order::repository::PaymentStatus,
        payment::{
            confirmation::testing::{MemoryStore, RecordingNotifier},
            gateway::TransactionStatus,
        },
    };
    use bigdecimal::BigDecimal;

    fn verified(currency: Option<&str>) -> VerifiedPayment {
        VerifiedPayment {
            status: TransactionStatus::Successful,
            reference: "01J9ZKORDER-01J9ZKATTEMPT".to_string(),
            amount: Some(BigDecimal::from(47500)),
            currency: currency.map(str::to_string),
            order_id: Some("01J9ZKORDER".to_string()),
        }
    }

    async fn confirm_verified(payment: VerifiedPayment) -> (MemoryStore, Result<Confirmation, confirmation::Error>) {
        let store = MemoryStore::default();
        store.orders.lock().unwrap().insert(
            "01J9ZKORDER".to_string(),
            fixtures::order("01J9ZKORDER", "01J9ZKOWNER"),
        );
        let notifier = RecordingNotifier::default();
        let storefront = fixtures::storefront();

        let result = Pipeline {
            store: &store,
            notifier: &notifier,
            storefront: &storefront,
            currency: "NGN",
        }
        .confirm_order_payment(ConfirmPayment::from_verified(
            "01J9ZKORDER".to_string(),
            PaymentProvider::Paystack,
            payment,
            Access::Service,
        ))
        .await;

        (store, result)
    }

    #[tokio::test]
    async fn verified_charge_in_a_foreign_currency_does_not_pay_the_order() {
        let (store, result) = confirm_verified(verified(Some("UGX"))).await;

        assert_eq!(result.err(), Some(confirmation::Error::CurrencyMismatch));
        let order = store.orders.lock().unwrap().get("01J9ZKORDER").cloned().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn verified_charge_without_a_currency_falls_back_to_the_amount_check() {
        let (_, result) = confirm_verified(verified(None)).await;

        assert_eq!(result.unwrap().order.payment_status, PaymentStatus::Paid);
    }
}
