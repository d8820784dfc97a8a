use super::types::{request, response};
use crate::{
    modules::{
        order::repository,
        payment::{
            confirmation::{self, Access, ConfirmPayment},
            gateway::{self, TransactionStatus},
            service as payment_service,
        },
    },
    types::Context,
};
use std::sync::Arc;
use validator::Validate;

async fn record_failure(ctx: Arc<Context>, payload: &request::Payload) -> response::Response {
    let order = repository::find_by_id(&ctx.db_conn.pool, payload.id.clone())
        .await
        .map_err(|_| response::Error::FailedToConfirmPayment)?
        .ok_or(response::Error::OrderNotFound)?;

    if order.user_id != payload.auth.user.id {
        return Err(response::Error::NotOrderOwner);
    }

    repository::mark_failed(&ctx.db_conn.pool, order.id)
        .await
        .map_err(|_| response::Error::FailedToConfirmPayment)?;

    Err(response::Error::PaymentFailed)
}

/// The browser-redirect half of payment confirmation. The customer may only
/// confirm their own order; the provider is asked directly for the outcome.
pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload
        .body
        .validate()
        .map_err(response::Error::FailedToValidate)?;

    let provider = payload.body.provider;
    let payment = gateway::for_provider(&ctx, provider)
        .verify(payload.body.reference.clone())
        .await
        .map_err(|err| {
            tracing::error!(
                "Failed to verify {} payment {}: {:?}",
                provider.to_string(),
                payload.body.reference,
                err
            );
            response::Error::ProviderError
        })?;

    if payment.order_id.as_deref() != Some(payload.id.as_str()) {
        tracing::warn!(
            "Payment {} does not belong to order {}",
            payment.reference,
            payload.id
        );
        return Err(response::Error::ReferenceMismatch);
    }

    match payment.status {
        TransactionStatus::Successful => payment_service::confirm_order_payment(
            ctx,
            ConfirmPayment::from_verified(
                payload.id,
                provider,
                payment,
                Access::Owner(payload.auth.user.id),
            ),
        )
        .await
        .map(response::Success::Confirmed)
        .map_err(|err| match err {
            confirmation::Error::OrderNotFound => response::Error::OrderNotFound,
            confirmation::Error::NotOrderOwner => response::Error::NotOrderOwner,
            confirmation::Error::AmountMismatch => response::Error::AmountMismatch,
            confirmation::Error::CurrencyMismatch => response::Error::CurrencyMismatch,
            confirmation::Error::UnexpectedError => response::Error::FailedToConfirmPayment,
        }),
        TransactionStatus::Failed => record_failure(ctx, &payload).await,
        TransactionStatus::Pending => Ok(response::Success::Pending),
    }
}
