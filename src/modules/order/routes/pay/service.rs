use super::types::{request, response};
use crate::{
    modules::{
        order::repository::{self, Order, OrderStatus, PaymentProvider},
        payment::gateway::{self, InitializePayment},
    },
    types::{Context, StorefrontContext},
};
use std::sync::Arc;

/// Where the provider sends the customer once the hosted checkout is done.
fn callback_url(storefront: &StorefrontContext, order: &Order, provider: PaymentProvider) -> String {
    format!(
        "{}/orders/{}/confirmation?provider={}",
        storefront.url.trim_end_matches('/'),
        order.id,
        provider.to_string()
    )
}

fn initialize_error(err: gateway::Error) -> response::Error {
    match err {
        gateway::Error::InvalidAmount => response::Error::FailedToInitializePayment,
        gateway::Error::RequestFailed => response::Error::ProviderError(None),
        gateway::Error::Rejected(message) => response::Error::ProviderError(Some(message)),
    }
}

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let order = repository::find_by_id(&ctx.db_conn.pool, payload.id)
        .await
        .map_err(|_| response::Error::FailedToInitializePayment)?
        .ok_or(response::Error::OrderNotFound)?;

    if order.user_id != payload.auth.user.id {
        return Err(response::Error::NotOrderOwner);
    }

    if order.is_paid() {
        return Err(response::Error::PaymentAlreadyMade);
    }

    if order.status == OrderStatus::Cancelled {
        return Err(response::Error::OrderCancelled);
    }

    let provider = payload.body.provider;
    let session = gateway::for_provider(&ctx, provider)
        .initialize(InitializePayment {
            callback_url: callback_url(&ctx.storefront, &order, provider),
            order_id: order.id.clone(),
            order_number: order.order_number.clone(),
            amount: order.total.clone(),
            currency: ctx.payment.currency.clone(),
            email: payload.auth.user.email.clone(),
            customer_name: payload.auth.user.full_name(),
        })
        .await
        .map_err(|err| {
            tracing::error!(
                "Failed to initialize {} payment for order {}: {:?}",
                provider.to_string(),
                order.id,
                err
            );
            initialize_error(err)
        })?;

    tracing::info!(
        "Initialized {} payment {} for order {}",
        provider.to_string(),
        session.reference,
        order.id
    );

    Ok(response::Success::PaymentInitialized(session))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::notification::service::email::fixtures;

    #[test]
    fn provider_rejections_keep_the_provider_message() {
        assert!(matches!(
            initialize_error(gateway::Error::Rejected("Invalid currency".to_string())),
            response::Error::ProviderError(Some(message)) if message == "Invalid currency"
        ));
        assert!(matches!(
            initialize_error(gateway::Error::RequestFailed),
            response::Error::ProviderError(None)
        ));
        assert!(matches!(
            initialize_error(gateway::Error::InvalidAmount),
            response::Error::FailedToInitializePayment
        ));
    }

    #[test]
    fn callback_points_back_to_the_storefront_order() {
        let mut storefront = fixtures::storefront();
        storefront.url = "https://maison.test/".to_string();
        let order = fixtures::order("01J9ZKORDER", "U1");

        assert_eq!(
            callback_url(&storefront, &order, PaymentProvider::Flutterwave),
            "https://maison.test/orders/01J9ZKORDER/confirmation?provider=flutterwave"
        );
    }
}
