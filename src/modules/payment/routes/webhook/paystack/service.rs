use super::types::{request, response};
use crate::{
    modules::{
        order::repository::PaymentProvider,
        payment::{
            confirmation::{self, Access, ConfirmPayment},
            gateway::{paystack::TransactionData, TransactionStatus},
            service,
        },
    },
    types::Context,
};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use std::sync::Arc;

/// `x-paystack-signature` is the hex HMAC-SHA512 of the raw body keyed with the secret key.
fn verify_header(
    secret_key: &str,
    signature: &request::PaystackSignature,
    body: &[u8],
) -> Result<(), response::Error> {
    let mut mac = Hmac::<Sha512>::new_from_slice(secret_key.as_bytes()).map_err(|err| {
        tracing::error!("Failed to generate mac: {:?}", err);
        response::Error::InvalidSignature
    })?;

    mac.update(body);

    let signature = hex::decode(signature.0.trim()).map_err(|err| {
        tracing::warn!("Paystack signature is not valid hex: {:?}", err);
        response::Error::InvalidSignature
    })?;

    mac.verify_slice(&signature).map_err(|err| {
        tracing::warn!("Failed to verify paystack signature: {:?}", err);
        response::Error::InvalidSignature
    })
}

async fn charge_successful(ctx: Arc<Context>, data: TransactionData) -> response::Response {
    let payment = data.into_verified_payment();

    if payment.status != TransactionStatus::Successful {
        tracing::warn!(
            "Ignoring charge.success for {} with non-successful status",
            payment.reference
        );
        return Ok(response::Success::Ignored);
    }

    let order_id = payment.order_id.clone().ok_or_else(|| {
        tracing::error!("No order id on paystack transaction {}", payment.reference);
        response::Error::InvalidPayload
    })?;

    let confirmation = service::confirm_order_payment(
        ctx,
        ConfirmPayment::from_verified(order_id, PaymentProvider::Paystack, payment, Access::Service),
    )
    .await
    .map_err(|err| match err {
        confirmation::Error::OrderNotFound => response::Error::OrderNotFound,
        confirmation::Error::AmountMismatch | confirmation::Error::CurrencyMismatch => {
            response::Error::InvalidPayload
        }
        confirmation::Error::NotOrderOwner | confirmation::Error::UnexpectedError => {
            response::Error::ServerError
        }
    })?;

    tracing::info!(
        "Paystack confirmed order {} (newly paid: {})",
        confirmation.order.id,
        confirmation.newly_paid
    );

    Ok(response::Success::Processed)
}

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    verify_header(
        &ctx.payment.paystack.secret_key,
        &payload.signature,
        payload.body.as_ref(),
    )?;

    let event = serde_json::from_slice::<request::Event>(payload.body.as_ref()).map_err(|err| {
        tracing::warn!("Failed to parse paystack event: {}", err);
        response::Error::InvalidPayload
    })?;

    tracing::debug!("Received paystack event {}: {}", event.event, event.data);

    match event.event.as_str() {
        "charge.success" => {
            let data = serde_json::from_value::<TransactionData>(event.data).map_err(|err| {
                tracing::warn!("Failed to parse charge.success data: {}", err);
                response::Error::InvalidPayload
            })?;

            charge_successful(ctx, data).await
        }
        _ => Ok(response::Success::Ignored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn accepts_a_signature_made_with_the_secret_key() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = request::PaystackSignature(sign("sk_test_secret", body));

        assert!(verify_header("sk_test_secret", &signature, body).is_ok());
    }

    #[test]
    fn rejects_a_signature_made_with_another_key() {
        let body = br#"{"event":"charge.success"}"#;
        let signature = request::PaystackSignature(sign("sk_test_other", body));

        assert!(matches!(
            verify_header("sk_test_secret", &signature, body),
            Err(response::Error::InvalidSignature)
        ));
    }

    #[test]
    fn rejects_a_signature_that_is_not_hex() {
        let signature = request::PaystackSignature("zz-not-hex".to_string());

        assert!(matches!(
            verify_header("sk_test_secret", &signature, b"{}"),
            Err(response::Error::InvalidSignature)
        ));
    }
}
