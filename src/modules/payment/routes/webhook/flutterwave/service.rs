use super::types::{request, response};
use crate::{
    modules::{
        order::repository::{self as order_repository, PaymentProvider},
        payment::{
            confirmation::{self, Access, ConfirmPayment},
            gateway::{self, TransactionStatus},
            service,
        },
    },
    types::Context,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

fn digest(value: &str) -> Result<HmacSha256, response::Error> {
    let mut mac = HmacSha256::new_from_slice(b"flutterwave-verif-hash").map_err(|err| {
        tracing::error!("Failed to set up verif-hash comparison: {}", err);
        response::Error::ServerError
    })?;
    mac.update(value.as_bytes());
    Ok(mac)
}

/// Both sides are run through the same keyed digest so the comparison is
/// constant time whatever their lengths.
fn hashes_match(expected: &str, received: &str) -> Result<bool, response::Error> {
    let expected = digest(expected)?.finalize().into_bytes();
    Ok(digest(received)?.verify_slice(&expected).is_ok())
}

fn verify_hash(expected: &str, hash: &request::VerifHash) -> Result<(), response::Error> {
    match !expected.is_empty() && hashes_match(expected, &hash.0)? {
        true => Ok(()),
        false => {
            tracing::warn!("Received flutterwave webhook with an invalid verif-hash");
            Err(response::Error::InvalidSignature)
        }
    }
}

/// Webhook bodies are not signed, so the charge is fetched again before it is trusted.
async fn charge_completed(ctx: Arc<Context>, data: request::ChargeData) -> response::Response {
    let payment = gateway::for_provider(&ctx, PaymentProvider::Flutterwave)
        .verify(data.tx_ref.clone())
        .await
        .map_err(|err| {
            tracing::error!("Failed to verify flutterwave charge {}: {:?}", data.tx_ref, err);
            response::Error::VerificationFailed
        })?;

    let order_id = payment.order_id.clone().ok_or_else(|| {
        tracing::error!("No order id on flutterwave transaction {}", payment.reference);
        response::Error::InvalidPayload
    })?;

    match payment.status {
        TransactionStatus::Successful => {
            let confirmation = service::confirm_order_payment(
                ctx,
                ConfirmPayment::from_verified(
                    order_id,
                    PaymentProvider::Flutterwave,
                    payment,
                    Access::Service,
                ),
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
                "Flutterwave confirmed order {} (newly paid: {})",
                confirmation.order.id,
                confirmation.newly_paid
            );

            Ok(response::Success::Processed)
        }
        TransactionStatus::Failed => {
            let updated = order_repository::mark_failed(&ctx.db_conn.pool, order_id.clone())
                .await
                .map_err(|_| response::Error::ServerError)?;

            tracing::info!(
                "Flutterwave charge {} failed for order {} (recorded: {})",
                payment.reference,
                order_id,
                updated
            );

            Ok(response::Success::Processed)
        }
        TransactionStatus::Pending => Ok(response::Success::Ignored),
    }
}

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    verify_hash(&ctx.payment.flutterwave.webhook_hash, &payload.hash)?;

    tracing::debug!(
        "Received flutterwave event {}: {}",
        payload.event.event,
        payload.event.data
    );

    match payload.event.event.as_str() {
        "charge.completed" => {
            let data = serde_json::from_value::<request::ChargeData>(payload.event.data)
                .map_err(|err| {
                    tracing::warn!("Failed to parse charge.completed data: {}", err);
                    response::Error::InvalidPayload
                })?;

            if let Some(status) = &data.status {
                tracing::debug!("Flutterwave reports {} as {}", data.tx_ref, status);
            }

            charge_completed(ctx, data).await
        }
        _ => Ok(response::Success::Ignored),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_must_match_the_configured_one() {
        assert!(verify_hash("flw-hash", &request::VerifHash("flw-hash".to_string())).is_ok());
        assert!(verify_hash("flw-hash", &request::VerifHash("FLW-HASH".to_string())).is_err());
    }

    #[test]
    fn hashes_of_different_lengths_do_not_match() {
        assert!(!hashes_match("flw-hash", "flw-hash-and-more").unwrap());
        assert!(!hashes_match("flw-hash", "flw").unwrap());
        assert!(hashes_match("flw-hash", "flw-hash").unwrap());
    }

    #[test]
    fn an_unconfigured_hash_accepts_nothing() {
        assert!(verify_hash("", &request::VerifHash(String::new())).is_err());
    }
}
