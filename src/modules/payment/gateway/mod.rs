pub mod flutterwave;
pub mod paystack;

use crate::{modules::order::repository::PaymentProvider, types::Context};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::Serialize;
use std::str::FromStr;
use ulid::Ulid;

pub struct InitializePayment {
    pub order_id: String,
    pub order_number: String,
    pub amount: BigDecimal,
    pub currency: String,
    pub email: String,
    pub customer_name: String,
    pub callback_url: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PaymentSession {
    pub provider: PaymentProvider,
    pub authorization_url: String,
    pub reference: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransactionStatus {
    Successful,
    Failed,
    Pending,
}

#[derive(Clone, Debug)]
pub struct VerifiedPayment {
    pub status: TransactionStatus,
    pub reference: String,
    /// In major units.
    pub amount: Option<BigDecimal>,
    pub currency: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug)]
pub enum Error {
    InvalidAmount,
    RequestFailed,
    Rejected(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a hosted checkout for an order. Nothing is persisted.
    async fn initialize(&self, payload: InitializePayment) -> Result<PaymentSession, Error>;

    async fn verify(&self, reference: String) -> Result<VerifiedPayment, Error>;
}

pub fn for_provider(ctx: &Context, provider: PaymentProvider) -> Box<dyn PaymentGateway> {
    match provider {
        PaymentProvider::Paystack => Box::new(paystack::Paystack::new(
            ctx.http.clone(),
            ctx.payment.paystack.clone(),
        )),
        PaymentProvider::Flutterwave => Box::new(flutterwave::Flutterwave::new(
            ctx.http.clone(),
            ctx.payment.flutterwave.clone(),
        )),
    }
}

/// `<order id>-<ulid>`. Unique per attempt and only uses characters both providers accept.
pub fn generate_reference(order_id: &str) -> String {
    format!("{}-{}", order_id, Ulid::new())
}

pub fn order_id_from_reference(reference: &str) -> Option<String> {
    reference
        .split_once('-')
        .map(|(order_id, _)| order_id)
        .filter(|order_id| !order_id.is_empty())
        .map(str::to_string)
}

/// Reads an amount that providers send either as a JSON number or a string.
pub fn decimal_from_json(value: &serde_json::Value) -> Option<BigDecimal> {
    match value {
        serde_json::Value::Number(number) => BigDecimal::from_str(&number.to_string()).ok(),
        serde_json::Value::String(raw) => BigDecimal::from_str(raw.trim()).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn references_carry_the_order_id() {
        let reference = generate_reference("01J9ZKORDER");

        assert!(reference.starts_with("01J9ZKORDER-"));
        assert_eq!(order_id_from_reference(&reference), Some("01J9ZKORDER".to_string()));
        assert_eq!(order_id_from_reference("-leading"), None);
        assert_eq!(order_id_from_reference("plain"), None);
    }

    #[test]
    fn amounts_are_read_from_numbers_and_strings() {
        assert_eq!(
            decimal_from_json(&json!(47500.5)),
            Some(BigDecimal::from_str("47500.5").unwrap())
        );
        assert_eq!(
            decimal_from_json(&json!("47500")),
            Some(BigDecimal::from(47500))
        );
        assert_eq!(decimal_from_json(&json!(null)), None);
    }
}
