use super::{
    order_id_from_reference, Error, InitializePayment, PaymentGateway, PaymentSession,
    TransactionStatus, VerifiedPayment,
};
use crate::{
    modules::{order::repository::PaymentProvider, payment::utils},
    types::PaystackContext,
    utils::money,
};
use async_trait::async_trait;
use axum::http::Method;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_json::json;

pub struct Paystack {
    client: reqwest::Client,
    config: PaystackContext,
}

impl Paystack {
    pub fn new(client: reqwest::Client, config: PaystackContext) -> Self {
        Self { client, config }
    }
}

#[derive(Deserialize)]
struct InitializeResponseData {
    authorization_url: String,
    reference: String,
}

#[derive(Deserialize)]
struct InitializeResponse {
    status: bool,
    message: String,
    data: Option<InitializeResponseData>,
}

#[derive(Deserialize)]
pub struct TransactionData {
    pub status: String,
    pub reference: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub amount: i64,
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

#[derive(Deserialize)]
struct VerifyResponse {
    status: bool,
    message: String,
    data: Option<TransactionData>,
}

impl TransactionData {
    /// Paystack sends `metadata` as an object, or as an empty string when unset.
    fn order_id(&self) -> Option<String> {
        self.metadata
            .get("order_id")
            .and_then(|order_id| order_id.as_str())
            .map(str::to_string)
            .or_else(|| order_id_from_reference(&self.reference))
    }

    pub fn into_verified_payment(self) -> VerifiedPayment {
        let status = match self.status.as_str() {
            "success" => TransactionStatus::Successful,
            "failed" | "abandoned" | "reversed" => TransactionStatus::Failed,
            _ => TransactionStatus::Pending,
        };

        VerifiedPayment {
            order_id: self.order_id(),
            status,
            amount: Some(money::from_minor_units(&BigDecimal::from(self.amount))),
            currency: self.currency,
            reference: self.reference,
        }
    }
}

#[async_trait]
impl PaymentGateway for Paystack {
    async fn initialize(&self, payload: InitializePayment) -> Result<PaymentSession, Error> {
        let amount = money::to_minor_units(&payload.amount).ok_or(Error::InvalidAmount)?;
        let reference = super::generate_reference(&payload.order_id);

        let res = utils::send_request::<InitializeResponse>(
            &self.client,
            utils::SendRequestPayload {
                base_url: &self.config.api_endpoint,
                secret_key: &self.config.secret_key,
                route: "/transaction/initialize".to_string(),
                method: Method::POST,
                body: Some(json!({
                    "email": payload.email,
                    "amount": amount,
                    "currency": payload.currency,
                    "reference": reference,
                    "callback_url": payload.callback_url,
                    "metadata": {
                        "order_id": payload.order_id,
                        "order_number": payload.order_number,
                        "customer_name": payload.customer_name,
                    },
                })),
                query: None,
            },
        )
        .await
        .map_err(|_| Error::RequestFailed)?;

        match (res.status, res.data) {
            (true, Some(data)) => Ok(PaymentSession {
                provider: PaymentProvider::Paystack,
                authorization_url: data.authorization_url,
                reference: data.reference,
            }),
            _ => {
                tracing::error!("Paystack refused to initialize payment: {}", res.message);
                Err(Error::Rejected(res.message))
            }
        }
    }

    async fn verify(&self, reference: String) -> Result<VerifiedPayment, Error> {
        let res = utils::send_request::<VerifyResponse>(
            &self.client,
            utils::SendRequestPayload {
                base_url: &self.config.api_endpoint,
                secret_key: &self.config.secret_key,
                route: format!("/transaction/verify/{}", urlencoding::encode(&reference)),
                method: Method::GET,
                body: None,
                query: None,
            },
        )
        .await
        .map_err(|_| Error::RequestFailed)?;

        match (res.status, res.data) {
            (true, Some(data)) => Ok(data.into_verified_payment()),
            _ => {
                tracing::warn!("Paystack could not verify {}: {}", reference, res.message);
                Err(Error::Rejected(res.message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn verified_amount_is_converted_from_kobo() {
        let data: TransactionData = serde_json::from_value(json!({
            "status": "success",
            "reference": "01J9ZKORDER-01J9ZKATTEMPT",
            "amount": 4750050,
            "currency": "NGN",
            "metadata": { "order_id": "01J9ZKORDER" },
        }))
        .unwrap();

        let payment = data.into_verified_payment();

        assert_eq!(payment.status, TransactionStatus::Successful);
        assert_eq!(payment.amount, Some(BigDecimal::from_str("47500.50").unwrap()));
        assert_eq!(payment.order_id, Some("01J9ZKORDER".to_string()));
    }

    #[test]
    fn order_id_falls_back_to_the_reference() {
        let data: TransactionData = serde_json::from_value(json!({
            "status": "abandoned",
            "reference": "01J9ZKORDER-01J9ZKATTEMPT",
            "amount": "100",
            "metadata": "",
        }))
        .unwrap();

        let payment = data.into_verified_payment();

        assert_eq!(payment.status, TransactionStatus::Failed);
        assert_eq!(payment.order_id, Some("01J9ZKORDER".to_string()));
    }
}
