use super::{
    decimal_from_json, order_id_from_reference, Error, InitializePayment, PaymentGateway,
    PaymentSession, TransactionStatus, VerifiedPayment,
};
use crate::{
    modules::{order::repository::PaymentProvider, payment::utils},
    types::FlutterwaveContext,
};
use async_trait::async_trait;
use axum::http::Method;
use serde::Deserialize;
use serde_json::json;

pub struct Flutterwave {
    client: reqwest::Client,
    config: FlutterwaveContext,
}

impl Flutterwave {
    pub fn new(client: reqwest::Client, config: FlutterwaveContext) -> Self {
        Self { client, config }
    }
}

#[derive(Deserialize)]
struct PaymentLink {
    link: String,
}

#[derive(Deserialize)]
struct InitializeResponse {
    status: String,
    message: String,
    data: Option<PaymentLink>,
}

#[derive(Deserialize)]
pub struct TransactionData {
    pub status: String,
    pub tx_ref: String,
    #[serde(default)]
    pub amount: serde_json::Value,
    pub currency: Option<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Deserialize)]
struct VerifyResponse {
    status: String,
    message: String,
    data: Option<TransactionData>,
}

impl TransactionData {
    pub fn into_verified_payment(self) -> VerifiedPayment {
        let status = match self.status.as_str() {
            "successful" => TransactionStatus::Successful,
            "failed" | "cancelled" => TransactionStatus::Failed,
            _ => TransactionStatus::Pending,
        };
        let order_id = self
            .meta
            .get("order_id")
            .and_then(|order_id| order_id.as_str())
            .map(str::to_string)
            .or_else(|| order_id_from_reference(&self.tx_ref));

        VerifiedPayment {
            status,
            amount: decimal_from_json(&self.amount),
            currency: self.currency,
            order_id,
            reference: self.tx_ref,
        }
    }
}

#[async_trait]
impl PaymentGateway for Flutterwave {
    async fn initialize(&self, payload: InitializePayment) -> Result<PaymentSession, Error> {
        let tx_ref = super::generate_reference(&payload.order_id);

        let res = utils::send_request::<InitializeResponse>(
            &self.client,
            utils::SendRequestPayload {
                base_url: &self.config.api_endpoint,
                secret_key: &self.config.secret_key,
                route: "/v3/payments".to_string(),
                method: Method::POST,
                body: Some(json!({
                    "tx_ref": tx_ref,
                    "amount": payload.amount.to_string(),
                    "currency": payload.currency,
                    "redirect_url": payload.callback_url,
                    "customer": {
                        "email": payload.email,
                        "name": payload.customer_name,
                    },
                    "meta": {
                        "order_id": payload.order_id,
                        "order_number": payload.order_number,
                    },
                    "customizations": {
                        "title": format!("Order {}", payload.order_number),
                    },
                })),
                query: None,
            },
        )
        .await
        .map_err(|_| Error::RequestFailed)?;

        match (res.status.as_str(), res.data) {
            ("success", Some(data)) => Ok(PaymentSession {
                provider: PaymentProvider::Flutterwave,
                authorization_url: data.link,
                reference: tx_ref,
            }),
            _ => {
                tracing::error!("Flutterwave refused to initialize payment: {}", res.message);
                Err(Error::Rejected(res.message))
            }
        }
    }

    async fn verify(&self, reference: String) -> Result<VerifiedPayment, Error> {
        let query = [("tx_ref", reference.as_str())];
        let res = utils::send_request::<VerifyResponse>(
            &self.client,
            utils::SendRequestPayload {
                base_url: &self.config.api_endpoint,
                secret_key: &self.config.secret_key,
                route: "/v3/transactions/verify_by_reference".to_string(),
                method: Method::GET,
                body: None,
                query: Some(&query),
            },
        )
        .await
        .map_err(|_| Error::RequestFailed)?;

        match (res.status.as_str(), res.data) {
            ("success", Some(data)) => Ok(data.into_verified_payment()),
            _ => {
                tracing::warn!("Flutterwave could not verify {}: {}", reference, res.message);
                Err(Error::Rejected(res.message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn reads_successful_transactions_in_major_units() {
        let data: TransactionData = serde_json::from_value(json!({
            "id": 5120184,
            "status": "successful",
            "tx_ref": "01J9ZKORDER-01J9ZKATTEMPT",
            "amount": 47500,
            "currency": "NGN",
        }))
        .unwrap();

        let payment = data.into_verified_payment();

        assert_eq!(payment.status, TransactionStatus::Successful);
        assert_eq!(payment.amount, Some(BigDecimal::from(47500)));
        assert_eq!(payment.order_id, Some("01J9ZKORDER".to_string()));
    }

    #[test]
    fn unknown_statuses_are_treated_as_pending() {
        let data: TransactionData = serde_json::from_value(json!({
            "status": "processing",
            "tx_ref": "01J9ZKORDER-01J9ZKATTEMPT",
        }))
        .unwrap();

        assert_eq!(data.into_verified_payment().status, TransactionStatus::Pending);
    }
}
