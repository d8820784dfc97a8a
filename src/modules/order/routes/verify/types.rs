pub mod request {
    use crate::modules::{auth::middleware::Auth, order::repository::PaymentProvider};
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    pub struct Body {
        pub provider: PaymentProvider,
        #[validate(length(min = 1, max = 128, message = "Reference is required"))]
        pub reference: String,
    }

    pub struct Payload {
        pub id: String,
        pub auth: Auth,
        pub body: Body,
    }
}

pub mod response {
    use crate::modules::payment::confirmation::Confirmation;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    pub enum Success {
        Confirmed(Confirmation),
        Pending,
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Confirmed(confirmation) => {
                    (StatusCode::OK, Json(json!(confirmation))).into_response()
                }
                Self::Pending => (
                    StatusCode::ACCEPTED,
                    Json(json!({ "message": "Payment is still being processed" })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        FailedToValidate(ValidationErrors),
        OrderNotFound,
        NotOrderOwner,
        ReferenceMismatch,
        AmountMismatch,
        CurrencyMismatch,
        PaymentFailed,
        ProviderError,
        FailedToConfirmPayment,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => {
                    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
                }
                Self::OrderNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Order not found" })),
                )
                    .into_response(),
                Self::NotOrderOwner => (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": "You do not own this order" })),
                )
                    .into_response(),
                Self::ReferenceMismatch => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Payment reference does not belong to this order" })),
                )
                    .into_response(),
                Self::AmountMismatch => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Amount paid does not cover the order total" })),
                )
                    .into_response(),
                Self::CurrencyMismatch => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Payment was made in the wrong currency" })),
                )
                    .into_response(),
                Self::PaymentFailed => (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({ "error": "Payment was not successful" })),
                )
                    .into_response(),
                Self::ProviderError => (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "Payment provider could not verify the payment" })),
                )
                    .into_response(),
                Self::FailedToConfirmPayment => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to confirm payment" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
