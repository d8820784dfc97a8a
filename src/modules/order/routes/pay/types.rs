pub mod request {
    use crate::modules::{auth::middleware::Auth, order::repository::PaymentProvider};
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub struct Body {
        pub provider: PaymentProvider,
    }

    pub struct Payload {
        pub id: String,
        pub auth: Auth,
        pub body: Body,
    }
}

pub mod response {
    use crate::modules::payment::gateway::PaymentSession;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        PaymentInitialized(PaymentSession),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::PaymentInitialized(session) => {
                    (StatusCode::OK, Json(json!(session))).into_response()
                }
            }
        }
    }

    pub enum Error {
        OrderNotFound,
        NotOrderOwner,
        PaymentAlreadyMade,
        OrderCancelled,
        /// Carries the provider's own message when it turned the request down.
        ProviderError(Option<String>),
        FailedToInitializePayment,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
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
                Self::PaymentAlreadyMade => (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": "Order has already been paid for" })),
                )
                    .into_response(),
                Self::OrderCancelled => (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": "Order has been cancelled" })),
                )
                    .into_response(),
                Self::ProviderError(reason) => (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({
                        "error": "Payment provider could not start the payment",
                        "reason": reason,
                    })),
                )
                    .into_response(),
                Self::FailedToInitializePayment => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to initialize payment" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
