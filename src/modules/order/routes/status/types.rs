pub mod response {
    use crate::modules::order::repository::{OrderStatus, PaymentStatus};
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    #[derive(Debug)]
    pub enum Success {
        Status {
            status: OrderStatus,
            payment_status: PaymentStatus,
        },
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Status {
                    status,
                    payment_status,
                } => (
                    StatusCode::OK,
                    Json(json!({ "status": status, "payment_status": payment_status })),
                )
                    .into_response(),
            }
        }
    }

    #[derive(Debug, PartialEq)]
    pub enum Error {
        OrderNotFound,
        FailedToFetchOrder,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::OrderNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Order not found" })),
                )
                    .into_response(),
                Self::FailedToFetchOrder => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch order" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
