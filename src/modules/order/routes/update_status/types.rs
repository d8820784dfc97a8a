pub mod request {
    use crate::modules::order::repository::OrderStatus;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    pub struct Body {
        pub status: OrderStatus,
        #[validate(length(max = 128))]
        pub tracking_code: Option<String>,
        #[validate(url(message = "Tracking url must be a valid url"))]
        pub tracking_url: Option<String>,
    }

    pub struct Payload {
        pub id: String,
        pub body: Body,
    }
}

pub mod response {
    use crate::modules::order::repository::Order;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    pub enum Success {
        StatusUpdated { order: Order, email_sent: bool },
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::StatusUpdated { order, email_sent } => (
                    StatusCode::OK,
                    Json(json!({ "order": order, "email_sent": email_sent })),
                )
                    .into_response(),
            }
        }
    }

    #[derive(Debug)]
    pub enum Error {
        FailedToValidate(ValidationErrors),
        TrackingCodeRequired,
        OrderNotFound,
        FailedToUpdateOrderStatus,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => {
                    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
                }
                Self::TrackingCodeRequired => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "A tracking code is required to mark an order as shipped" })),
                )
                    .into_response(),
                Self::OrderNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Order not found" })),
                )
                    .into_response(),
                Self::FailedToUpdateOrderStatus => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to update order status" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
