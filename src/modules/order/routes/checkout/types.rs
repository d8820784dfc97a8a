pub mod request {
    use crate::modules::auth::middleware::Auth;
    use serde::Deserialize;
    use validator::Validate;

    #[derive(Deserialize, Validate)]
    pub struct Body {
        #[validate(length(min = 1, message = "Address is required"))]
        pub address_id: String,
        #[validate(length(max = 64))]
        pub discount_code: Option<String>,
    }

    pub struct Payload {
        pub auth: Auth,
        pub body: Body,
    }
}

pub mod response {
    use crate::modules::order::repository::FullOrder;
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;
    use validator::ValidationErrors;

    pub enum Success {
        OrderCreated(FullOrder),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::OrderCreated(order) => (StatusCode::CREATED, Json(json!(order))).into_response(),
            }
        }
    }

    pub enum Error {
        FailedToValidate(ValidationErrors),
        AddressNotFound,
        EmptyCart,
        ProductUnavailable(String),
        OutOfStock(String),
        DiscountNotFound,
        DiscountRejected(String),
        FailedToCreateOrder,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToValidate(errors) => {
                    (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
                }
                Self::AddressNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Address not found" })),
                )
                    .into_response(),
                Self::EmptyCart => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Cart is empty" })),
                )
                    .into_response(),
                Self::ProductUnavailable(name) => (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": format!("{} is no longer available", name) })),
                )
                    .into_response(),
                Self::OutOfStock(name) => (
                    StatusCode::CONFLICT,
                    Json(json!({ "error": format!("Not enough {} in stock", name) })),
                )
                    .into_response(),
                Self::DiscountNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Invalid discount code" })),
                )
                    .into_response(),
                Self::DiscountRejected(reason) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": reason })),
                )
                    .into_response(),
                Self::FailedToCreateOrder => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to create order" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
