pub mod request {
    use crate::{
        modules::order::repository::{OrderStatus, PaymentStatus},
        utils::pagination::Pagination,
    };
    use serde::Deserialize;

    #[derive(Deserialize, Default)]
    pub struct Filters {
        pub status: Option<OrderStatus>,
        pub payment_status: Option<PaymentStatus>,
    }

    pub struct Payload {
        /// `None` lists every customer's orders.
        pub user_id: Option<String>,
        pub pagination: Pagination,
        pub filters: Filters,
    }
}

pub mod response {
    use crate::{modules::order::repository::Order, utils::pagination::Paginated};
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Orders(Paginated<Order>),
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Orders(orders) => (StatusCode::OK, Json(json!(orders))).into_response(),
            }
        }
    }

    pub enum Error {
        FailedToFetchOrders,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::FailedToFetchOrders => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to fetch orders" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
