pub mod request {
    use axum::http::header::{HeaderName, HeaderValue};
    use bytes::Bytes;
    use headers::{Error, Header};
    use serde::Deserialize;
    use std::iter;

    pub static X_PAYSTACK_SIGNATURE: HeaderName = HeaderName::from_static("x-paystack-signature");

    #[derive(Clone, Debug)]
    pub struct PaystackSignature(pub String);

    impl Header for PaystackSignature {
        fn name() -> &'static HeaderName {
            &X_PAYSTACK_SIGNATURE
        }

        fn decode<'i, I>(values: &mut I) -> Result<Self, Error>
        where
            Self: Sized,
            I: Iterator<Item = &'i HeaderValue>,
        {
            values
                .next()
                .and_then(|value| value.to_str().ok())
                .map(|value| Self(value.to_string()))
                .ok_or(Error::invalid())
        }

        fn encode<E>(&self, values: &mut E)
        where
            E: Extend<HeaderValue>,
        {
            if let Ok(value) = HeaderValue::from_str(&self.0) {
                values.extend(iter::once(value))
            }
        }
    }

    /// Envelope of every Paystack event. `data` is decoded per event.
    #[derive(Deserialize, Debug)]
    pub struct Event {
        pub event: String,
        #[serde(default)]
        pub data: serde_json::Value,
    }

    pub struct Payload {
        pub signature: PaystackSignature,
        pub body: Bytes,
    }
}

pub mod response {
    use axum::{extract::Json, http::StatusCode, response::IntoResponse};
    use serde_json::json;

    pub enum Success {
        Processed,
        Ignored,
    }

    impl IntoResponse for Success {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::Processed => (
                    StatusCode::OK,
                    Json(json!({ "message": "Event processed" })),
                )
                    .into_response(),
                Self::Ignored => (
                    StatusCode::OK,
                    Json(json!({ "message": "Event ignored" })),
                )
                    .into_response(),
            }
        }
    }

    pub enum Error {
        InvalidSignature,
        InvalidPayload,
        OrderNotFound,
        ServerError,
    }

    impl IntoResponse for Error {
        fn into_response(self) -> axum::response::Response {
            match self {
                Self::InvalidSignature => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid signature" })),
                )
                    .into_response(),
                Self::InvalidPayload => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "Invalid payload" })),
                )
                    .into_response(),
                Self::OrderNotFound => (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "Order not found" })),
                )
                    .into_response(),
                Self::ServerError => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to process event" })),
                )
                    .into_response(),
            }
        }
    }

    pub type Response = Result<Success, Error>;
}
