mod flutterwave;
mod paystack;

use crate::types::Context;
use axum::routing::{post, Router};
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/paystack", post(paystack::handler::handler))
        .route("/flutterwave", post(flutterwave::handler::handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Extension,
    };
    use hmac::{Hmac, Mac};
    use sha2::Sha512;
    use tower::ServiceExt;

    fn app() -> Router {
        let ctx = test_support::context();
        get_router()
            .with_state(ctx.clone())
            .layer(Extension(ctx))
    }

    fn sign(body: &str) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(b"sk_test_secret").unwrap();
        mac.update(body.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[tokio::test]
    async fn paystack_rejects_a_forged_signature() {
        let body = r#"{"event":"charge.success","data":{}}"#;
        let response = app()
            .oneshot(
                Request::post("/paystack")
                    .header("content-type", "application/json")
                    .header("x-paystack-signature", sign("something else"))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn paystack_rejects_a_missing_signature() {
        let response = app()
            .oneshot(
                Request::post("/paystack")
                    .body(Body::from(r#"{"event":"charge.success","data":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn paystack_acknowledges_unhandled_events() {
        let body = r#"{"event":"transfer.success","data":{"reference":"x"}}"#;
        let response = app()
            .oneshot(
                Request::post("/paystack")
                    .header("x-paystack-signature", sign(body))
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn flutterwave_rejects_a_wrong_hash() {
        let response = app()
            .oneshot(
                Request::post("/flutterwave")
                    .header("verif-hash", "not-the-hash")
                    .body(Body::from(r#"{"event":"charge.completed","data":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn flutterwave_acknowledges_unhandled_events() {
        let response = app()
            .oneshot(
                Request::post("/flutterwave")
                    .header("verif-hash", "flw-hash")
                    .body(Body::from(r#"{"event":"transfer.completed","data":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
