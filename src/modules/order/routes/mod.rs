mod checkout;
mod get;
mod list;
mod pay;
mod status;
mod update_status;
mod verify;
mod whatsapp;

use crate::types::Context;
use axum::routing::{get, post, put, Router};
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .merge(checkout::get_router())
        .route("/", get(list::handler))
        .route("/:id", get(get::handler))
        .route("/:id/status", get(status::handler))
        .route("/:id/pay", post(pay::handler))
        .route("/:id/verify", post(verify::handler))
}

pub fn get_admin_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list::admin_handler))
        .route("/:id/status", put(update_status::handler))
        .route("/:id/whatsapp", get(whatsapp::handler))
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
    use tower::ServiceExt;

    fn app(router: Router<Arc<Context>>) -> Router {
        let ctx = test_support::context();
        router.with_state(ctx.clone()).layer(Extension(ctx))
    }

    #[tokio::test]
    async fn checkout_requires_a_session() {
        let response = app(get_router())
            .oneshot(
                Request::post("/checkout")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"address_id":"A1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn verification_requires_a_session() {
        let response = app(get_router())
            .oneshot(
                Request::post("/01J9ZKORDER/verify")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"provider":"paystack","reference":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn status_updates_require_a_session() {
        let response = app(get_admin_router())
            .oneshot(
                Request::put("/01J9ZKORDER/status")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"status":"shipped"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
