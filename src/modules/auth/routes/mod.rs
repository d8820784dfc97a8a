mod refresh;
mod sign_in;
mod sign_out;
mod sign_up;

use crate::types::Context;
use axum::routing::Router;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .nest("/sign-up", sign_up::get_router())
        .nest("/sign-in", sign_in::get_router())
        .nest("/sign-out", sign_out::get_router())
        .nest("/refresh", refresh::get_router())
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

    fn app() -> Router {
        let ctx = test_support::context();
        get_router().with_state(ctx.clone()).layer(Extension(ctx))
    }

    #[tokio::test]
    async fn sign_up_rejects_invalid_payloads() {
        let response = app()
            .oneshot(
                Request::post("/sign-up")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"email":"not-an-email","password":"short","first_name":"","last_name":"Obi"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sign_out_requires_a_session() {
        let response = app()
            .oneshot(Request::post("/sign-out").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
