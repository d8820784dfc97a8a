use std::sync::Arc;

use super::repository;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    modules::auth::middleware::AdminAuth,
    types::Context,
    utils::{pagination::Pagination, validation},
};

#[derive(Deserialize, Validate)]
struct SubscribePayload {
    #[validate(email(code = "INVALID_EMAIL", message = "Invalid email address"))]
    email: String,
}

async fn subscribe(
    State(ctx): State<Arc<Context>>,
    Json(payload): Json<SubscribePayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    match repository::subscribe(&ctx.db_conn.pool, payload.email).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Subscribed to the newsletter" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to subscribe" })),
        ),
    }
}

async fn list_subscribers(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
) -> impl IntoResponse {
    match repository::find_many(&ctx.db_conn.pool, pagination).await {
        Ok(paginated_subscribers) => (StatusCode::OK, Json(json!(paginated_subscribers))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch subscribers" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/subscribe", post(subscribe))
}

pub fn get_admin_router() -> Router<Arc<Context>> {
    Router::new().route("/", get(list_subscribers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn rejects_invalid_email_before_touching_the_database() {
        let ctx = test_support::context();
        let app = get_router().with_state(ctx);

        let response = app
            .oneshot(
                Request::post("/subscribe")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"not-an-email"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
