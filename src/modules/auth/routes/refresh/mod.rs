use crate::{modules::auth::service, types::Context};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, Router},
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
struct Payload {
    refresh_token: String,
}

async fn handler(State(ctx): State<Arc<Context>>, Json(payload): Json<Payload>) -> impl IntoResponse {
    match service::auth::regenerate_tokens_for_session(ctx, payload.refresh_token).await {
        Ok(session) => (
            StatusCode::OK,
            Json(json!({
                "access_token": session.access_token,
                "refresh_token": session.refresh_token,
            })),
        ),
        Err(service::auth::Error::UnexpectedError) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to refresh session" })),
        ),
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid refresh token" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/", post(handler))
}
