mod service;
mod types;

use crate::types::Context;
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{post, Router},
};
use std::sync::Arc;

async fn handler(
    State(ctx): State<Arc<Context>>,
    Json(payload): Json<types::request::Payload>,
) -> impl IntoResponse {
    service::service(ctx, payload).await
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/", post(handler))
}
