use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use super::repository;
use crate::{modules::auth::middleware::AdminAuth, types::Context};

async fn get_totals(State(ctx): State<Arc<Context>>, _: AdminAuth) -> impl IntoResponse {
    match repository::get_totals(&ctx.db_conn.pool).await {
        Ok(totals) => (StatusCode::OK, Json(json!(totals))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch dashboard" })),
        ),
    }
}

pub fn get_admin_router() -> Router<Arc<Context>> {
    Router::new().route("/", get(get_totals))
}
