use crate::{
    modules::auth::{middleware::Auth, repository, service},
    types::Context,
};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, Router},
};
use serde_json::json;
use std::sync::Arc;

async fn handler(State(ctx): State<Arc<Context>>, auth: Auth) -> impl IntoResponse {
    let session = match service::auth::verify_access_token(ctx.clone(), auth.access_token).await {
        Ok(session) => session,
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Invalid session token" })),
            )
        }
    };

    match repository::session::delete_by_id(&ctx.db_conn.pool, session.id).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "message": "Signed out successfully" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to sign out" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/", post(handler))
}
