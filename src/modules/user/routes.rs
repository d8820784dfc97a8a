use std::sync::Arc;

use super::repository::{self, Role};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::{
    modules::auth::middleware::{AdminAuth, Auth},
    types::Context,
    utils::{
        pagination::Pagination,
        validation::{self, validate_phone_number},
    },
};

async fn get_profile(auth: Auth) -> impl IntoResponse {
    (StatusCode::OK, Json(json!(auth.user)))
}

#[derive(Deserialize, Validate)]
struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 64))]
    first_name: Option<String>,
    #[validate(length(min = 1, max = 64))]
    last_name: Option<String>,
    #[validate(custom(function = "validate_phone_number"))]
    phone_number: Option<String>,
}

async fn update_profile(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    Json(payload): Json<UpdateProfilePayload>,
) -> impl IntoResponse {
    if let Err(errors) = payload.validate() {
        return validation::into_response(errors);
    }

    match repository::update_by_id(
        &ctx.db_conn.pool,
        auth.user.id,
        repository::UpdateUserPayload {
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone_number: payload.phone_number,
        },
    )
    .await
    {
        Ok(Some(user)) => (StatusCode::OK, Json(json!(user))),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update profile" })),
        ),
    }
}

async fn list_users(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
    Query(filters): Query<repository::Filters>,
) -> impl IntoResponse {
    match repository::find_many(&ctx.db_conn.pool, pagination, filters).await {
        Ok(users) => (StatusCode::OK, Json(json!(users))),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to fetch users" })),
        ),
    }
}

#[derive(Deserialize)]
struct UpdateRolePayload {
    role: Role,
}

async fn update_role(
    State(ctx): State<Arc<Context>>,
    auth: AdminAuth,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRolePayload>,
) -> impl IntoResponse {
    if auth.user.id == id && payload.role != Role::Admin {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "You cannot remove your own admin role" })),
        );
    }

    match repository::update_role_by_id(&ctx.db_conn.pool, id, payload.role).await {
        Ok(Some(user)) => {
            tracing::info!(
                "Admin {} set role of user {} to {}",
                auth.user.id,
                user.id,
                user.role.to_string()
            );
            (StatusCode::OK, Json(json!(user)))
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "User not found" })),
        ),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Failed to update role" })),
        ),
    }
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

pub fn get_admin_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(list_users))
        .route("/:id/role", put(update_role))
}
