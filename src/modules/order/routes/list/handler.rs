use super::{service::service, types::request};
use crate::{
    modules::auth::middleware::{AdminAuth, Auth},
    types::Context,
    utils::pagination::Pagination,
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    auth: Auth,
    pagination: Pagination,
    Query(filters): Query<request::Filters>,
) -> impl IntoResponse {
    service(
        ctx,
        request::Payload {
            user_id: Some(auth.user.id),
            pagination,
            filters,
        },
    )
    .await
}

pub async fn admin_handler(
    State(ctx): State<Arc<Context>>,
    _: AdminAuth,
    pagination: Pagination,
    Query(filters): Query<request::Filters>,
) -> impl IntoResponse {
    service(
        ctx,
        request::Payload {
            user_id: None,
            pagination,
            filters,
        },
    )
    .await
}
