use super::types::{request, response};
use crate::{modules::order::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    repository::find_many(
        &ctx.db_conn.pool,
        payload.pagination,
        repository::Filters {
            user_id: payload.user_id,
            status: payload.filters.status,
            payment_status: payload.filters.payment_status,
        },
    )
    .await
    .map(response::Success::Orders)
    .map_err(|_| response::Error::FailedToFetchOrders)
}
