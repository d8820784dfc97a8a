use super::types::response;
use crate::{
    modules::{notification::whatsapp, order::repository},
    types::Context,
};
use std::sync::Arc;

/// Message for the store to send the customer by hand about the order's current state.
pub async fn service(ctx: Arc<Context>, id: String) -> response::Response {
    repository::find_by_id(&ctx.db_conn.pool, id)
        .await
        .map_err(|_| response::Error::FailedToFetchOrder)?
        .ok_or(response::Error::OrderNotFound)
        .map(|order| {
            response::Success::Message(whatsapp::order_status(&ctx.storefront.name, &order))
        })
}
