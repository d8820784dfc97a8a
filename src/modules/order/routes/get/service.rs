use super::types::{request, response};
use crate::{
    modules::{
        order::repository::{self, FullOrder},
        user,
    },
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let order = repository::find_by_id(&ctx.db_conn.pool, payload.id)
        .await
        .map_err(|_| response::Error::FailedToFetchOrder)?
        .ok_or(response::Error::OrderNotFound)?;

    // Other customers' orders are reported as missing rather than forbidden.
    if order.user_id != payload.auth.user.id && !user::repository::is_admin(&payload.auth.user) {
        return Err(response::Error::OrderNotFound);
    }

    let items = repository::find_items_by_order_id(&ctx.db_conn.pool, order.id.clone())
        .await
        .map_err(|_| response::Error::FailedToFetchOrder)?;

    Ok(response::Success::Order(FullOrder { order, items }))
}
