use super::types::{request, response};
use crate::{
    modules::order::service::{self as order_service, CheckoutPayload},
    types::Context,
};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload
        .body
        .validate()
        .map_err(response::Error::FailedToValidate)?;

    order_service::checkout(
        ctx,
        CheckoutPayload {
            user_id: payload.auth.user.id,
            address_id: payload.body.address_id,
            discount_code: payload.body.discount_code,
            now: Utc::now().naive_utc(),
        },
    )
    .await
    .map(response::Success::OrderCreated)
    .map_err(|err| match err {
        order_service::Error::AddressNotFound => response::Error::AddressNotFound,
        order_service::Error::EmptyCart => response::Error::EmptyCart,
        order_service::Error::ProductUnavailable(name) => response::Error::ProductUnavailable(name),
        order_service::Error::OutOfStock(name) => response::Error::OutOfStock(name),
        order_service::Error::DiscountNotFound => response::Error::DiscountNotFound,
        order_service::Error::DiscountRejected(reason) => response::Error::DiscountRejected(reason),
        order_service::Error::UnexpectedError => response::Error::FailedToCreateOrder,
    })
}
