use super::{
    service::service,
    types::{request, response},
};
use crate::types::Context;
use axum::extract::State;
use axum_extra::TypedHeader;
use bytes::Bytes;
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    TypedHeader(hash): TypedHeader<request::VerifHash>,
    body: Bytes,
) -> response::Response {
    let event = serde_json::from_slice::<request::Event>(body.as_ref()).map_err(|err| {
        tracing::warn!("Failed to parse flutterwave event: {}", err);
        response::Error::InvalidPayload
    })?;

    service(ctx, request::Payload { hash, event }).await
}
