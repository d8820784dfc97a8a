use super::service::service;
use crate::{modules::payment::confirmation::PgOrderStore, types::Context};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn handler(State(ctx): State<Arc<Context>>, Path(id): Path<String>) -> impl IntoResponse {
    service(&PgOrderStore::new(ctx.db_conn.pool.clone()), id).await
}
