use super::types::{request, response};
use crate::{
    modules::{
        auth::service::{auth, password},
        user,
    },
    types::Context,
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let user = user::repository::find_by_email(&ctx.db_conn.pool, payload.email)
        .await
        .map_err(|_| response::Error::FailedToSignIn)?
        .ok_or(response::Error::InvalidCredentials)?;

    if !password::verify(&payload.password, &user.password_hash) {
        tracing::warn!("Failed sign in attempt for user {}", user.id);
        return Err(response::Error::InvalidCredentials);
    }

    let session = auth::create_session(ctx, user.id.clone())
        .await
        .map_err(|_| response::Error::FailedToSignIn)?;

    Ok(response::Success::SignedIn { user, session })
}
