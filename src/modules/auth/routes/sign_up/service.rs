use super::types::{request, response};
use crate::{
    modules::{
        auth::service::{auth, password},
        notification::service::{self as notification, Notification},
        user,
    },
    types::Context,
};
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    if user::repository::find_by_email(&ctx.db_conn.pool, payload.email.clone())
        .await
        .map_err(|_| response::Error::SignupFailed)?
        .is_some()
    {
        return Err(response::Error::EmailAlreadyInUse);
    }

    let password_hash =
        password::hash(&payload.password).map_err(|_| response::Error::SignupFailed)?;

    let user = user::repository::create(
        &ctx.db_conn.pool,
        user::repository::CreateUserPayload {
            email: payload.email,
            password_hash,
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone_number: payload.phone_number,
        },
    )
    .await
    .map_err(|_| response::Error::SignupFailed)?;

    let session = auth::create_session(ctx.clone(), user.id.clone())
        .await
        .map_err(|_| response::Error::SignupFailed)?;

    // Welcome emails are best effort.
    tokio::spawn(notification::send(
        ctx.clone(),
        Notification::registered(user.clone()),
    ));

    tracing::info!("User {} signed up", user.id);

    Ok(response::Success::SignedUp { user, session })
}
