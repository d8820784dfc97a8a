use super::service;
use crate::modules::user;
use crate::modules::user::repository::User;
use crate::types::Context;
use axum::extract::{Extension, FromRequestParts};
use axum::http::{self, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Json, RequestPartsExt};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

enum Error {
    InvalidSession,
}

fn get_access_token_from_header(header: &str) -> Result<String, Error> {
    let mut parts = header.split_whitespace();

    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            Ok(token.to_string())
        }
        _ => Err(Error::InvalidSession),
    }
}

async fn get_user_from_header(ctx: Arc<Context>, header: &str) -> Result<User, Error> {
    let access_token = get_access_token_from_header(header)?;
    let session = service::auth::verify_access_token(ctx.clone(), access_token)
        .await
        .map_err(|_| Error::InvalidSession)?;

    user::repository::find_by_id(&ctx.db_conn.pool, session.user_id)
        .await
        .map_err(|_| Error::InvalidSession)?
        .ok_or(Error::InvalidSession)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Invalid session token" })),
    )
        .into_response()
}

async fn get_user_from_request(parts: &mut Parts) -> Result<(User, String), Response> {
    let Extension(ctx) = parts
        .extract::<Extension<Arc<Context>>>()
        .await
        .map_err(|err| {
            tracing::error!("Context extension missing from request: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        })?;

    let auth_header = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(unauthorized)?
        .to_string();

    let session_token = get_access_token_from_header(&auth_header).map_err(|_| unauthorized())?;

    get_user_from_header(ctx, &auth_header)
        .await
        .map(|user| (user, session_token))
        .map_err(|_| unauthorized())
}

#[derive(Serialize, Clone)]
pub struct Auth {
    pub user: User,
    #[serde(skip)]
    pub access_token: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        get_user_from_request(parts)
            .await
            .map(|(user, access_token)| Self { user, access_token })
    }
}

#[derive(Serialize, Clone)]
pub struct AdminAuth {
    pub user: User,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AdminAuth {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let (user, _) = get_user_from_request(parts).await.map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Unauthorized" })),
            )
                .into_response()
        })?;

        if !user::repository::is_admin(&user) {
            return Err(
                (StatusCode::FORBIDDEN, Json(json!({ "error": "Forbidden" }))).into_response(),
            );
        }

        Ok(Self { user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(
            get_access_token_from_header("Bearer 01J9ZK").ok(),
            Some("01J9ZK".to_string())
        );
        assert_eq!(
            get_access_token_from_header("bearer 01J9ZK").ok(),
            Some("01J9ZK".to_string())
        );
    }

    #[test]
    fn rejects_other_schemes_and_empty_tokens() {
        assert!(get_access_token_from_header("Basic dXNlcjpwYXNz").is_err());
        assert!(get_access_token_from_header("Bearer").is_err());
        assert!(get_access_token_from_header("").is_err());
    }
}
