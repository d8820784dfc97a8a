use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use super::{
    address, auth, back_in_stock, cart, dashboard, discount, newsletter, offer, order, payment,
    product, review, user, wishlist,
};
use crate::types::Context;
use std::sync::Arc;

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "message": "Welcome to the Maison API" })),
    )
}

fn get_admin_router() -> Router<Arc<Context>> {
    Router::new()
        .nest("/products", product::get_admin_router())
        .nest("/orders", order::get_admin_router())
        .nest("/discounts", discount::get_admin_router())
        .nest("/offers", offer::get_admin_router())
        .nest("/users", user::get_admin_router())
        .nest("/newsletter", newsletter::get_admin_router())
        .nest("/dashboard", dashboard::get_admin_router())
}

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .route("/", get(health_check))
        .nest("/auth", auth::get_router())
        .nest("/users", user::get_router())
        .nest("/addresses", address::get_router())
        .nest(
            "/products",
            product::get_router()
                .merge(review::get_router())
                .merge(back_in_stock::get_router()),
        )
        .nest("/cart", cart::get_router())
        .nest("/wishlist", wishlist::get_router())
        .nest("/discounts", discount::get_router())
        .nest("/offers", offer::get_router())
        .nest("/newsletter", newsletter::get_router())
        .nest("/orders", order::get_router())
        .nest("/webhooks", payment::get_router())
        .nest("/admin", get_admin_router())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::test_support;
    use axum::{body::Body, http::Request, Extension};
    use tower::ServiceExt;

    fn app() -> Router {
        let ctx = test_support::context();
        get_router().with_state(ctx.clone()).layer(Extension(ctx))
    }

    #[tokio::test]
    async fn health_check_responds() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn admin_routes_require_a_session() {
        for path in ["/admin/orders", "/admin/dashboard", "/admin/users"] {
            let response = app()
                .oneshot(Request::get(path).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
        }
    }
}
