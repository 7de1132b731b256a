// routes.rs
use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        commission::commission_handler,
        distribution::{distribution_admin_handler, distribution_user_handler},
        setting::setting_handler,
        withdrawal::{withdrawal_admin_handler, withdrawal_user_handler},
    },
    middleware::{auth, role_check},
    models::usermodel::UserRole,
    AppState,
};

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let admin_routes = Router::new()
        .merge(distribution_admin_handler())
        .merge(commission_handler())
        .merge(withdrawal_admin_handler())
        .merge(setting_handler())
        .layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::SuperAdmin, UserRole::Admin, UserRole::Operator])
        }))
        .layer(middleware::from_fn(auth));

    let user_routes = Router::new()
        .merge(distribution_user_handler())
        .merge(withdrawal_user_handler())
        .layer(middleware::from_fn(auth));

    let api_route = Router::new()
        .nest("/admin", admin_routes)
        .nest("/distribution", user_routes)
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
}
