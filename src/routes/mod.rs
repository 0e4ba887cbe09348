pub mod articles;
pub mod auth;
pub mod podcasts;
pub mod users;

use crate::state::AppState;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;

/// 组装所有业务路由并注入状态
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .nest("/articles", articles::router())
        .nest("/podcasts", podcasts::router())
        .nest("/users", users::router())
        .nest("/auth", auth::router())
        .layer(Extension(app_state.auth_service.clone()))
        .with_state(app_state)
}

async fn health_check() -> &'static str {
    "Newscast is running!"
}
