use crate::{
    error::Result,
    models::user::ProfileResponse,
    services::auth::AuthUser,
    state::AppState,
};
use axum::{extract::State, response::Json, routing::get, Router};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // 需要认证的路由
        .route("/user", get(get_my_profile))
}

/// 获取当前用户资料
/// GET /users/user
pub async fn get_my_profile(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>> {
    debug!("Getting current user profile: {}", user.id);
    let profile = app_state.user_service.get_my_profile(user.id).await?;
    Ok(Json(profile))
}
