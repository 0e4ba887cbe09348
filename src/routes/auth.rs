use crate::{
    error::Result,
    models::{
        auth::{
            ForgotPasswordRequest, RefreshRequest, ResetPasswordRequest, SignInRequest, SignUpRequest,
            TokenPair,
        },
        response::MessageResponse,
        user::ProfileResponse,
    },
    services::auth::AuthUser,
    state::AppState,
    utils::extract::ApiJson,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(sign_up))
        .route("/signin", post(sign_in))
        .route("/refresh", post(refresh))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
        // 需要认证的路由
        .route("/logout", post(logout))
}

/// 注册
/// POST /auth/signup
pub async fn sign_up(
    State(app_state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SignUpRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>)> {
    let profile = app_state.auth_service.sign_up(request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// 登录
/// POST /auth/signin
pub async fn sign_in(
    State(app_state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<SignInRequest>,
) -> Result<Json<TokenPair>> {
    let tokens = app_state.auth_service.sign_in(request).await?;
    Ok(Json(tokens))
}

/// 刷新令牌
/// POST /auth/refresh
pub async fn refresh(
    State(app_state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let tokens = app_state.auth_service.refresh(request).await?;
    Ok(Json(tokens))
}

/// 登出，删除保存的刷新令牌
/// POST /auth/logout
pub async fn logout(
    State(app_state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<MessageResponse>> {
    debug!("Logging out user: {}", user.id);
    app_state.auth_service.logout(user.id).await?;
    Ok(Json(MessageResponse::success("Logged out")))
}

/// POST /auth/forgot-password
pub async fn forgot_password(
    State(app_state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    app_state.auth_service.forgot_password(request).await?;
    Ok(Json(MessageResponse::success("Verification code sent")))
}

/// POST /auth/reset-password
pub async fn reset_password(
    State(app_state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    app_state.auth_service.reset_password(request).await?;
    Ok(Json(MessageResponse::success("Password updated")))
}

#[cfg(test)]
mod tests {
    use crate::routes::{
        create_router,
        test_support::{post_json, post_json_with_token},
    };
    use crate::state::test_support::TestStateBuilder;
    use axum::http::StatusCode;
    use serde_json::json;

    fn signup_body() -> serde_json::Value {
        json!({"username": "reader", "email": "reader@example.com", "password": "correct horse 42"})
    }

    #[tokio::test]
    async fn test_signup_conflict() {
        let state = TestStateBuilder::default().build();
        let (status, body) = post_json(create_router(state.clone()), "/auth/signup", signup_body()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["username"], "reader");

        let (status, body) = post_json(create_router(state), "/auth/signup", signup_body()).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_signup_validation_details() {
        let app = create_router(TestStateBuilder::default().build());
        let (status, body) = post_json(
            app,
            "/auth/signup",
            json!({"username": "r", "email": "not-an-email", "password": "short"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["details"]["email"].is_array());
    }

    #[tokio::test]
    async fn test_signin_missing_field_uses_error_body() {
        let app = create_router(TestStateBuilder::default().build());
        let (status, body) = post_json(app, "/auth/signin", json!({"email": "reader@example.com"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "BAD_REQUEST");
        assert!(body["error"]["message"].as_str().unwrap().contains("password"));
    }

    #[tokio::test]
    async fn test_signin_refresh_logout_flow() {
        let state = TestStateBuilder::default().build();
        post_json(create_router(state.clone()), "/auth/signup", signup_body()).await;

        let (status, tokens) = post_json(
            create_router(state.clone()),
            "/auth/signin",
            json!({"email": "reader@example.com", "password": "correct horse 42"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tokens["token_type"], "Bearer");
        let access = tokens["access_token"].as_str().unwrap().to_string();
        let refresh = tokens["refresh_token"].as_str().unwrap().to_string();

        let claims = state.auth_service.verify_jwt(&access).unwrap();
        let (status, _) = post_json(
            create_router(state.clone()),
            "/auth/refresh",
            json!({"user_id": claims.sub, "refresh_token": refresh}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = post_json_with_token(create_router(state.clone()), "/auth/logout", &access).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = post_json(
            create_router(state),
            "/auth/refresh",
            json!({"user_id": claims.sub, "refresh_token": "anything"}),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_signin_with_bad_password() {
        let state = TestStateBuilder::default().build();
        post_json(create_router(state.clone()), "/auth/signup", signup_body()).await;
        let (status, _) = post_json(
            create_router(state),
            "/auth/signin",
            json!({"email": "reader@example.com", "password": "wrong password 9"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_forgot_password_sends_mail() {
        let mut builder = TestStateBuilder::default();
        builder.mailer.expect_send().times(1).returning(|_, _, _| Ok(()));
        let state = builder.build();

        post_json(create_router(state.clone()), "/auth/signup", signup_body()).await;
        let (status, body) = post_json(
            create_router(state),
            "/auth/forgot-password",
            json!({"email": "reader@example.com"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
}
