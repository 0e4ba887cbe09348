use crate::{
    config::Config,
    error::{AppError, Result},
    models::{
        auth::{
            Claims, ForgotPasswordRequest, RefreshRequest, ResetPasswordRequest, SignInRequest,
            SignUpRequest, TokenPair,
        },
        user::{NewUser, OneTimePasscode, ProfileResponse, User},
    },
    repositories::{RefreshTokenStore, UserRepository},
    services::mail::{otp_email, Mailer},
    utils::validation::{normalize_email, validate_password_strength, validate_username},
};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    headers::{authorization::Bearer, Authorization},
    http::request::Parts,
    Extension, RequestPartsExt, TypedHeader,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm as JwtAlgorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, Rng, RngCore};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

const REFRESH_TOKEN_LENGTH: usize = 64;
const DUMMY_PASSWORD: &str = "newscast-unknown-account";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn RefreshTokenStore>,
    mailer: Arc<dyn Mailer>,
    jwt_secret: String,
    jwt_expiry_minutes: i64,
    password_hash_cost: u32,
    otp_ttl_minutes: i64,
    /// 未知邮箱登录时用来比对的哈希，与真实账号耗时一致
    dummy_hash: Arc<OnceCell<String>>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn RefreshTokenStore>,
        mailer: Arc<dyn Mailer>,
        config: &Config,
    ) -> Self {
        Self {
            users,
            tokens,
            mailer,
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiry_minutes: config.jwt_expiry_minutes,
            password_hash_cost: config.password_hash_cost,
            otp_ttl_minutes: config.otp_ttl_minutes,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            Params::DEFAULT_M_COST,
            self.password_hash_cost.max(1),
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// 生成带盐的 PHC 格式哈希，在阻塞线程池中计算
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let hasher = self.hasher()?;
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || -> Result<String> {
            let mut salt_bytes = [0u8; 16];
            rand::thread_rng().fill_bytes(&mut salt_bytes);
            let salt = SaltString::encode_b64(&salt_bytes)?;
            let hash = hasher.hash_password(password.as_bytes(), &salt)?;
            Ok(hash.to_string())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// 参数取自哈希本身
    pub async fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();

        tokio::task::spawn_blocking(move || -> Result<bool> {
            let parsed = PasswordHash::new(&hash)?;
            Ok(Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok())
        })
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))?
    }

    async fn dummy_hash(&self) -> Result<&str> {
        let hash = self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD))
            .await?;
        Ok(hash.as_str())
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            exp: (now + Duration::minutes(self.jwt_expiry_minutes)).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::new(JwtAlgorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(JwtAlgorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    fn generate_refresh_token() -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(REFRESH_TOKEN_LENGTH)
            .map(char::from)
            .collect()
    }

    /// `None` 删除已保存的刷新令牌
    pub async fn update_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
        self.tokens.set(user_id, token).await
    }

    async fn issue_token_pair(&self, user: &User) -> Result<TokenPair> {
        let access_token = self.issue_access_token(user)?;
        let refresh_token = Self::generate_refresh_token();
        self.update_refresh_token(user.id, Some(&refresh_token)).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_expiry_minutes * 60,
        })
    }

    pub async fn sign_up(&self, request: SignUpRequest) -> Result<ProfileResponse> {
        request.validate()?;
        validate_username(&request.username)?;
        validate_password_strength(&request.password)?;

        let email = normalize_email(&request.email);
        debug!("Signing up user: {}", email);

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already registered"));
        }
        if self.users.find_by_username(&request.username).await?.is_some() {
            return Err(AppError::conflict("Username already taken"));
        }

        let password_hash = self.hash_password(&request.password).await?;
        let user = self
            .users
            .create(NewUser {
                username: request.username,
                email,
                password_hash,
            })
            .await?;

        info!("User registered: {}", user.id);
        Ok(user.to_profile())
    }

    pub async fn sign_in(&self, request: SignInRequest) -> Result<TokenPair> {
        request.validate()?;
        let email = normalize_email(&request.email);
        debug!("Signing in user: {}", email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            // 未知邮箱同样完成一次哈希比对
            let dummy_hash = self.dummy_hash().await?;
            self.verify_password(&request.password, dummy_hash).await?;
            return Err(AppError::unauthorized("Invalid email or password"));
        };

        if !self.verify_password(&request.password, &user.password_hash).await? {
            warn!("Failed sign-in attempt for user: {}", user.id);
            return Err(AppError::unauthorized("Invalid email or password"));
        }

        let pair = self.issue_token_pair(&user).await?;
        info!("User signed in: {}", user.id);
        Ok(pair)
    }

    /// 校验保存的刷新令牌并轮换
    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenPair> {
        request.validate()?;
        let user_id = Uuid::parse_str(request.user_id.trim())
            .map_err(|_| AppError::bad_request("user_id must be a UUID"))?;

        let stored = self
            .tokens
            .get(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Refresh token"))?;
        if stored != request.refresh_token {
            warn!("Refresh token mismatch for user: {}", user_id);
            return Err(AppError::unauthorized("Invalid refresh token"));
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        self.issue_token_pair(&user).await
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<()> {
        self.update_refresh_token(user_id, None).await?;
        info!("User logged out: {}", user_id);
        Ok(())
    }

    /// 生成验证码、保存并发送邮件
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> Result<()> {
        request.validate()?;
        let email = normalize_email(&request.email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let otp = OneTimePasscode::generate(Duration::minutes(self.otp_ttl_minutes));
        self.users.update_otp(&user.email, &otp).await?;

        let (subject, body) = otp_email(&otp.code, self.otp_ttl_minutes);
        self.mailer.send(&user.email, &subject, &body).await?;

        info!("Password reset code issued for user: {}", user.id);
        Ok(())
    }

    pub async fn reset_password(&self, request: ResetPasswordRequest) -> Result<()> {
        request.validate()?;
        validate_password_strength(&request.new_password)?;
        let email = normalize_email(&request.email);

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let valid = user
            .otp
            .as_ref()
            .map_or(false, |otp| otp.verify(&request.otp, Utc::now()));
        if !valid {
            warn!("Invalid or expired reset code for user: {}", user.id);
            return Err(AppError::unauthorized("Invalid or expired code"));
        }

        let password_hash = self.hash_password(&request.new_password).await?;
        self.users.update_password(&user.email, &password_hash).await?;

        info!("Password reset for user: {}", user.id);
        Ok(())
    }
}

/// 通过 Bearer 令牌认证的用户
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Authentication("Missing authorization header".to_string()))?;

        let Extension(auth_service): Extension<Arc<AuthService>> = parts
            .extract::<Extension<Arc<AuthService>>>()
            .await
            .map_err(|_| AppError::Internal("Auth service not found in request extensions".to_string()))?;

        let claims = auth_service.verify_jwt(bearer.token())?;
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Authentication("Invalid token subject".to_string()))?;

        Ok(AuthUser {
            id,
            email: claims.email,
        })
    }
}
