use crate::{
    error::{AppError, Result},
    models::user::ProfileResponse,
    repositories::UserRepository,
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// 当前登录用户的资料
    pub async fn get_my_profile(&self, user_id: Uuid) -> Result<ProfileResponse> {
        debug!("Getting profile for user: {}", user_id);

        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| user.to_profile())
            .ok_or_else(|| AppError::not_found("User"))
    }
}
