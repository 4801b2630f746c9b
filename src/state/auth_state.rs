use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::auth_service::AuthService;
use crate::service::token_service::TokenService;
use crate::service::user_service::UserService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub(crate) auth_service: AuthService,
    pub(crate) user_repo: Arc<dyn UserRepositoryTrait>,
}

impl AuthState {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        token_service: TokenService,
        bcrypt_cost: u32,
    ) -> Self {
        let user_service = UserService::new(user_repo.clone(), bcrypt_cost);

        Self {
            auth_service: AuthService::new(user_repo.clone(), user_service, token_service),
            user_repo,
        }
    }
}
