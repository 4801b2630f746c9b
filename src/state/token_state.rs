use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::token_service::TokenService;
use std::sync::Arc;

/// State for the bearer-token guard.
#[derive(Clone)]
pub struct TokenState {
    pub token_service: TokenService,
    pub user_repo: Arc<dyn UserRepositoryTrait>,
}

impl TokenState {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, token_service: TokenService) -> Self {
        Self {
            token_service,
            user_repo,
        }
    }
}
