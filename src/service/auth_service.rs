use crate::config::logging::secure_log;
use crate::dto::token_dto::TokenPairDto;
use crate::dto::user_dto::{AuthResponseDto, UserReadDto, UserRegisterDto};
use crate::entity::user::{User, normalize_email};
use crate::error::api_error::ApiError;
use crate::error::request_error::RequestError;
use crate::error::token_error::TokenError;
use crate::error::user_error::UserError;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::refresh_token_service::RefreshTokenService;
use crate::service::token_service::{TokenService, TokenServiceTrait};
use crate::service::user_service::UserService;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Session lifecycle per user: `NoSession -> Active` on login or register,
/// a new epoch on every refresh, back to `NoSession` on logout. One refresh
/// token slot per user, so a new login replaces any other device's session.
#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    user_service: UserService,
    token_service: TokenService,
    refresh_token_service: RefreshTokenService,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        user_service: UserService,
        token_service: TokenService,
    ) -> Self {
        Self {
            user_repo,
            user_service,
            token_service,
            refresh_token_service: RefreshTokenService::new(),
        }
    }

    pub async fn register(&self, payload: UserRegisterDto) -> Result<AuthResponseDto, ApiError> {
        payload
            .ensure_passwords_match()
            .map_err(RequestError::ValidationError)?;

        let user = self.user_service.create_user(payload).await?;
        let tokens = self.open_session(&user).await?;

        Ok(AuthResponseDto {
            user: UserReadDto::from(user),
            tokens,
        })
    }

    /// Every failure is the same `InvalidCredentials` so callers cannot tell
    /// an unknown email from a wrong password or a disabled account.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponseDto, ApiError> {
        let email = normalize_email(email);

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            warn!("SECURITY: Login failed - unknown account");
            secure_log::sensitive_debug!("Login failed for unknown email: {}", email);
            self.user_service.verify_unknown_account(password).await;
            return Err(UserError::InvalidCredentials)?;
        };

        if !self.user_service.verify_password(&user, password).await {
            return Err(UserError::InvalidCredentials)?;
        }

        if !user.can_authenticate() {
            warn!("SECURITY: Login refused for inactive user ID: {}", user.id);
            return Err(UserError::InvalidCredentials)?;
        }

        let tokens = self.open_session(&user).await?;
        info!("SECURITY: Login successful for user ID: {}", user.id);

        Ok(AuthResponseDto {
            user: UserReadDto::from(user),
            tokens,
        })
    }

    /// Verifies the refresh JWT to recover its subject, then rotates.
    pub async fn refresh_with_token(&self, presented: &str) -> Result<TokenPairDto, ApiError> {
        let claims = self.token_service.retrieve_refresh_claims(presented)?;
        self.refresh(claims.sub, presented).await
    }

    /// Accepts `presented` only if it is the most recently issued refresh
    /// token for `user_id`, then replaces it with a fresh pair.
    pub async fn refresh(&self, user_id: Uuid, presented: &str) -> Result<TokenPairDto, ApiError> {
        let user = self
            .user_repo
            .find(user_id)
            .await?
            .filter(User::can_authenticate)
            .ok_or_else(|| {
                warn!("SECURITY: Refresh refused for missing or inactive user ID: {}", user_id);
                TokenError::InvalidRefreshToken
            })?;

        if !self
            .refresh_token_service
            .matches_stored_hash(presented, user.refresh_token_hash.as_deref())
        {
            warn!("SECURITY: Stale or revoked refresh token for user ID: {}", user_id);
            return Err(TokenError::InvalidRefreshToken)?;
        }

        let tokens = self.open_session(&user).await?;
        info!("SECURITY: Refresh token rotated for user ID: {}", user_id);
        Ok(tokens)
    }

    /// Clears the stored refresh token. Idempotent.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.user_repo.set_refresh_token_hash(user_id, None).await?;
        info!("SECURITY: Session closed for user ID: {}", user_id);
        Ok(())
    }

    /// Issues a pair and makes its refresh token the only valid one.
    async fn open_session(&self, user: &User) -> Result<TokenPairDto, ApiError> {
        let tokens = self.token_service.issue_token_pair(user.id, &user.email)?;
        let refresh_token_hash = self
            .refresh_token_service
            .hash_refresh_token(&tokens.refresh_token);

        self.user_repo
            .set_refresh_token_hash(user.id, Some(&refresh_token_hash))
            .await?;

        Ok(tokens)
    }
}
