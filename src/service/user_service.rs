use crate::config::logging::secure_log;
use crate::dto::user_dto::UserRegisterDto;
use crate::entity::user::{User, UserRole, normalize_email};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::user_error::UserError;
use crate::repository::user_repository::UserRepositoryTrait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

const DUMMY_PASSWORD: &str = "roomkeep-unknown-account";

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    bcrypt_cost: u32,
    /// Hash at `bcrypt_cost` checked against when the account does not exist
    dummy_hash: Arc<OnceCell<String>>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, bcrypt_cost: u32) -> Self {
        Self {
            user_repo,
            bcrypt_cost,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// Stores a new active owner account. The payload must already have
    /// passed schema validation.
    pub async fn create_user(&self, payload: UserRegisterDto) -> Result<User, ApiError> {
        self.validate_password_strength(&payload.password)?;

        let email = normalize_email(&payload.email);
        if self.user_repo.email_exists(&email).await? {
            return Err(UserError::UserAlreadyExists)?;
        }

        let hashed_password = self.hash_password(payload.password).await?;
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            email,
            password: hashed_password,
            full_name: payload.full_name.trim().to_string(),
            phone: payload.phone.trim().to_string(),
            role: UserRole::Owner,
            is_active: true,
            is_deleted: false,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };

        match self.user_repo.insert(&user).await {
            Ok(()) => {
                tracing::info!("SECURITY: User account created with ID: {}", user.id);
                Ok(user)
            }
            // Lost a race with a concurrent registration for the same email
            Err(DbError::Conflict(_)) => Err(UserError::UserAlreadyExists)?,
            Err(e) => {
                secure_log::secure_error!("Failed to create user", e);
                Err(ApiError::Db(DbError::SomethingWentWrong("User creation failed".to_string())))
            }
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let bcrypt_cost = self.bcrypt_cost;

        let result = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt_cost))
            .await
            .map_err(|e| {
                secure_log::secure_error!("Password hashing task failed", e);
                ApiError::Db(DbError::SomethingWentWrong("Password hashing failed".to_string()))
            })?;

        result.map_err(|e| {
            secure_log::secure_error!("Failed to hash password", e);
            secure_log::sensitive_debug!("Password hashing cost: {}", bcrypt_cost);
            ApiError::Db(DbError::SomethingWentWrong("Password hashing failed".to_string()))
        })
    }

    /// bcrypt comparison off the async workers. System errors count as a
    /// mismatch so the caller's response stays the same.
    pub async fn verify_password(&self, user: &User, password: &str) -> bool {
        match bcrypt_verify(password, user.password.clone()).await {
            Ok(Ok(is_valid)) => {
                if is_valid {
                    tracing::info!("SECURITY: Successful authentication for user ID: {}", user.id);
                } else {
                    tracing::warn!("SECURITY: Invalid password attempt for user ID: {}", user.id);
                }
                is_valid
            }
            Ok(Err(e)) => {
                secure_log::secure_error!("SECURITY: Password verification system error", e);
                false
            }
            Err(e) => {
                secure_log::secure_error!("SECURITY: Password verification task failed", e);
                false
            }
        }
    }

    /// Spends one bcrypt verification at the configured cost, so a login for
    /// an unknown email takes as long as one with a wrong password.
    pub async fn verify_unknown_account(&self, password: &str) {
        let hash = match self
            .dummy_hash
            .get_or_try_init(|| self.hash_password(DUMMY_PASSWORD.to_string()))
            .await
        {
            Ok(hash) => hash.clone(),
            Err(_) => return,
        };

        if let Err(e) = bcrypt_verify(password, hash).await {
            secure_log::secure_error!("SECURITY: Password verification task failed", e);
        }
    }

    #[cfg(test)]
    pub(crate) fn dummy_hash(&self) -> Option<&String> {
        self.dummy_hash.get()
    }

    /// Validate password strength according to security policies
    fn validate_password_strength(&self, password: &str) -> Result<(), ApiError> {
        let mut issues = Vec::new();

        if password.chars().count() < 8 {
            issues.push("at least 8 characters");
        }

        if password.chars().count() > 128 {
            issues.push("no more than 128 characters");
        }

        if !password.chars().any(|c| c.is_uppercase()) {
            issues.push("at least one uppercase letter (A-Z)");
        }

        if !password.chars().any(|c| c.is_lowercase()) {
            issues.push("at least one lowercase letter (a-z)");
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            issues.push("at least one number (0-9)");
        }

        if !issues.is_empty() {
            let details = format!("Password must contain: {}", issues.join(", "));
            return Err(ApiError::User(UserError::InvalidPasswordWithDetails { details }));
        }

        Ok(())
    }
}

async fn bcrypt_verify(
    password: &str,
    hash: String,
) -> Result<Result<bool, bcrypt::BcryptError>, tokio::task::JoinError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::memory_user_repository::InMemoryUserRepository;

    fn service() -> UserService {
        UserService::new(InMemoryUserRepository::new_shared(), 4)
    }

    fn payload(email: &str, password: &str) -> UserRegisterDto {
        UserRegisterDto {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            full_name: " A B ".to_string(),
            phone: "123".to_string(),
        }
    }

    #[test]
    fn test_password_strength() {
        let service = service();

        assert!(service.validate_password_strength("Abcdef12").is_ok());
        assert!(service.validate_password_strength("abcdef12").is_err());
        assert!(service.validate_password_strength("ABCDEF12").is_err());
        assert!(service.validate_password_strength("Abcdefgh").is_err());
        assert!(service.validate_password_strength("Ab1").is_err());
    }

    #[tokio::test]
    async fn test_create_user_normalizes_and_hashes() {
        let service = service();

        let user = service.create_user(payload(" A@B.com ", "Abcdef12")).await.unwrap();
        assert_eq!(user.email, "a@b.com");
        assert_eq!(user.full_name, "A B");
        assert_eq!(user.role, UserRole::Owner);
        assert!(user.is_active);
        assert!(!user.is_deleted);
        assert_ne!(user.password, "Abcdef12");

        assert!(service.verify_password(&user, "Abcdef12").await);
        assert!(!service.verify_password(&user, "wrong").await);
    }

    #[tokio::test]
    async fn test_create_user_rejects_taken_email() {
        let service = service();
        service.create_user(payload("a@b.com", "Abcdef12")).await.unwrap();

        let result = service.create_user(payload("A@b.COM", "Abcdef12")).await;
        assert!(matches!(result, Err(ApiError::User(UserError::UserAlreadyExists))));
    }

    #[tokio::test]
    async fn test_unknown_account_check_uses_configured_cost() {
        let service = service();
        assert!(service.dummy_hash().is_none());

        service.verify_unknown_account("Abcdef12").await;
        let first = service.dummy_hash().cloned().unwrap();
        assert!(first.starts_with("$2b$04$"));

        service.verify_unknown_account("other").await;
        assert_eq!(service.dummy_hash(), Some(&first));
    }

    #[tokio::test]
    async fn test_verify_password_with_corrupt_hash_is_false() {
        let service = service();
        let mut user = service.create_user(payload("a@b.com", "Abcdef12")).await.unwrap();
        user.password = "not-a-bcrypt-hash".to_string();

        assert!(!service.verify_password(&user, "Abcdef12").await);
    }
}
