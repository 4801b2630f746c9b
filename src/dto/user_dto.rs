use crate::dto::token_dto::TokenPairDto;
use crate::entity::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Surrounding whitespace is dropped before any rule sees the value.
fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(|value| value.trim().to_string())
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserLoginDto {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Email format is invalid"))]
    #[validate(length(max = 254, message = "Email must not exceed 254 characters"))]
    pub email: String,
    // Only presence is checked here; a short password must fail as bad credentials
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserRegisterDto {
    #[serde(deserialize_with = "trimmed")]
    #[validate(email(message = "Email format is invalid"))]
    #[validate(length(max = 254, message = "Email must not exceed 254 characters"))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password must be between 8 and 128 characters"
    ))]
    pub password: String,
    #[validate(length(min = 1, message = "Password confirmation is required"))]
    pub confirm_password: String,
    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1 and 100 characters"
    ))]
    pub full_name: String,
    #[validate(length(
        min = 1,
        max = 20,
        message = "Phone must be between 1 and 20 characters"
    ))]
    pub phone: String,
}

impl UserRegisterDto {
    /// Cross-field check run after the derived field rules.
    pub fn ensure_passwords_match(&self) -> Result<(), ValidationErrors> {
        if self.password == self.confirm_password {
            return Ok(());
        }

        let mut errors = ValidationErrors::new();
        errors.add(
            "confirm_password",
            ValidationError::new("must_match")
                .with_message(Cow::Borrowed("Password confirmation does not match")),
        );
        Err(errors)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReadDto {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserReadDto {
    fn from(model: User) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            phone: model.phone,
            role: model.role.as_str().to_string(),
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Body returned by register and login.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AuthResponseDto {
    pub user: UserReadDto,
    pub tokens: TokenPairDto,
}

impl std::fmt::Debug for UserLoginDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("email", &self.email)
            .finish()
    }
}

impl std::fmt::Debug for UserRegisterDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegister")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("phone", &self.phone)
            .finish()
    }
}
