use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub is_active: bool,
    pub is_deleted: bool,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may open or keep a session.
    pub fn can_authenticate(&self) -> bool {
        self.is_active && !self.is_deleted
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .field("is_deleted", &self.is_deleted)
            .field("has_session", &self.refresh_token_hash.is_some())
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Owner,
    Admin,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Owner => "owner",
            UserRole::Admin => "admin",
            UserRole::Staff => "staff",
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(UserRole::Owner),
            "admin" => Ok(UserRole::Admin),
            "staff" => Ok(UserRole::Staff),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Canonical form used for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  A@B.Com "), "a@b.com");
        assert_eq!(normalize_email("owner@example.com"), "owner@example.com");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&UserRole::Admin).unwrap(), "\"admin\"");
        assert_eq!(serde_json::from_str::<UserRole>("\"owner\"").unwrap(), UserRole::Owner);
    }

    #[test]
    fn test_role_round_trips_through_str() {
        for role in [UserRole::Owner, UserRole::Admin, UserRole::Staff] {
            assert_eq!(role.as_str().parse::<UserRole>(), Ok(role));
        }
        assert!("tenant".parse::<UserRole>().is_err());
        assert_eq!(UserRole::try_from("staff".to_string()), Ok(UserRole::Staff));
    }
}
