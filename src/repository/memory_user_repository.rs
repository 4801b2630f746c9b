use crate::entity::user::User;
use crate::error::db_error::DbError;
use crate::repository::user_repository::UserRepositoryTrait;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory credential store backed by `DashMap`, keyed by user id with a
/// unique email index. Used by tests and `STORAGE_BACKEND=memory`.
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<DashMap<Uuid, User>>,
    emails: Arc<DashMap<String, Uuid>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Applies `change` to the stored record, bypassing the soft-delete filter.
    pub fn update_user(&self, id: Uuid, change: impl FnOnce(&mut User)) -> bool {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                change(user.value_mut());
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let Some(id) = self.emails.get(email).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.find(id).await
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self
            .users
            .get(&id)
            .filter(|user| !user.is_deleted)
            .map(|user| user.value().clone()))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DbError> {
        Ok(self.emails.contains_key(email))
    }

    async fn insert(&self, user: &User) -> Result<(), DbError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DbError::Conflict(format!(
                "email {} is already registered",
                user.email
            ))),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(())
            }
        }
    }

    async fn set_refresh_token_hash(
        &self,
        user_id: Uuid,
        refresh_token_hash: Option<&str>,
    ) -> Result<(), DbError> {
        // Matches the SQL UPDATE: an unknown id is not an error
        self.update_user(user_id, |user| {
            user.refresh_token_hash = refresh_token_hash.map(str::to_string);
        });
        Ok(())
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::user::UserRole;

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            email: email.to_string(),
            password: "hash".to_string(),
            full_name: "A B".to_string(),
            phone: "123".to_string(),
            role: UserRole::Owner,
            is_active: true,
            is_deleted: false,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryUserRepository::new();
        let user = user("a@b.com");
        repo.insert(&user).await.unwrap();

        let by_email = repo.find_by_email("a@b.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert!(repo.find(user.id).await.unwrap().is_some());
        assert!(repo.email_exists("a@b.com").await.unwrap());
        assert!(!repo.email_exists("c@d.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let repo = InMemoryUserRepository::new();
        repo.insert(&user("a@b.com")).await.unwrap();

        let result = repo.insert(&user("a@b.com")).await;
        assert!(matches!(result, Err(DbError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_soft_deleted_user_is_hidden_but_email_reserved() {
        let repo = InMemoryUserRepository::new();
        let user = user("a@b.com");
        repo.insert(&user).await.unwrap();

        assert!(repo.update_user(user.id, |u| u.is_deleted = true));

        assert!(repo.find(user.id).await.unwrap().is_none());
        assert!(repo.find_by_email("a@b.com").await.unwrap().is_none());
        assert!(repo.email_exists("a@b.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_token_hash_set_and_cleared() {
        let repo = InMemoryUserRepository::new();
        let user = user("a@b.com");
        repo.insert(&user).await.unwrap();

        repo.set_refresh_token_hash(user.id, Some("abc")).await.unwrap();
        let stored = repo.find(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_hash.as_deref(), Some("abc"));

        repo.set_refresh_token_hash(user.id, None).await.unwrap();
        let stored = repo.find(user.id).await.unwrap().unwrap();
        assert!(stored.refresh_token_hash.is_none());
    }
}
