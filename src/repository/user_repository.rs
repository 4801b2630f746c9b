use crate::config::database::{Database, DatabaseTrait};
use crate::config::logging::secure_log;
use crate::entity::user::User;
use crate::error::db_error::DbError;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, password, full_name, phone, role, is_active, is_deleted, refresh_token_hash, created_at, updated_at";

/// Credential store. Lookups never return soft-deleted users.
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
    async fn find(&self, id: Uuid) -> Result<Option<User>, DbError>;
    /// Includes soft-deleted rows: their emails stay reserved.
    async fn email_exists(&self, email: &str) -> Result<bool, DbError>;
    async fn insert(&self, user: &User) -> Result<(), DbError>;
    /// Overwrites the stored hash; `None` ends the session.
    async fn set_refresh_token_hash(
        &self,
        user_id: Uuid,
        refresh_token_hash: Option<&str>,
    ) -> Result<(), DbError>;
    async fn ping(&self) -> Result<(), DbError>;
}

#[derive(Clone)]
pub struct UserRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl UserRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let start = std::time::Instant::now();

        let query = format!(
            "SELECT {} FROM users WHERE email = $1 AND is_deleted = FALSE",
            USER_COLUMNS
        );
        match sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(self.db_conn.get_pool())
            .await
        {
            Ok(user) => {
                secure_log::sensitive_debug!("User lookup by email completed in {:?}", start.elapsed());
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by email failed", e);
                Err(DbError::from_sqlx(e))
            }
        }
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let start = std::time::Instant::now();

        let query = format!(
            "SELECT {} FROM users WHERE id = $1 AND is_deleted = FALSE",
            USER_COLUMNS
        );
        match sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await
        {
            Ok(user) => {
                secure_log::sensitive_debug!("User lookup by ID completed in {:?}", start.elapsed());
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by ID failed", e);
                Err(DbError::from_sqlx(e))
            }
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool, DbError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(self.db_conn.get_pool())
            .await
            .map_err(|e| {
                secure_log::secure_error!("Email existence check failed", e);
                DbError::from_sqlx(e)
            })
    }

    async fn insert(&self, user: &User) -> Result<(), DbError> {
        let start = std::time::Instant::now();

        let result = sqlx::query(
            r#"
        INSERT INTO users (id, email, password, full_name, phone, role, is_active, is_deleted, refresh_token_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.full_name)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.is_deleted)
        .bind(user.refresh_token_hash.as_deref())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(self.db_conn.get_pool())
        .await;

        match result {
            Ok(_) => {
                secure_log::sensitive_debug!("User inserted in {:?}", start.elapsed());
                Ok(())
            }
            Err(e) => {
                secure_log::secure_error!("Failed to insert user", e);
                Err(DbError::from_sqlx(e))
            }
        }
    }

    async fn set_refresh_token_hash(
        &self,
        user_id: Uuid,
        refresh_token_hash: Option<&str>,
    ) -> Result<(), DbError> {
        let start = std::time::Instant::now();

        match sqlx::query(
            "UPDATE users SET refresh_token_hash = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(refresh_token_hash)
        .bind(user_id)
        .execute(self.db_conn.get_pool())
        .await
        {
            Ok(_) => {
                secure_log::sensitive_debug!("Refresh token hash updated for user in {:?}", start.elapsed());
                Ok(())
            }
            Err(e) => {
                secure_log::secure_error!("Failed to update refresh token hash for user", e);
                Err(DbError::from_sqlx(e))
            }
        }
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(self.db_conn.get_pool())
            .await
            .map(|_| ())
            .map_err(DbError::from_sqlx)
    }
}
