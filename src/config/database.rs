use crate::config::parameter;
use async_trait::async_trait;
use sqlx::{Error, Pool, Postgres, pool::PoolOptions};
use tracing::info;

pub struct Database {
    pool: Pool<Postgres>,
}

#[async_trait]
pub trait DatabaseTrait {
    async fn init() -> Result<Self, Error>
    where
        Self: Sized;
    fn get_pool(&self) -> &Pool<Postgres>;
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn init() -> Result<Self, Error> {
        let database_url = parameter::get_optional("DATABASE_URL").ok_or_else(|| {
            Error::Configuration("DATABASE_URL must be set when STORAGE_BACKEND=postgres".into())
        })?;

        let max_connections = parameter::get_u32("DB_MAX_CONNECTIONS");
        let min_connections = parameter::get_u32("DB_MIN_CONNECTIONS");
        let acquire_timeout_seconds = parameter::get_u64("DB_ACQUIRE_TIMEOUT_SECONDS");

        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(std::time::Duration::from_secs(acquire_timeout_seconds))
            .connect(&database_url)
            .await?;

        // Pool sizing is only worth logging outside production
        let is_development = cfg!(debug_assertions)
            || parameter::get_optional("ENV")
                .map(|env| env == "development")
                .unwrap_or(false);
        if is_development {
            info!(
                "Database pool configured: max={}, min={}, acquire_timeout={}s",
                max_connections, min_connections, acquire_timeout_seconds
            );
        } else {
            info!("Database pool configured successfully");
        }

        run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    fn get_pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

/// Applies the bundled schema. Every statement is idempotent.
async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), Error> {
    info!("Running database migrations...");
    sqlx::raw_sql(include_str!("../../migrations/001_create_users.sql"))
        .execute(pool)
        .await?;
    info!("Database migrations applied");
    Ok(())
}
